pub mod alerts;
pub mod clock;
pub mod corridors;
pub mod error;
pub mod gazetteer;
pub mod highways;
pub mod models;
pub mod optimizer;
pub mod routing;
pub mod rules;
pub mod seasonal;
pub mod spatial;
pub mod timeline;

pub use alerts::{classify, classify_severity, dedupe, synthetic_alerts, HazardKind};
pub use clock::{Clock, ManualClock, SystemClock};
pub use corridors::{Corridor, CorridorTier};
pub use error::{RulesError, ValidationError};
pub use highways::extract_highways;
pub use models::{
    Alert, AlertSeverity, AnnotatedStop, Coordinates, DataSource, ForecastDay, GeoConfidence,
    GeoResolution, HourlyForecast, OptimizationResult, PlanRequest, Preferences, RawAlert,
    RecommendedStop, ReturnRoute, RiskLevel, RoadConditions, Route, RoutePoint, RouteSource,
    SafetyRecommendation, ScoreLabel, TimelineSegment, TripCosts, WaypointWeather,
    WeatherConditions, WeatherSnapshot,
};
pub use optimizer::optimize;
pub use rules::{CostModel, PlannerRules, StopThresholds};
pub use seasonal::{Season, SeasonalGenerator, SeedSource};
pub use spatial::haversine_miles;
pub use timeline::build_timeline;
