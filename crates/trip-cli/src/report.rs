//! Plain-text rendering of a plan for the terminal.

use std::fmt::Write;

use trip_core::optimizer::format_duration;
use trip_core::{AlertSeverity, RiskLevel, RouteSource, ScoreLabel};

use crate::client::PlanResponse;

fn source_label(source: RouteSource) -> &'static str {
    match source {
        RouteSource::CorridorOverride => "curated corridor",
        RouteSource::Directions => "directions",
        RouteSource::CorridorTemplate => "corridor template",
        RouteSource::Interpolated => "estimated",
    }
}

fn score_label(label: ScoreLabel) -> &'static str {
    match label {
        ScoreLabel::Excellent => "excellent",
        ScoreLabel::Good => "good",
        ScoreLabel::Poor => "poor",
    }
}

fn severity_label(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Severe => "SEVERE",
        AlertSeverity::Moderate => "moderate",
        AlertSeverity::Minor => "minor",
    }
}

pub fn render_plan(plan: &PlanResponse) -> String {
    let route = &plan.route;
    let opt = &plan.optimization;
    let mut out = String::new();

    let _ = writeln!(out, "{} -> {}", route.origin, route.destination);
    if !route.waypoints.is_empty() {
        let _ = writeln!(out, "  Via: {}", route.waypoints.join(", "));
    }
    let _ = writeln!(
        out,
        "  {:.0} mi, {} ({})",
        route.distance_miles,
        opt.estimated_duration,
        source_label(route.source)
    );
    if !route.highways.is_empty() {
        let _ = writeln!(out, "  Highways: {}", route.highways.join(", "));
    }
    let _ = writeln!(
        out,
        "  Estimated costs: ${} (fuel ${}, lodging ${})",
        route.costs.total(),
        route.costs.fuel,
        route.costs.lodging
    );

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Score {} ({}), leave at {}, {} day(s) of driving",
        opt.route_score,
        score_label(opt.score_label),
        opt.optimal_departure,
        opt.travel_days
    );
    let _ = writeln!(out, "{}", opt.summary);

    if !opt.recommended_stops.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Stops:");
        for annotated in &opt.recommended_stops {
            let stop = &annotated.stop;
            let _ = writeln!(
                out,
                "  +{:<8} {} ({}) - {}",
                format_duration(stop.elapsed_minutes),
                stop.label,
                stop.category,
                annotated.weather
            );
        }
    }

    if !plan.alerts.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Alerts:");
        for alert in &plan.alerts {
            let _ = writeln!(
                out,
                "  [{}] {} - {}",
                severity_label(alert.severity),
                alert.title,
                alert.location
            );
        }
    }

    let risky: Vec<_> = plan
        .timeline
        .iter()
        .filter(|segment| segment.risk != RiskLevel::Low)
        .collect();
    if !risky.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Weather watch:");
        for segment in risky {
            let _ = writeln!(
                out,
                "  {} {}: {}, {:.0}F",
                segment.time.format("%a %b %-d"),
                segment.location,
                segment.condition,
                segment.temperature_f
            );
        }
    }

    if !opt.safety_recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Safety:");
        for rec in &opt.safety_recommendations {
            let _ = writeln!(out, "  - {}: {}", rec.title, rec.description);
        }
    }

    if !opt.tags.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Tags: {}", opt.tags.join(", "));
    }
    out
}
