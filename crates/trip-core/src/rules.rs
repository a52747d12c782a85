//! Tuning constants for scoring, stop placement and trip classification.

use serde::{Deserialize, Serialize};

use crate::error::RulesError;

/// Accepted range for the base score and every score delta.
pub const SCORE_RULE_LIMIT: i32 = 1_000;

/// Product tuning for the optimizer. Defaults follow the shipped planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerRules {
    /// Starting route score before adjustments
    pub base_score: i32,
    /// Applied when the trip is longer than `long_trip_hours`
    pub long_trip_delta: i32,
    /// Applied when the departure month is a winter month
    pub winter_delta: i32,
    /// Applied when the traveller asked to avoid severe weather
    pub avoid_severe_weather_delta: i32,
    pub min_score: u8,
    pub max_score: u8,
    /// Trips longer than this many hours are "long"
    pub long_trip_hours: f64,
    /// Trips longer than this many hours get a rest strategy entry
    pub rest_strategy_hours: f64,
    /// Trips longer than this many miles get a fuel strategy entry
    pub fuel_strategy_miles: f64,
    /// Daily driving budget at or below which long trips start earlier
    pub low_daily_hours: u32,
    /// How far to pull the departure forward for long trips
    pub early_start_shift_hours: i64,
    /// Departures are never pulled earlier than this hour of day
    pub earliest_departure_hour: u32,
    /// Calendar months (1-12) treated as winter
    pub winter_months: Vec<u32>,
    pub mountain_highways: Vec<String>,
    pub desert_highways: Vec<String>,
    pub metro_highways: Vec<String>,
}

impl Default for PlannerRules {
    fn default() -> Self {
        Self {
            base_score: 75,
            long_trip_delta: -5,
            winter_delta: -15,
            avoid_severe_weather_delta: 10,
            min_score: 50,
            max_score: 100,
            long_trip_hours: 12.0,
            rest_strategy_hours: 8.0,
            fuel_strategy_miles: 500.0,
            low_daily_hours: 8,
            early_start_shift_hours: 2,
            earliest_departure_hour: 5,
            winter_months: vec![12, 1, 2],
            mountain_highways: to_strings(&["I-70", "I-80", "I-90", "I-25", "I-15"]),
            desert_highways: to_strings(&["I-10", "I-40", "I-15", "I-8"]),
            metro_highways: to_strings(&["I-95", "I-75", "I-35", "I-285", "I-5"]),
        }
    }
}

impl PlannerRules {
    pub fn is_winter_month(&self, month: u32) -> bool {
        self.winter_months.contains(&month)
    }

    /// Reject tuning that would make scoring meaningless.
    pub fn validate(&self) -> Result<(), RulesError> {
        let scored = [
            ("base_score", self.base_score),
            ("long_trip_delta", self.long_trip_delta),
            ("winter_delta", self.winter_delta),
            ("avoid_severe_weather_delta", self.avoid_severe_weather_delta),
        ];
        for (name, value) in scored {
            if !(-SCORE_RULE_LIMIT..=SCORE_RULE_LIMIT).contains(&value) {
                return Err(RulesError::OutOfRange {
                    name,
                    value: i64::from(value),
                    min: i64::from(-SCORE_RULE_LIMIT),
                    max: i64::from(SCORE_RULE_LIMIT),
                });
            }
        }
        if self.min_score > self.max_score {
            return Err(RulesError::InvertedScoreBounds {
                min: self.min_score,
                max: self.max_score,
            });
        }
        Ok(())
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Duration thresholds used to place synthetic stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopThresholds {
    pub rest_after_hours: f64,
    pub meal_after_hours: f64,
    pub overnight_after_hours: f64,
    /// Fraction of total duration at which the overnight stop sits
    pub overnight_fraction: f64,
}

impl Default for StopThresholds {
    fn default() -> Self {
        Self {
            rest_after_hours: 4.0,
            meal_after_hours: 8.0,
            overnight_after_hours: 12.0,
            overnight_fraction: 0.7,
        }
    }
}

/// Deterministic trip cost model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub miles_per_gallon: f64,
    pub price_per_gallon: f64,
    pub toll_rate_per_mile: f64,
    pub food_rate_per_mile: f64,
    pub lodging_flat_fee: f64,
    pub lodging_threshold_miles: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            miles_per_gallon: 25.0,
            price_per_gallon: 3.50,
            toll_rate_per_mile: 0.03,
            food_rate_per_mile: 0.05,
            lodging_flat_fee: 120.0,
            lodging_threshold_miles: 500.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(PlannerRules::default().validate(), Ok(()));
    }

    #[test]
    fn huge_base_score_is_rejected() {
        let rules = PlannerRules {
            base_score: i32::MAX,
            ..PlannerRules::default()
        };
        let err = rules.validate().unwrap_err();
        assert!(matches!(
            err,
            RulesError::OutOfRange {
                name: "base_score",
                ..
            }
        ));
        assert!(err.to_string().contains("base_score"));
    }

    #[test]
    fn inverted_score_bounds_are_rejected() {
        let rules = PlannerRules {
            min_score: 90,
            max_score: 10,
            ..PlannerRules::default()
        };
        assert_eq!(
            rules.validate(),
            Err(RulesError::InvertedScoreBounds { min: 90, max: 10 })
        );
    }
}
