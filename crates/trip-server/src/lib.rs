//! Road trip planning service: route resolution, conditions aggregation,
//! persistence and the HTTP API.

pub mod alerts;
pub mod api;
pub mod backoff;
pub mod cache;
pub mod conditions;
pub mod config;
pub mod geo;
pub mod persistence;
pub mod pipeline;
pub mod providers;
pub mod routing;
pub mod state;
pub mod weather;
