//! Trip CLI - submit planning requests to a trip server and print the result.

pub mod client;
pub mod report;

pub use client::{PlanResponse, PlannerClient};
pub use report::render_plan;
