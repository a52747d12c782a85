//! Submit a road trip planning request to the trip server and print the plan.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use trip_cli::{render_plan, PlannerClient};
use trip_core::{PlanRequest, Preferences};

/// Plan a road trip with weather, alerts and a departure recommendation
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Trip server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Starting place, e.g. "Rapid City, SD"
    origin: String,

    /// Final destination, e.g. "Miami, FL"
    destination: String,

    /// Intermediate stop (repeatable)
    #[arg(long = "via")]
    waypoints: Vec<String>,

    /// Departure date (YYYY-MM-DD or RFC3339), defaults to now
    #[arg(long)]
    depart: Option<String>,

    /// User whose stored preferences should be used
    #[arg(long)]
    user: Option<String>,

    /// Driving hours per day (overrides stored preferences)
    #[arg(long)]
    hours_per_day: Option<u32>,

    /// Preferred departure time, HH:MM
    #[arg(long)]
    leave_at: Option<String>,

    /// Plan a return leg as well
    #[arg(long)]
    round_trip: bool,

    /// Client-assigned route id
    #[arg(long)]
    route_id: Option<String>,

    /// Print the raw JSON response instead of the summary
    #[arg(long)]
    json: bool,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

fn parse_departure(raw: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    let Some(raw) = raw else {
        return Ok(Utc::now());
    };
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid departure date '{}'", raw))?;
    date.and_hms_opt(8, 0, 0)
        .map(|naive| naive.and_utc())
        .context("Invalid departure date")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let client = PlannerClient::new(&args.url, Duration::from_secs(args.timeout))?;

    let mut preferences = match &args.user {
        Some(user) => client.preferences(user).unwrap_or_else(|err| {
            tracing::warn!("Using default preferences: {:#}", err);
            Preferences::default()
        }),
        None => Preferences::default(),
    };
    if let Some(hours) = args.hours_per_day {
        preferences.hours_per_day = hours;
    }
    if let Some(time) = &args.leave_at {
        preferences.preferred_departure_time = time.clone();
    }
    preferences.round_trip |= args.round_trip;

    let request = PlanRequest {
        route_id: args.route_id.clone(),
        user_id: args.user.clone(),
        origin: args.origin.clone(),
        destination: args.destination.clone(),
        waypoints: args.waypoints.clone(),
        departure_date: parse_departure(args.depart.as_deref())?,
        preferences,
    };
    request.validate()?;

    tracing::debug!("Requesting plan from {}", args.url);
    let plan = client.plan(&request)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", render_plan(&plan));
    }
    Ok(())
}
