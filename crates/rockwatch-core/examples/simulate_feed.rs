//! Example: Monitoring a Simulated Feed
//!
//! This example opens a monitoring session on a simulated sensor and prints
//! each assessment as it arrives, followed by the final dashboard summary.
//!
//! Run with: `cargo run --example simulate_feed -- [stable|escalating|volatile]`

use std::env;
use std::time::Duration;

use rockwatch_core::{
    MonitoringSession, Scenario, SessionEvent, SessionOptions, SimulatedSensor, StreamChannel,
};

const READINGS: usize = 30;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let scenario: Scenario = match env::args().nth(1) {
        Some(name) => name.parse()?,
        None => Scenario::Escalating,
    };

    println!("Simulating {} feed ({} readings)...", scenario, READINGS);

    let feed = SimulatedSensor::new(scenario).into_stream(Duration::from_millis(200));
    let session = MonitoringSession::open(StreamChannel::new(feed), SessionOptions::default())?;
    let mut events = session.subscribe();

    let mut seen = 0;
    while seen < READINGS {
        match events.recv().await? {
            SessionEvent::Assessed {
                reading,
                assessment,
                ..
            } => {
                seen += 1;
                println!(
                    "  CO2 {:>7.1} ppm  {:>5.1} °C  {:>5.1} %  -> {:<8} (score {})",
                    reading.co2,
                    reading.temperature,
                    reading.humidity,
                    assessment.level,
                    assessment.score
                );
            }
            SessionEvent::StateChanged { state } => println!("  [{}]", state),
            _ => {}
        }
    }

    let snapshot = session.snapshot();
    println!();
    println!("Summary:");
    println!("  History:     {} records", snapshot.history.len());
    println!("  Predictions: {} records", snapshot.predictions.len());
    println!(
        "  Levels:      {} low, {} medium, {} high, {} critical",
        snapshot.distribution.low,
        snapshot.distribution.medium,
        snapshot.distribution.high,
        snapshot.distribution.critical
    );
    if let Some(co2) = snapshot.stats.co2 {
        println!(
            "  CO2:         {:.1} - {:.1} ppm (mean {:.1})",
            co2.min, co2.max, co2.mean
        );
    }

    session.close();
    Ok(())
}
