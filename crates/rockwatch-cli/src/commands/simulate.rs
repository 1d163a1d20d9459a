//! Simulate command implementation.
//!
//! Runs a monitoring session on a [`SimulatedSensor`] feed delivered through a
//! [`StreamChannel`], printing each assessment as it arrives. Stops after the
//! requested number of readings or on Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use futures::stream;
use rockwatch_core::{MonitoringSession, Scenario, SessionOptions, SimulatedSensor, StreamChannel};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::commands::replay::FeedPrinter;
use crate::format::{FormatOptions, format_summary_json, format_summary_text};
use crate::style;
use crate::util::OutputSink;

/// Arguments for the simulate command.
pub struct SimulateArgs<'a> {
    pub scenario: Scenario,
    pub count: u64,
    pub interval: Duration,
    pub seed: Option<u64>,
    pub format: OutputFormat,
    pub options: SessionOptions,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_simulate(args: SimulateArgs<'_>, sink: &mut OutputSink) -> Result<()> {
    let SimulateArgs {
        scenario,
        count,
        interval,
        seed,
        format,
        options,
        opts,
    } = args;

    let sensor = match seed {
        Some(seed) => SimulatedSensor::with_seed(scenario, seed),
        None => SimulatedSensor::new(scenario),
    };

    // Hold the feed back until the subscriber below exists.
    let (ready_tx, ready_rx) = oneshot::channel::<()>();
    let feed = sensor.into_stream(interval);
    let gated = stream::once(async move {
        let _ = ready_rx.await;
        feed
    })
    .flatten();

    let channel = Arc::new(StreamChannel::new(gated));
    let session = MonitoringSession::open(Arc::clone(&channel), options)?;
    let mut events = session.subscribe();
    let _ = ready_tx.send(());

    info!(
        %scenario,
        interval_ms = interval.as_millis() as u64,
        count,
        "Simulated feed started"
    );
    if format == OutputFormat::Text {
        let title = format!(
            "Simulated feed: {} every {} ms",
            scenario,
            interval.as_millis()
        );
        sink.write(&format!("{}\n", style::format_title(&title, opts.no_color)))?;
    }

    let mut printer = FeedPrinter::new(format, opts);
    let mut assessed = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nShutting down...");
                break;
            }
            _ = channel.finished() => {
                info!("Simulated feed ended");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if printer.print(&event, sink)? {
                        assessed += 1;
                        if count > 0 && assessed >= count {
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("Output fell behind, {missed} events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    let snapshot = session.snapshot();
    match format {
        OutputFormat::Text => sink.write(&format_summary_text(&snapshot, opts))?,
        OutputFormat::Json => {
            sink.write(&format_summary_json(&snapshot, &opts.with_compact(true))?)?
        }
        OutputFormat::Csv => {}
    }

    session.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test(start_paused = true)]
    async fn test_simulate_stops_after_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let opts = FormatOptions::new(true, false);
        {
            let mut sink = OutputSink::open(Some(&path)).unwrap();
            cmd_simulate(
                SimulateArgs {
                    scenario: Scenario::Escalating,
                    count: 35,
                    interval: Duration::from_millis(500),
                    seed: Some(3),
                    format: OutputFormat::Json,
                    options: SessionOptions::default(),
                    opts: &opts,
                },
                &mut sink,
            )
            .await
            .unwrap();
        }

        let output = std::fs::read_to_string(&path).unwrap();
        let values: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(values.len(), 36);
        assert_eq!(values[0]["level"], "LOW");
        assert_eq!(values[34]["level"], "CRITICAL");

        let summary = &values[35];
        assert_eq!(summary["ingested"], 35);
        assert_eq!(summary["state"], "connected");
        assert_eq!(summary["history"].as_array().unwrap().len(), 20);
        assert_eq!(summary["predictions"].as_array().unwrap().len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_text_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let opts = FormatOptions::new(true, false);
        {
            let mut sink = OutputSink::open(Some(&path)).unwrap();
            cmd_simulate(
                SimulateArgs {
                    scenario: Scenario::Stable,
                    count: 3,
                    interval: Duration::from_secs(2),
                    seed: Some(1),
                    format: OutputFormat::Text,
                    options: SessionOptions::default(),
                    opts: &opts,
                },
                &mut sink,
            )
            .await
            .unwrap();
        }

        let output = std::fs::read_to_string(&path).unwrap();
        assert!(output.starts_with("Simulated feed: stable every 2000 ms\n"));
        assert!(output.contains("-- Connected --"));
        assert!(output.matches("LOW").count() >= 3);
        assert!(output.contains("3 ingested"));
    }
}
