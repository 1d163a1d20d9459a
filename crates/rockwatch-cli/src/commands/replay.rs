//! Replay command implementation.
//!
//! Feeds a recorded stream of JSON lines through a [`MonitoringSession`] as if
//! it were arriving live. Each line is either a tagged channel event
//! (`{"type": "connect"}`, `{"type": "sensor_data", "data": {...}}`) or a bare
//! reading object. Blank lines and lines starting with `#` are ignored;
//! malformed lines are logged and skipped.

use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use rockwatch_core::{ManualChannel, MonitoringSession, SessionEvent, SessionOptions};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::format::{
    FormatOptions, format_csv_header, format_csv_line, format_feed_json, format_feed_line,
    format_summary_json, format_summary_text,
};
use crate::style;
use crate::util::{OutputSink, open_input};

/// Arguments for the replay command.
pub struct ReplayArgs<'a> {
    pub input: &'a Path,
    pub format: OutputFormat,
    pub summary: bool,
    pub options: SessionOptions,
    pub opts: &'a FormatOptions,
}

/// Counters reported at the end of a replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub lines: usize,
    pub assessed: usize,
    pub skipped: usize,
}

pub fn cmd_replay(args: ReplayArgs<'_>, sink: &mut OutputSink) -> Result<()> {
    let reader = open_input(args.input)?;
    let stats = replay(reader, args, sink)?;
    info!(
        lines = stats.lines,
        assessed = stats.assessed,
        skipped = stats.skipped,
        "Replay finished"
    );
    Ok(())
}

/// Drive a session over the lines of `reader`.
pub fn replay<R: BufRead>(
    reader: R,
    args: ReplayArgs<'_>,
    sink: &mut OutputSink,
) -> Result<ReplayStats> {
    let ReplayArgs {
        format,
        summary,
        options,
        opts,
        ..
    } = args;

    let channel = ManualChannel::new();
    let feed = channel.handle();
    let session = MonitoringSession::open(channel, options)?;
    let mut events = session.subscribe();

    let mut printer = FeedPrinter::new(format, opts);
    let mut stats = ReplayStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read line {line_no}"))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        stats.lines += 1;

        if let Err(e) = feed.send_json(line) {
            warn!(line = line_no, "Skipping malformed line: {e}");
            stats.skipped += 1;
            continue;
        }
        stats.assessed += printer.drain(&mut events, sink)?;
    }

    if summary {
        let snapshot = session.snapshot();
        match format {
            OutputFormat::Text => sink.write(&format_summary_text(&snapshot, opts))?,
            OutputFormat::Json => {
                sink.write(&format_summary_json(&snapshot, &opts.with_compact(true))?)?
            }
            // Keep CSV output tabular
            OutputFormat::Csv => {}
        }
    }

    session.close();
    Ok(stats)
}

/// Writes session events in the selected output format.
pub(crate) struct FeedPrinter<'a> {
    format: OutputFormat,
    opts: &'a FormatOptions,
    previous_score: Option<u8>,
    header_written: bool,
}

impl<'a> FeedPrinter<'a> {
    pub(crate) fn new(format: OutputFormat, opts: &'a FormatOptions) -> Self {
        Self {
            format,
            opts,
            previous_score: None,
            header_written: opts.no_header,
        }
    }

    /// Write one event; returns whether it was an assessment.
    pub(crate) fn print(&mut self, event: &SessionEvent, sink: &mut OutputSink) -> Result<bool> {
        match event {
            SessionEvent::Assessed {
                reading,
                assessment,
                warnings,
            } => {
                let content = match self.format {
                    OutputFormat::Text => {
                        format_feed_line(reading, assessment, self.previous_score, self.opts)
                    }
                    OutputFormat::Json => {
                        format_feed_json(reading, assessment, warnings, self.opts)?
                    }
                    OutputFormat::Csv => {
                        let mut out = String::new();
                        if !self.header_written {
                            out.push_str(&format_csv_header(self.opts));
                            self.header_written = true;
                        }
                        out.push_str(&format_csv_line(reading, assessment, self.opts));
                        out
                    }
                };
                self.previous_score = Some(assessment.score);
                sink.write(&content)?;
                Ok(true)
            }
            SessionEvent::StateChanged { state } => {
                info!("Connection state: {state}");
                if self.format == OutputFormat::Text {
                    let nc = self.opts.no_color;
                    let line = format!("-- {} --", style::format_connection(*state, nc));
                    sink.write(&format!("{}\n", style::dimmed(&line, nc)))?;
                }
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    /// Write every event currently queued; returns the number of assessments.
    fn drain(
        &mut self,
        events: &mut Receiver<SessionEvent>,
        sink: &mut OutputSink,
    ) -> Result<usize> {
        let mut assessed = 0;
        loop {
            match events.try_recv() {
                Ok(event) => {
                    if self.print(&event, sink)? {
                        assessed += 1;
                    }
                }
                Err(TryRecvError::Lagged(missed)) => {
                    warn!("Output fell behind, {missed} events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(assessed),
            }
        }
    }
}
