//! Utility functions for CLI operations.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Destination for command output: stdout, or a file given with `--output`.
///
/// Every write is flushed so that streaming commands show each line as it
/// is produced.
pub struct OutputSink {
    writer: Box<dyn Write>,
}

impl OutputSink {
    /// Open the sink, creating or truncating `path` when given.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let writer: Box<dyn Write> = match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(io::stdout()),
        };
        Ok(Self { writer })
    }

    /// Write content and flush.
    pub fn write(&mut self, content: &str) -> Result<()> {
        self.writer
            .write_all(content.as_bytes())
            .and_then(|()| self.writer.flush())
            .context("Failed to write output")
    }
}

/// Open an input for line-by-line reading; `-` reads stdin.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}
