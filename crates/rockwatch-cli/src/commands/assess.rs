//! Assess command implementation.

use anyhow::Result;
use rockwatch_core::{ReadingValidator, RiskClassifier};
use rockwatch_types::Reading;
use tracing::warn;

use crate::cli::OutputFormat;
use crate::format::{
    FormatOptions, format_assessment_json, format_assessment_text, format_csv_header,
    format_csv_line,
};
use crate::util::OutputSink;

/// Arguments for the assess command.
pub struct AssessArgs<'a> {
    pub reading: Reading,
    pub classifier: &'a RiskClassifier,
    pub validator: &'a ReadingValidator,
    pub format: OutputFormat,
    pub opts: &'a FormatOptions,
}

pub fn cmd_assess(args: AssessArgs<'_>, sink: &mut OutputSink) -> Result<()> {
    sink.write(&render_assessment(&args)?)
}

fn render_assessment(args: &AssessArgs<'_>) -> Result<String> {
    let AssessArgs {
        reading,
        classifier,
        validator,
        format,
        opts,
    } = args;

    let assessment = classifier.assess(reading);
    let warnings = validator.validate(reading).warnings;
    for warning in &warnings {
        warn!("{}", warning);
    }

    let content = match format {
        OutputFormat::Text => format_assessment_text(reading, &assessment, &warnings, opts),
        OutputFormat::Json => format_assessment_json(reading, &assessment, &warnings, opts)?,
        OutputFormat::Csv => {
            let mut out = String::new();
            if !opts.no_header {
                out.push_str(&format_csv_header(opts));
            }
            out.push_str(&format_csv_line(reading, &assessment, opts));
            out
        }
    };
    Ok(content)
}
