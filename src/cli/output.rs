//! Output formatting for CLI commands.

use serde::Serialize;

use crate::cli::args::{FormcastArgs, OutputFormat};
use crate::error::Result;

/// Summary emitted after training.
#[derive(Debug, Serialize)]
pub struct TrainSummary {
    pub output: String,
    pub form_classes: Vec<String>,
    pub field_classes: Vec<String>,
    pub page_classes: Option<Vec<String>>,
    pub form_samples: usize,
    pub field_samples: usize,
    pub page_samples: usize,
}

/// Per-pipeline row of the inspect command.
#[derive(Debug, Serialize)]
pub struct PipelineInfo {
    pub name: String,
    pub extractor: String,
    pub columns: usize,
}

/// One model's section of the inspect command.
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub classes: Vec<String>,
    pub feature_columns: usize,
    pub pipelines: Vec<PipelineInfo>,
}

/// Full model bundle report of the inspect command.
#[derive(Debug, Serialize)]
pub struct BundleInfo {
    pub form: ModelInfo,
    pub fields: ModelInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<ModelInfo>,
}

/// CAPTCHA scan report for one HTML file.
#[derive(Debug, Serialize)]
pub struct CaptchaReport {
    pub page: crate::captcha::CaptchaKind,
    pub forms: Vec<crate::captcha::CaptchaKind>,
}

/// Print a result either as JSON or as a short human message followed
/// by pretty JSON details.
pub fn output_result<T: Serialize>(message: &str, data: &T, cli_args: &FormcastArgs) -> Result<()> {
    match cli_args.output_format {
        OutputFormat::Json => {
            let json = if cli_args.pretty {
                serde_json::to_string_pretty(data)?
            } else {
                serde_json::to_string(data)?
            };
            println!("{json}");
        }
        OutputFormat::Human => {
            if cli_args.verbosity() > 0 {
                println!("{message}");
            }
            println!("{}", serde_json::to_string_pretty(data)?);
        }
    }
    Ok(())
}
