//! Command line argument parsing for the formcast CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// formcast - HTML form, field, and page type classification
#[derive(Parser, Debug, Clone)]
#[command(name = "formcast")]
#[command(about = "Classify HTML forms, fields and pages by semantic type")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct FormcastArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl FormcastArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Classify the forms (and optionally the page) in an HTML file
    Classify(ClassifyArgs),

    /// Train a model bundle from a labeled dataset
    Train(TrainArgs),

    /// Detect CAPTCHA markers in an HTML file
    #[command(name = "detect-captcha")]
    DetectCaptcha(DetectCaptchaArgs),

    /// Show the classes and pipelines of a model bundle
    Inspect(InspectArgs),
}

/// Arguments for form/page classification
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// HTML file to classify
    pub html_file: PathBuf,

    /// Model bundle path (searched for when omitted)
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Page URL, enables page-type classification
    #[arg(short, long)]
    pub url: Option<String>,

    /// Emit per-class probabilities instead of hard labels
    #[arg(long)]
    pub proba: bool,

    /// Omit probabilities below this value (with --proba)
    #[arg(short, long, default_value_t = 0.0)]
    pub threshold: f64,
}

/// Arguments for model training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Labeled dataset (JSON array of annotated pages)
    pub dataset: PathBuf,

    /// Output model bundle path
    #[arg(short, long, default_value = "model.json")]
    pub output: PathBuf,

    /// Inverse regularization strength
    #[arg(short, long, default_value_t = 5.0)]
    pub c: f64,

    /// Maximum optimizer iterations
    #[arg(long, default_value_t = 100)]
    pub max_iter: usize,

    /// Disable balanced class weighting
    #[arg(long)]
    pub no_balance: bool,
}

/// Arguments for CAPTCHA detection
#[derive(Parser, Debug, Clone)]
pub struct DetectCaptchaArgs {
    /// HTML file to scan
    pub html_file: PathBuf,
}

/// Arguments for model inspection
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// Model bundle path (searched for when omitted)
    #[arg(short, long)]
    pub model: Option<PathBuf>,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
