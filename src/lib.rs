//! # formcast
//!
//! Semantic classification of HTML forms, fields and pages.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Sparse feature vectorization (dict, count, TF-IDF)
//! - Multinomial logistic regression, training and inference
//! - Layered CAPTCHA detection
//! - JSON model persistence
//!
//! ```no_run
//! use formcast::classifier::FormClassifier;
//!
//! let path = FormClassifier::find_model("model.json")?;
//! let classifier = FormClassifier::load(path)?;
//! for result in classifier.extract_forms("<form>...</form>")? {
//!     println!("{}: {:?}", result.form_type, result.fields);
//! }
//! # Ok::<(), formcast::error::FormcastError>(())
//! ```

pub mod captcha;
pub mod classifier;
pub mod cli;
pub mod error;
pub mod features;
pub mod html;
pub mod model;
pub mod vectorize;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
