//! Fraud scoring form.
//!
//! Collects one transaction at a time, projects it onto the columns a
//! pre-trained tree ensemble was fit on, and reports a fraud verdict with a
//! probability gauge. Flagged phone numbers accumulate in a per-session
//! watchlist.

pub mod context;
pub mod error;
pub mod features;
pub mod generator;
pub mod latency;
pub mod locator;
pub mod model;
pub mod render;
pub mod session;
pub mod types;
pub mod web;

pub use context::{AppConfig, AppContext};
pub use error::{Error, Result};
pub use features::{FeatureMapper, FeatureSchema};
pub use model::{Classifier, TreeEnsemble};
pub use render::{Gauge, GaugeBand, PredictionReport, Verdict};
pub use session::{Session, Watchlist};
pub use types::{TransactionInput, TransactionType};
