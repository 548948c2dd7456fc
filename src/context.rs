use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use arrow::util::pretty::pretty_format_batches;
use tokio::sync::OnceCell;
use tracing::info;

use crate::error::{Error, Result};
use crate::features::FeatureMapper;
use crate::latency::{LatencyStats, LatencyTracker};
use crate::locator::{Locator, DEFAULT_STEP_DELAY};
use crate::model::TreeEnsemble;
use crate::render::{self, PredictionReport};
use crate::session::Session;
use crate::types::TransactionInput;

pub const DEFAULT_MODEL_PATH: &str = "models/model.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub locator_step: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            locator_step: DEFAULT_STEP_DELAY,
        }
    }
}

/// A classifier together with the mapper built from its trained schema.
pub struct LoadedModel {
    pub classifier: TreeEnsemble,
    pub mapper: FeatureMapper,
}

impl LoadedModel {
    pub fn new(classifier: TreeEnsemble) -> Self {
        let mapper = FeatureMapper::new(classifier.schema().clone());
        Self { classifier, mapper }
    }
}

/// Everything shared by all sessions of one running application.
pub struct AppContext {
    config: AppConfig,
    locator: Locator,
    model: OnceCell<Arc<LoadedModel>>,
    loads: AtomicUsize,
    latency: Mutex<LatencyTracker>,
    next_session: AtomicU64,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        let locator = Locator::new(config.locator_step);
        Self {
            config,
            locator,
            model: OnceCell::new(),
            loads: AtomicUsize::new(0),
            latency: Mutex::new(LatencyTracker::new()),
            next_session: AtomicU64::new(1),
        }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Loads the artifact on first use; later calls return the cached model.
    pub async fn model(&self) -> Result<Arc<LoadedModel>> {
        let loaded = self
            .model
            .get_or_try_init(|| async {
                let classifier = TreeEnsemble::load(&self.config.model_path)?;
                self.loads.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(Arc::new(LoadedModel::new(classifier)))
            })
            .await?;
        Ok(loaded.clone())
    }

    /// Number of times the artifact has been read from disk.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Validate, map, and classify one transaction.
    pub async fn predict(&self, tx: &TransactionInput) -> Result<PredictionReport> {
        tx.validate()?;
        let model = self.model().await?;

        let start = Instant::now();
        let features = model.mapper.map(tx)?;
        let report = render::render_prediction(&model.classifier, &features)?;
        self.latency
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record_inference(start);

        Ok(report)
    }

    /// Headless scoring of one transaction given as JSON. Returns the feature
    /// table, the summary lines and the gauge reading, in print order.
    pub async fn score(&self, raw: &str) -> Result<Vec<String>> {
        let tx: TransactionInput =
            serde_json::from_str(raw).map_err(|e| Error::InvalidInput(e.to_string()))?;
        tx.validate()?;

        let model = self.model().await?;
        let features = model.mapper.map(&tx)?;
        let table = pretty_format_batches(std::slice::from_ref(&features))?;
        let report = render::render_prediction(&model.classifier, &features)?;
        info!(verdict = report.verdict.label(), probability = report.probability, "Scored transaction");

        let mut lines = Vec::with_capacity(report.summary.len() + 2);
        lines.push(table.to_string());
        lines.extend(report.summary);
        lines.push(format!("Gauge: {:.1}% ({:?})", report.gauge.value, report.gauge.band));
        Ok(lines)
    }

    pub fn latency_stats(&self) -> LatencyStats {
        self.latency
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .inference_stats()
    }

    pub fn open_session(&self) -> Session {
        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        Session::new(id)
    }
}
