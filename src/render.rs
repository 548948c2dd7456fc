use arrow_array::RecordBatch;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Classifier, FRAUD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Fraudulent,
    NotFraudulent,
}

impl Verdict {
    pub fn from_label(label: u8) -> Self {
        if label == FRAUD {
            Verdict::Fraudulent
        } else {
            Verdict::NotFraudulent
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Fraudulent => "Fraudulent",
            Verdict::NotFraudulent => "Not Fraudulent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugeBand {
    Green,
    Yellow,
    Red,
}

impl GaugeBand {
    /// [0,50) green, [50,75) yellow, [75,100] red.
    pub fn for_percent(value: f64) -> Self {
        if value < 50.0 {
            GaugeBand::Green
        } else if value < 75.0 {
            GaugeBand::Yellow
        } else {
            GaugeBand::Red
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    /// Fraud probability as a percentage.
    pub value: f64,
    pub band: GaugeBand,
    /// Marker position; always the current value.
    pub threshold: f64,
}

impl Gauge {
    pub fn from_probability(probability: f64) -> Self {
        let value = (probability * 100.0).clamp(0.0, 100.0);
        Self {
            value,
            band: GaugeBand::for_percent(value),
            threshold: value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    pub label: u8,
    pub verdict: Verdict,
    /// Probability of the fraud class.
    pub probability: f64,
    pub probabilities: [f64; 2],
    pub gauge: Gauge,
    pub summary: Vec<String>,
}

impl PredictionReport {
    pub fn is_fraud(&self) -> bool {
        self.label == FRAUD
    }
}

/// Runs `predict` and `predict_proba` on a single-row feature table.
pub fn render_prediction(model: &dyn Classifier, features: &RecordBatch) -> Result<PredictionReport> {
    if features.num_rows() != 1 {
        return Err(Error::InvalidInput(format!(
            "expected a single transaction, got {} rows",
            features.num_rows()
        )));
    }

    let labels = model.predict(features)?;
    let probabilities = model.predict_proba(features)?;
    let label = labels[0];
    let proba = probabilities[0];
    let verdict = Verdict::from_label(label);

    let summary = vec![
        format!("Predictions: {labels:?}"),
        format!("Prediction Probabilities: {probabilities:?}"),
        "Transaction 1:".to_string(),
        format!("Predicted class: {}", verdict.label()),
        format!("Probability of being fraudulent: {:.4}", proba[1]),
    ];

    Ok(PredictionReport {
        label,
        verdict,
        probability: proba[1],
        probabilities: proba,
        gauge: Gauge::from_probability(proba[1]),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges() {
        assert_eq!(GaugeBand::for_percent(0.0), GaugeBand::Green);
        assert_eq!(GaugeBand::for_percent(49.999), GaugeBand::Green);
        assert_eq!(GaugeBand::for_percent(50.0), GaugeBand::Yellow);
        assert_eq!(GaugeBand::for_percent(74.999), GaugeBand::Yellow);
        assert_eq!(GaugeBand::for_percent(75.0), GaugeBand::Red);
        assert_eq!(GaugeBand::for_percent(100.0), GaugeBand::Red);
    }

    #[test]
    fn marker_tracks_probability() {
        let gauge = Gauge::from_probability(0.625);
        assert_eq!(gauge.value, 62.5);
        assert_eq!(gauge.threshold, gauge.value);
        assert_eq!(gauge.band, GaugeBand::Yellow);
    }

    #[test]
    fn verdict_follows_label() {
        assert_eq!(Verdict::from_label(1), Verdict::Fraudulent);
        assert_eq!(Verdict::from_label(0), Verdict::NotFraudulent);
    }
}
