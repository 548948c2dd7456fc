use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PHONE: &str = "0240818849";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Payment,
    Transfer,
    CashOut,
    Debit,
    CashIn,
}

pub const ALL_TYPES: &[TransactionType] = &[
    TransactionType::Payment,
    TransactionType::Transfer,
    TransactionType::CashOut,
    TransactionType::Debit,
    TransactionType::CashIn,
];

impl TransactionType {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Payment => "PAYMENT",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::CashOut => "CASH_OUT",
            TransactionType::Debit => "DEBIT",
            TransactionType::CashIn => "CASH_IN",
        }
    }
}

// ── Form input (one per prediction request) ──

/// Raw form fields. Serialized names are the column names the model was
/// trained on; the descriptive names are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionInput {
    pub step: i64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    #[serde(rename = "nameOrig", alias = "originAccountId")]
    pub origin_account: String,
    #[serde(rename = "oldbalanceOrg", alias = "oldBalanceOrigin")]
    pub old_balance_origin: f64,
    #[serde(rename = "newbalanceOrig", alias = "newBalanceOrigin")]
    pub new_balance_origin: f64,
    #[serde(rename = "nameDest", alias = "destinationAccountId")]
    pub destination_account: String,
    #[serde(rename = "oldbalanceDest", alias = "oldBalanceDestination")]
    pub old_balance_destination: f64,
    #[serde(rename = "newbalanceDest", alias = "newBalanceDestination")]
    pub new_balance_destination: f64,
    #[serde(rename = "isFlaggedFraud")]
    pub is_flagged_fraud: bool,
}

impl Default for TransactionInput {
    fn default() -> Self {
        Self {
            step: 1,
            kind: TransactionType::Payment,
            amount: 1000.0,
            origin_account: "C840083671".into(),
            old_balance_origin: 1001.0,
            new_balance_origin: 0.0,
            destination_account: "C38997010".into(),
            old_balance_destination: 0.0,
            new_balance_destination: 1001.0,
            is_flagged_fraud: false,
        }
    }
}

impl TransactionInput {
    /// Re-checks the constraints the form widgets enforce in the browser.
    pub fn validate(&self) -> Result<()> {
        if self.step < 1 {
            return Err(Error::InvalidInput(format!("step must be >= 1, got {}", self.step)));
        }
        let money = [
            ("amount", self.amount),
            ("oldbalanceOrg", self.old_balance_origin),
            ("newbalanceOrig", self.new_balance_origin),
            ("oldbalanceDest", self.old_balance_destination),
            ("newbalanceDest", self.new_balance_destination),
        ];
        for (name, value) in money {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidInput(format!("{name} must be a non-negative number, got {value}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_trained_and_descriptive_names() {
        let trained: TransactionInput = serde_json::from_str(
            r#"{"step":3,"type":"CASH_OUT","amount":5.0,"nameOrig":"C1","oldbalanceOrg":5.0}"#,
        )
        .unwrap();
        let descriptive: TransactionInput = serde_json::from_str(
            r#"{"step":3,"type":"CASH_OUT","amount":5.0,"originAccountId":"C1","oldBalanceOrigin":5.0}"#,
        )
        .unwrap();
        assert_eq!(trained, descriptive);
        assert_eq!(trained.kind, TransactionType::CashOut);
        assert_eq!(trained.destination_account, "C38997010");
    }

    #[test]
    fn ignores_label_columns() {
        let tx: TransactionInput =
            serde_json::from_str(r#"{"type":"TRANSFER","isFraud":1}"#).unwrap();
        assert_eq!(tx.kind, TransactionType::Transfer);
    }

    #[test]
    fn validate_rejects_widget_violations() {
        assert!(TransactionInput::default().validate().is_ok());
        let bad_step = TransactionInput { step: 0, ..Default::default() };
        assert!(bad_step.validate().unwrap_err().is_client_error());
        let negative = TransactionInput { new_balance_destination: -1.0, ..Default::default() };
        assert!(negative.validate().is_err());
        let nan = TransactionInput { amount: f64::NAN, ..Default::default() };
        assert!(nan.validate().is_err());
    }
}
