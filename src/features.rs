//! Projection of form fields onto the column set a model was trained on.
//!
//! The mapper only selects and orders columns. It does not validate or coerce
//! values; a schema the model does not expect is caught inside the model's
//! own `predict` call.

use std::sync::Arc;

use arrow_array::{ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema, SchemaRef};

use crate::error::{Error, Result};
use crate::types::TransactionInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Step,
    Type,
    Amount,
    NameOrig,
    OldBalanceOrg,
    NewBalanceOrig,
    NameDest,
    OldBalanceDest,
    NewBalanceDest,
    IsFlaggedFraud,
}

pub const ALL_COLUMNS: &[Column] = &[
    Column::Step,
    Column::Type,
    Column::Amount,
    Column::NameOrig,
    Column::OldBalanceOrg,
    Column::NewBalanceOrig,
    Column::NameDest,
    Column::OldBalanceDest,
    Column::NewBalanceDest,
    Column::IsFlaggedFraud,
];

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Step => "step",
            Column::Type => "type",
            Column::Amount => "amount",
            Column::NameOrig => "nameOrig",
            Column::OldBalanceOrg => "oldbalanceOrg",
            Column::NewBalanceOrig => "newbalanceOrig",
            Column::NameDest => "nameDest",
            Column::OldBalanceDest => "oldbalanceDest",
            Column::NewBalanceDest => "newbalanceDest",
            Column::IsFlaggedFraud => "isFlaggedFraud",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        ALL_COLUMNS
            .iter()
            .copied()
            .find(|c| c.name() == name)
            .ok_or_else(|| Error::UnknownFeature(name.to_string()))
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Column::Step => DataType::Int64,
            Column::Type | Column::NameOrig | Column::NameDest => DataType::Utf8,
            Column::IsFlaggedFraud => DataType::Boolean,
            _ => DataType::Float64,
        }
    }

    fn array(&self, tx: &TransactionInput) -> ArrayRef {
        match self {
            Column::Step => Arc::new(Int64Array::from(vec![tx.step])),
            Column::Type => Arc::new(StringArray::from(vec![tx.kind.label()])),
            Column::Amount => Arc::new(Float64Array::from(vec![tx.amount])),
            Column::NameOrig => Arc::new(StringArray::from(vec![tx.origin_account.as_str()])),
            Column::OldBalanceOrg => Arc::new(Float64Array::from(vec![tx.old_balance_origin])),
            Column::NewBalanceOrig => Arc::new(Float64Array::from(vec![tx.new_balance_origin])),
            Column::NameDest => Arc::new(StringArray::from(vec![tx.destination_account.as_str()])),
            Column::OldBalanceDest => Arc::new(Float64Array::from(vec![tx.old_balance_destination])),
            Column::NewBalanceDest => Arc::new(Float64Array::from(vec![tx.new_balance_destination])),
            Column::IsFlaggedFraud => Arc::new(BooleanArray::from(vec![tx.is_flagged_fraud])),
        }
    }
}

/// Balance-only schema: identifiers and flag columns dropped before training.
pub const BALANCES_SCHEMA: &[Column] = &[
    Column::Step,
    Column::Type,
    Column::Amount,
    Column::OldBalanceOrg,
    Column::NewBalanceOrig,
    Column::OldBalanceDest,
    Column::NewBalanceDest,
];

/// Superset schema including account identifiers and the flagged-fraud bit.
pub const FULL_SCHEMA: &[Column] = &[
    Column::Step,
    Column::Type,
    Column::Amount,
    Column::NameOrig,
    Column::OldBalanceOrg,
    Column::NewBalanceOrig,
    Column::NameDest,
    Column::OldBalanceDest,
    Column::NewBalanceDest,
    Column::IsFlaggedFraud,
];

/// Ordered column list of a trained model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<Column>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn balances() -> Self {
        Self::new(BALANCES_SCHEMA.to_vec())
    }

    pub fn full() -> Self {
        Self::new(FULL_SCHEMA.to_vec())
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|n| Column::from_name(n.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn arrow_schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(c.name(), c.data_type(), false))
            .collect();
        Arc::new(Schema::new(fields))
    }
}

pub struct FeatureMapper {
    schema: FeatureSchema,
    arrow_schema: SchemaRef,
}

impl FeatureMapper {
    pub fn new(schema: FeatureSchema) -> Self {
        let arrow_schema = schema.arrow_schema();
        Self { schema, arrow_schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Single-row feature table in trained column order.
    pub fn map(&self, tx: &TransactionInput) -> Result<RecordBatch> {
        let arrays: Vec<ArrayRef> = self.schema.columns.iter().map(|c| c.array(tx)).collect();
        Ok(RecordBatch::try_new(self.arrow_schema.clone(), arrays)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_names_rejects_unknown_columns() {
        let err = FeatureSchema::from_names(&["step", "isFraud"]).unwrap_err();
        assert!(matches!(err, Error::UnknownFeature(ref c) if c == "isFraud"));
    }

    #[test]
    fn presets_round_trip_through_names() {
        let full = FeatureSchema::full();
        assert_eq!(FeatureSchema::from_names(&full.names()).unwrap(), full);
        assert_eq!(FeatureSchema::balances().columns().len(), 7);
    }
}
