//! Pre-trained classifier loaded from a JSON tree-ensemble artifact.
//!
//! The artifact is produced elsewhere by exporting a fitted forest. It lists
//! the ordered feature names the forest was fit on, ordinal encodings for the
//! string columns, and the trees themselves. Nothing here trains or updates a
//! model.

use std::collections::HashMap;
use std::path::Path;

use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, Int64Type};
use arrow_array::{Array, RecordBatch};
use arrow_schema::{ArrowError, DataType};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::features::FeatureSchema;

pub const LEGIT: u8 = 0;
pub const FRAUD: u8 = 1;

/// Binary classifier over a feature table keyed by the trained column names.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// Trained column names, in trained order.
    fn feature_names(&self) -> &[String];

    /// `[p_legit, p_fraud]` per row.
    fn predict_proba(&self, batch: &RecordBatch) -> Result<Vec<[f64; 2]>>;

    /// Class label per row; ties go to the legit class.
    fn predict(&self, batch: &RecordBatch) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(batch)?
            .iter()
            .map(|p| if p[1] > p[0] { FRAUD } else { LEGIT })
            .collect())
    }
}

// ── Artifact (serialized form) ──

#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub name: Option<String>,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub categories: HashMap<String, Vec<String>>,
    pub trees: Vec<TreeArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeArtifact {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

// ── Compiled ensemble ──

#[derive(Debug, Clone, Copy)]
enum Compiled {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf([f64; 2]),
}

#[derive(Debug)]
pub struct TreeEnsemble {
    name: String,
    feature_names: Vec<String>,
    schema: FeatureSchema,
    /// Ordinal encoders, indexed like `feature_names`. `None` for numeric columns.
    encoders: Vec<Option<HashMap<String, f64>>>,
    trees: Vec<Vec<Compiled>>,
}

impl TreeEnsemble {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading model artifact");
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ArtifactIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let artifact: ModelArtifact = serde_json::from_str(raw)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        let schema = FeatureSchema::from_names(&artifact.feature_names)?;
        let n_features = artifact.feature_names.len();

        if artifact.trees.is_empty() {
            return Err(Error::InvalidArtifact("ensemble has no trees".into()));
        }

        let mut encoders = Vec::with_capacity(n_features);
        for (name, column) in artifact.feature_names.iter().zip(schema.columns()) {
            let encoder = match (column.data_type(), artifact.categories.get(name)) {
                (DataType::Utf8, Some(values)) => Some(
                    values
                        .iter()
                        .enumerate()
                        .map(|(i, v)| (v.clone(), i as f64))
                        .collect(),
                ),
                (DataType::Utf8, None) => {
                    return Err(Error::InvalidArtifact(format!(
                        "string feature `{name}` has no category encoding"
                    )))
                }
                _ => None,
            };
            encoders.push(encoder);
        }

        let mut trees = Vec::with_capacity(artifact.trees.len());
        for (t, tree) in artifact.trees.iter().enumerate() {
            trees.push(compile_tree(t, &tree.nodes, n_features)?);
        }

        let name = artifact.name.unwrap_or_else(|| "tree-ensemble".to_string());
        info!(
            model = %name,
            trees = trees.len(),
            features = ?artifact.feature_names,
            "Model loaded"
        );

        Ok(Self {
            name,
            feature_names: artifact.feature_names,
            schema,
            encoders,
            trees,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Column names and types must both match the trained schema.
    fn check_schema(&self, batch: &RecordBatch) -> Result<()> {
        let batch_schema = batch.schema();
        let found = batch_schema.fields();
        let matches = found.len() == self.schema.columns().len()
            && found
                .iter()
                .zip(self.schema.columns())
                .all(|(f, c)| f.name() == c.name() && *f.data_type() == c.data_type());
        if !matches {
            return Err(Error::SchemaMismatch {
                expected: self
                    .schema
                    .columns()
                    .iter()
                    .map(|c| format!("{}: {}", c.name(), c.data_type()))
                    .collect(),
                found: found
                    .iter()
                    .map(|f| format!("{}: {}", f.name(), f.data_type()))
                    .collect(),
            });
        }
        Ok(())
    }

    /// Row-major numeric matrix in trained column order.
    fn encode(&self, batch: &RecordBatch) -> Result<Vec<Vec<f64>>> {
        let rows = batch.num_rows();
        let mut matrix = vec![vec![0.0; self.feature_names.len()]; rows];

        for (j, col) in batch.columns().iter().enumerate() {
            match col.data_type() {
                DataType::Int64 => {
                    let arr = col.as_primitive::<Int64Type>();
                    for (i, row) in matrix.iter_mut().enumerate() {
                        row[j] = if arr.is_null(i) { f64::NAN } else { arr.value(i) as f64 };
                    }
                }
                DataType::Float64 => {
                    let arr = col.as_primitive::<Float64Type>();
                    for (i, row) in matrix.iter_mut().enumerate() {
                        row[j] = if arr.is_null(i) { f64::NAN } else { arr.value(i) };
                    }
                }
                DataType::Boolean => {
                    let arr = col.as_boolean();
                    for (i, row) in matrix.iter_mut().enumerate() {
                        row[j] = if arr.is_null(i) {
                            f64::NAN
                        } else if arr.value(i) {
                            1.0
                        } else {
                            0.0
                        };
                    }
                }
                DataType::Utf8 => {
                    let arr = col.as_string::<i32>();
                    let encoder = self.encoders[j].as_ref().ok_or_else(|| {
                        ArrowError::SchemaError(format!(
                            "column `{}` is a string but the model expects a number",
                            self.feature_names[j]
                        ))
                    })?;
                    for (i, row) in matrix.iter_mut().enumerate() {
                        row[j] = if arr.is_null(i) {
                            f64::NAN
                        } else {
                            encoder.get(arr.value(i)).copied().unwrap_or(-1.0)
                        };
                    }
                }
                other => {
                    return Err(ArrowError::SchemaError(format!(
                        "unsupported type {other} for column `{}`",
                        self.feature_names[j]
                    ))
                    .into())
                }
            }
        }

        Ok(matrix)
    }
}

impl Classifier for TreeEnsemble {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, batch: &RecordBatch) -> Result<Vec<[f64; 2]>> {
        self.check_schema(batch)?;
        let matrix = self.encode(batch)?;
        let n_trees = self.trees.len() as f64;

        let out = matrix
            .iter()
            .map(|row| {
                let mut acc = [0.0, 0.0];
                for tree in &self.trees {
                    let leaf = walk(tree, row);
                    acc[0] += leaf[0];
                    acc[1] += leaf[1];
                }
                [acc[0] / n_trees, acc[1] / n_trees]
            })
            .collect::<Vec<_>>();

        debug!(model = %self.name, rows = out.len(), "predict_proba");
        Ok(out)
    }
}

/// NaN never satisfies `<=`, so missing values route right.
fn walk(tree: &[Compiled], row: &[f64]) -> [f64; 2] {
    let mut idx = 0;
    loop {
        match tree[idx] {
            Compiled::Leaf(p) => return p,
            Compiled::Split { feature, threshold, left, right } => {
                idx = if row[feature] <= threshold { left } else { right };
            }
        }
    }
}

fn compile_tree(t: usize, nodes: &[Node], n_features: usize) -> Result<Vec<Compiled>> {
    if nodes.is_empty() {
        return Err(Error::InvalidArtifact(format!("tree {t} has no nodes")));
    }
    let invalid = |i: usize, msg: String| Error::InvalidArtifact(format!("tree {t} node {i}: {msg}"));

    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| match node {
            Node::Split { feature, threshold, left, right } => {
                if *feature >= n_features {
                    return Err(invalid(i, format!("feature index {feature} out of range")));
                }
                if threshold.is_nan() {
                    return Err(invalid(i, "threshold is NaN".into()));
                }
                for child in [*left, *right] {
                    // children always point forward, which also rules out cycles
                    if child <= i || child >= nodes.len() {
                        return Err(invalid(i, format!("child index {child} out of range")));
                    }
                }
                Ok(Compiled::Split {
                    feature: *feature,
                    threshold: *threshold,
                    left: *left,
                    right: *right,
                })
            }
            Node::Leaf { value } => {
                if value.len() != 2 {
                    return Err(invalid(i, format!("leaf has {} class weights, expected 2", value.len())));
                }
                let total = value[0] + value[1];
                if value.iter().any(|v| !v.is_finite() || *v < 0.0) || total <= 0.0 {
                    return Err(invalid(i, format!("bad leaf weights {value:?}")));
                }
                Ok(Compiled::Leaf([value[0] / total, value[1] / total]))
            }
        })
        .collect()
}
