use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use std::{collections::HashSet, fs, path::Path};

use crate::features::CategorySchema;

/// Anything that can score a single feature row.
///
/// `feature_names` is the authoritative column order: rows handed to
/// `predict` are already aligned to it.
pub trait Regressor: Send + Sync {
    fn feature_names(&self) -> &[String];

    /// Category lists shipped with the model, if any.
    fn categories(&self) -> Option<&CategorySchema> {
        None
    }

    fn predict(&self, row: &[f64]) -> Result<f64>;
}

// ---------- Artifact format ----------

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NodeJson {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Deserialize)]
struct TreeJson {
    nodes: Vec<NodeJson>,
}

#[derive(Debug, Deserialize)]
struct ArtifactJson {
    feature_names: Vec<String>,
    init_value: f64,
    learning_rate: f64,
    trees: Vec<TreeJson>,
    #[serde(default)]
    categories: Option<CategorySchema>,
}

// ---------- Trees ----------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_json(tree: TreeJson, n_features: usize) -> Result<Self> {
        ensure!(!tree.nodes.is_empty(), "tree has no nodes");
        let len = tree.nodes.len();
        let mut nodes = Vec::with_capacity(len);
        for (idx, node) in tree.nodes.into_iter().enumerate() {
            let node = match node {
                NodeJson::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    ensure!(
                        feature < n_features,
                        "node {idx} splits on feature {feature}, model has {n_features}"
                    );
                    ensure!(threshold.is_finite(), "node {idx} has a non-finite threshold");
                    // children strictly after the parent rules out cycles
                    for child in [left, right] {
                        ensure!(
                            child > idx && child < len,
                            "node {idx} has invalid child index {child}"
                        );
                    }
                    Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    }
                }
                NodeJson::Leaf { value } => {
                    ensure!(value.is_finite(), "leaf {idx} has a non-finite value");
                    Node::Leaf(value)
                }
            };
            nodes.push(node);
        }
        Ok(Self { nodes })
    }

    /// Walks from the root; `x <= threshold` goes left. NaN compares false
    /// and therefore goes right.
    fn eval(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(v) => return v,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

// ---------- Model ----------

/// Gradient-boosted regression trees:
/// `init_value + learning_rate * sum(tree(x))`.
#[derive(Debug, Clone)]
pub struct GbmModel {
    feature_names: Vec<String>,
    init_value: f64,
    learning_rate: f64,
    trees: Vec<Tree>,
    categories: Option<CategorySchema>,
}

impl GbmModel {
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read model at {}", path.display()))?;
        Self::from_json(&txt)
    }

    pub fn from_json(txt: &str) -> Result<Self> {
        let art: ArtifactJson =
            serde_json::from_str(txt).context("failed to parse model artifact")?;

        ensure!(!art.feature_names.is_empty(), "model declares no features");
        let mut seen = HashSet::new();
        for name in &art.feature_names {
            if !seen.insert(name.as_str()) {
                bail!("duplicate feature name {:?}", name);
            }
        }
        ensure!(art.init_value.is_finite(), "init_value is not finite");
        ensure!(art.learning_rate.is_finite(), "learning_rate is not finite");

        let n_features = art.feature_names.len();
        let trees = art
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| Tree::from_json(t, n_features).with_context(|| format!("tree {i}")))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            feature_names: art.feature_names,
            init_value: art.init_value,
            learning_rate: art.learning_rate,
            trees,
            categories: art.categories,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for GbmModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn categories(&self) -> Option<&CategorySchema> {
        self.categories.as_ref()
    }

    fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.feature_names.len() {
            bail!(
                "feature length mismatch: got {}, expected {}",
                row.len(),
                self.feature_names.len()
            );
        }
        let sum: f64 = self.trees.iter().map(|t| t.eval(row)).sum();
        Ok(self.init_value + self.learning_rate * sum)
    }
}
