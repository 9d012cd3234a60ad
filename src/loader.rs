use parking_lot::RwLock;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::ScoreError,
    model::{GbmModel, Regressor},
};

/// Source of the model used to score one request.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn Regressor>, ScoreError>;
}

// ---------- Per-request loading ----------

/// Reads and parses the artifact on every call.
#[derive(Debug, Clone)]
pub struct FileLoader {
    path: PathBuf,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelLoader for FileLoader {
    fn load(&self) -> Result<Arc<dyn Regressor>, ScoreError> {
        if let Ok(cwd) = std::env::current_dir() {
            tracing::debug!("current working directory: {}", cwd.display());
        }
        tracing::info!("looking for model at {}", self.path.display());

        if !self.path.exists() {
            tracing::error!("model file not found at {}", self.path.display());
            return Err(ScoreError::ModelNotFound(self.path.clone()));
        }

        match GbmModel::load(&self.path) {
            Ok(mdl) => {
                tracing::info!(
                    "model loaded: {} trees, {} features",
                    mdl.n_trees(),
                    mdl.feature_names().len()
                );
                Ok(Arc::new(mdl))
            }
            Err(e) => {
                tracing::error!("error loading model: {:#}", e);
                Err(ScoreError::ModelLoad(format!("{:#}", e)))
            }
        }
    }
}

// ---------- Process-wide cache ----------

/// Loads once and hands out the same model afterwards. Failures are not
/// remembered, so a missing artifact is retried on the next request.
pub struct CachedLoader<L> {
    inner: L,
    slot: RwLock<Option<Arc<dyn Regressor>>>,
}

impl<L: ModelLoader> CachedLoader<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            slot: RwLock::new(None),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl<L: ModelLoader> ModelLoader for CachedLoader<L> {
    fn load(&self) -> Result<Arc<dyn Regressor>, ScoreError> {
        if let Some(mdl) = self.slot.read().as_ref() {
            return Ok(Arc::clone(mdl));
        }

        let mut slot = self.slot.write();
        // another request may have filled it while we waited
        if let Some(mdl) = slot.as_ref() {
            return Ok(Arc::clone(mdl));
        }
        let mdl = self.inner.load()?;
        *slot = Some(Arc::clone(&mdl));
        tracing::info!("model cached for the lifetime of the process");
        Ok(mdl)
    }
}
