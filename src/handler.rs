use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use std::{borrow::Cow, sync::Arc};

use crate::{
    error::ScoreError,
    features::{CategorySchema, FeatureRow},
    loader::ModelLoader,
    types::{ScoreParams, ScoreRequest, ScoreResponse},
    validate::validate,
};

pub const SCORE_ROUTE: &str = "/api/score_model";

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub loader: Arc<dyn ModelLoader>,
}

impl AppState {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self { loader }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(SCORE_ROUTE, get(score_model).post(score_model))
        .with_state(state)
}

// ---------- Pipeline ----------

/// Load, build features, align to the model, predict. Stops at the first
/// failing stage.
pub fn score(loader: &dyn ModelLoader, req: &ScoreRequest) -> Result<ScoreResponse, ScoreError> {
    let mdl = loader.load()?;

    let schema = match mdl.categories() {
        Some(c) => Cow::Borrowed(c),
        None => Cow::Owned(CategorySchema::default()),
    };
    let row = FeatureRow::build(req, &schema);
    tracing::debug!("payload columns before reordering: {:?}", row.columns());
    tracing::debug!("model columns: {:?}", mdl.feature_names());

    let row = row.align(mdl.feature_names()).inspect_err(|e| {
        tracing::error!("{}", e);
    })?;
    tracing::debug!("payload columns after reordering: {:?}", row.columns());

    if let Err(e) = row.ensure_finite() {
        tracing::error!("input payload contains NaN or infinite values");
        return Err(e);
    }

    let prediction = mdl.predict(row.values()).map_err(|e| {
        tracing::error!("prediction error: {:#}", e);
        tracing::error!("input payload: {:?}", row.values());
        ScoreError::Prediction(e.to_string())
    })?;
    tracing::info!("prediction: {}", prediction);

    Ok(ScoreResponse::scored(req, prediction))
}

// Loading reads the artifact from disk, so the pipeline runs off the
// async workers.
async fn score_blocking(
    loader: Arc<dyn ModelLoader>,
    req: ScoreRequest,
) -> Result<ScoreResponse, ScoreError> {
    tokio::task::spawn_blocking(move || score(loader.as_ref(), &req))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("scoring task failed: {}", e);
            Err(ScoreError::Prediction("scoring task panicked".into()))
        })
}

// ---------- Handler ----------

async fn score_model(
    State(state): State<AppState>,
    params: Result<Query<ScoreParams>, QueryRejection>,
) -> Result<Json<ScoreResponse>, ScoreError> {
    let Query(params) = params.map_err(|e| ScoreError::InvalidQuery(e.body_text()))?;

    let result = match validate(params) {
        Ok(req) => score_blocking(state.loader, req).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(resp) => Ok(Json(resp)),
        Err(e) => {
            tracing::warn!(status = e.status().as_u16(), "score_model failed: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Regressor;

    // Sums the row; expects exactly `names`.
    struct Summing {
        names: Vec<String>,
    }

    impl Regressor for Summing {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict(&self, row: &[f64]) -> anyhow::Result<f64> {
            Ok(row.iter().sum())
        }
    }

    struct Fixed(Arc<dyn Regressor>);

    impl ModelLoader for Fixed {
        fn load(&self) -> Result<Arc<dyn Regressor>, ScoreError> {
            Ok(Arc::clone(&self.0))
        }
    }

    fn req(supplier: &str) -> ScoreRequest {
        ScoreRequest {
            supplier: supplier.into(),
            quantity: 10,
            warehouse: "Naples - RR".into(),
            item_name: "Excelsa".into(),
            schedule_date: "2024-07-01".into(),
            schedule_month: 7,
        }
    }

    fn summing(names: &[&str]) -> Fixed {
        Fixed(Arc::new(Summing {
            names: names.iter().map(|s| s.to_string()).collect(),
        }))
    }

    #[test]
    fn test_score_uses_model_order() {
        let loader = summing(&["d_sup_Aromatico", "total_qty", "schedule_month"]);
        let resp = score(&loader, &req("Aromatico")).unwrap();
        assert_eq!(resp.prediction, 18.0);
        assert_eq!(resp.status_code, 200);
        assert_eq!(
            resp.message,
            "Model scored successfully with quantity: 10, supplier: Aromatico, warehouse: Naples - RR, item_name: Excelsa, and schedule_date: 2024-07-01."
        );
    }

    #[test]
    fn test_score_unknown_supplier_still_predicts() {
        let loader = summing(&["d_sup_Aromatico", "d_wh_Naples - RR", "d_item_Excelsa"]);
        let resp = score(&loader, &req("Unknown Co")).unwrap();
        assert_eq!(resp.prediction, 2.0);
    }

    #[test]
    fn test_score_schema_mismatch() {
        let loader = summing(&["total_qty", "d_item_Kopi Luwak"]);
        let err = score(&loader, &req("Aromatico")).unwrap_err();
        assert!(matches!(err, ScoreError::SchemaMismatch(ref cols) if cols == &["d_item_Kopi Luwak"]));
    }
}
