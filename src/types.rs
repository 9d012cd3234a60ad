use serde::{Deserialize, Serialize};

// Raw query parameters, exactly as sent. Validation decides what is missing.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ScoreParams {
    pub supplier: Option<String>,
    pub quantity: Option<String>,
    pub warehouse: Option<String>,
    pub item_name: Option<String>,
    pub schedule_date: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRequest {
    pub supplier: String,
    pub quantity: i64,
    pub warehouse: String,
    pub item_name: String,
    /// Kept verbatim for the response message.
    pub schedule_date: String,
    pub schedule_month: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ScoreResponse {
    pub message: String,
    pub prediction: f64,
    pub status_code: u16,
}

impl ScoreResponse {
    pub fn scored(req: &ScoreRequest, prediction: f64) -> Self {
        Self {
            message: format!(
                "Model scored successfully with quantity: {}, supplier: {}, warehouse: {}, item_name: {}, and schedule_date: {}.",
                req.quantity, req.supplier, req.warehouse, req.item_name, req.schedule_date
            ),
            prediction,
            status_code: 200,
        }
    }
}
