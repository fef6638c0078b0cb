//! Common types used across the service

use serde::{Deserialize, Serialize};

use crate::models::VariantStock;

/// Uniform response envelope: `{success, message, data}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    /// A response that carries data but reports `success: false`
    pub fn unsuccessful(message: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            message: message.into(),
            data,
        }
    }
}

/// Envelope for per-variant stock, which also reports the imported total
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantStockResponse {
    #[serde(flatten)]
    pub envelope: ApiResponse<Vec<VariantStock>>,
    pub total_quantity: i64,
}

/// Output format for report endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}
