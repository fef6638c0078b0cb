//! Stock movement models: document kinds, statuses and detail lines

use serde::{Deserialize, Serialize};

/// The three document types whose detail lines move stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Import,
    Export,
    Transfer,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Import => "import",
            MovementKind::Export => "export",
            MovementKind::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an import, export or transfer document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Pending,
    Prepared,
    Exported,
    Completed,
    Cancelled,
    Rejected,
    Returned,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "PENDING",
            DocumentStatus::Prepared => "PREPARED",
            DocumentStatus::Exported => "EXPORTED",
            DocumentStatus::Completed => "COMPLETED",
            DocumentStatus::Cancelled => "CANCELLED",
            DocumentStatus::Rejected => "REJECTED",
            DocumentStatus::Returned => "RETURNED",
        }
    }
}

/// One detail line of an import, export or transfer document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementLine {
    pub product_id: i64,
    /// Color id; 0 when the line was entered without one
    pub color: i64,
    pub color_title: String,
    pub size: Option<String>,
    /// Stored as a 32-bit integer so sums over many lines fit in `i64`
    pub quantity: i32,
}

impl MovementLine {
    pub fn new(
        product_id: i64,
        color: i64,
        color_title: impl Into<String>,
        size: Option<&str>,
        quantity: i32,
    ) -> Self {
        Self {
            product_id,
            color,
            color_title: color_title.into(),
            size: size.map(str::to_string),
            quantity,
        }
    }
}
