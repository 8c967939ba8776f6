use serde::{Deserialize, Serialize};

/// Pipeline stage model
/// A named column of the sales pipeline ("Novo", "Contato", ...) that a lead can occupy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub pipeline_id: Option<String>,
    pub name: String,
    pub position: i64,
    pub color: Option<String>, // named ANSI color ("blue") or "#rrggbb"
    pub created_ts: i64,
}

impl Stage {
    /// Create a new stage with a fresh id
    pub fn new(name: impl Into<String>, position: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pipeline_id: None,
            name: name.into(),
            position,
            color: None,
            created_ts: chrono::Utc::now().timestamp(),
        }
    }

    /// Create a stage with a caller-chosen id (fixtures, snapshots from other stores)
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, position: i64) -> Self {
        Self {
            id: id.into(),
            ..Self::new(name, position)
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}
