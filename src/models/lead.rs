use serde::{Deserialize, Serialize};

/// Lead model
///
/// A prospective customer tracked through the pipeline. `stage_id` is `None`
/// for unassigned leads, which never show up in a board column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub interest_value: Option<f64>, // BRL
    pub stage_id: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl Lead {
    /// Create a new, unassigned lead
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            phone: None,
            email: None,
            interest_value: None,
            stage_id: None,
            source: None,
            notes: None,
            created_ts: now,
            modified_ts: now,
        }
    }

    /// Create a lead with a caller-chosen id
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::new(name)
        }
    }

    pub fn in_stage(mut self, stage_id: impl Into<String>) -> Self {
        self.stage_id = Some(stage_id.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_interest_value(mut self, value: f64) -> Self {
        self.interest_value = Some(value);
        self
    }

    /// Whether the lead currently sits in the given stage
    pub fn is_in(&self, stage_id: &str) -> bool {
        self.stage_id.as_deref() == Some(stage_id)
    }
}
