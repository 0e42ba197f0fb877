//! Contact-form lead model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A captured lead. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub created: DateTime<Utc>,
}

/// Validated input for recording a lead.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl NewLead {
    /// Stamp an id and creation time.
    pub fn into_lead(self) -> Lead {
        Lead {
            id: Uuid::now_v7(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            message: self.message,
            created: Utc::now(),
        }
    }
}
