use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A named task state, e.g. "draft" or "in review". Tasks hold a required reference to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Status {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Status {
    pub fn new(input: StatusInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}
