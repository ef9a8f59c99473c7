use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A named tag; many-to-many with tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Label {
    pub fn new(input: LabelInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LabelInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}
