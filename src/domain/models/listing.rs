use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Listing {
    pub id: String,
    pub host_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn new(host_id: String, title: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            host_id,
            title,
            created_at: Utc::now(),
        }
    }
}
