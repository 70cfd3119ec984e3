use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pii::Masked;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub name: String,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_digest: String, name: String, is_admin: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_digest,
            name,
            address: None,
            postal_code: None,
            is_admin,
            created_at: Utc::now(),
        }
    }
}

/// Self-registration input
#[derive(Debug, Clone, Deserialize)]
pub struct UserDraft {
    pub email: String,
    pub password: Masked<String>,
    pub name: String,
    pub address: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    /// Left unchanged when absent
    pub password: Option<Masked<String>>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
}
