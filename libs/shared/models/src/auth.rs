use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ROLE_PATIENT: &str = "patient";
pub const ROLE_PROFESSIONAL: &str = "professional";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    /// True when the caller is the given subject or an admin acting for them.
    pub fn acts_for(&self, subject_id: &str) -> bool {
        self.id == subject_id || self.is_admin()
    }
}
