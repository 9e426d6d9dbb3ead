use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::{AppConfig, SchedulingConfig, StorageBackend};
use shared_models::auth::{User, ROLE_ADMIN, ROLE_PATIENT, ROLE_PROFESSIONAL};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointing at a mock PostgREST server.
    pub fn with_supabase_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            storage_backend: StorageBackend::Memory,
            server_port: 0,
            scheduling: SchedulingConfig::default(),
            seed_professionals: Vec::new(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", ROLE_PATIENT)
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    /// A user whose id is fixed, e.g. a professional already seeded in a store.
    pub fn with_id(id: Uuid, email: &str, role: &str) -> Self {
        Self {
            id: id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn professional(email: &str) -> Self {
        Self::new(email, ROLE_PROFESSIONAL)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, ROLE_PATIENT)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, ROLE_ADMIN)
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::parse_str(&self.id).expect("test user ids are uuids")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(user: &TestUser, secret: &str) -> String {
        format!("Bearer {}", Self::create_test_token(user, secret, Some(1)))
    }
}

/// Rows shaped like the PostgREST tables created by the scheduling migration.
pub struct PostgrestFixtures;

impl PostgrestFixtures {
    pub fn slot_row(id: Uuid, professional_id: Uuid, date: &str, start: &str, end: &str) -> serde_json::Value {
        json!({
            "id": id,
            "professional_id": professional_id,
            "slot_date": date,
            "start_time": start,
            "end_time": end,
            "created_at": "2025-06-01T08:00:00+00:00"
        })
    }

    pub fn professional_row(id: Uuid, consultation_fee: Option<f64>) -> serde_json::Value {
        json!({
            "id": id,
            "consultation_fee": consultation_fee
        })
    }

    pub fn appointment_row(id: Uuid, patient_id: Uuid, professional_id: Uuid, fee: f64) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "professional_id": professional_id,
            "scheduled_at": "2025-07-01T09:00:00",
            "status": "Confirmed",
            "appointment_type": "Consulta",
            "reason": "chequeo",
            "consultation_fee": fee,
            "created_at": "2025-06-01T08:00:00+00:00"
        })
    }

    pub fn billing_row(id: Uuid, appointment_id: Uuid, patient_id: Uuid, professional_id: Uuid, amount: f64) -> serde_json::Value {
        json!({
            "id": id,
            "appointment_id": appointment_id,
            "professional_id": professional_id,
            "patient_id": patient_id,
            "amount": amount,
            "payment_method": "Pending",
            "status": "Pending",
            "created_at": "2025-06-01T08:00:00+00:00"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code,
            "details": null,
            "hint": null
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_service_key, "test-service-key");
        assert_eq!(app_config.storage_backend, StorageBackend::Memory);
        assert!(!app_config.supabase_jwt_secret.is_empty());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::professional("pro@example.com");
        assert_eq!(user.role, "professional");

        let user_model = user.to_user();
        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.id, user.uuid().to_string());
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
    }
}
