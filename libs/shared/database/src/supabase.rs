use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Postgres `unique_violation`, surfaced by PostgREST in the error body.
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres `exclusion_violation`.
const EXCLUSION_VIOLATION: &str = "23P01";

#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api {
        status: u16,
        code: Option<String>,
        body: String,
    },

    #[error("Invalid header value for {0}")]
    Header(&'static str),
}

impl SupabaseError {
    /// True for uniqueness violations, however PostgREST chose to report them.
    pub fn is_conflict(&self) -> bool {
        match self {
            SupabaseError::Api { status, code, .. } => {
                *status == 409 || code.as_deref() == Some(UNIQUE_VIOLATION)
            }
            _ => false,
        }
    }

    pub fn is_exclusion_violation(&self) -> bool {
        matches!(self, SupabaseError::Api { code, .. } if code.as_deref() == Some(EXCLUSION_VIOLATION))
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.service_key).map_err(|_| SupabaseError::Header("apikey"))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.service_key))
                .map_err(|_| SupabaseError::Header("authorization"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            let code = serde_json::from_str::<Value>(&error_text)
                .ok()
                .and_then(|v| v.get("code").and_then(Value::as_str).map(str::to_string));

            return Err(SupabaseError::Api {
                status: status.as_u16(),
                code,
                body: error_text,
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Calls a Postgres function exposed by PostgREST. The function body runs
    /// in a single transaction.
    pub async fn rpc<T>(&self, function: &str, args: Value) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/rpc/{}", function);
        self.request(Method::POST, &path, Some(args)).await
    }
}

pub const RETURN_REPRESENTATION: &str = "return=representation";
pub const IGNORE_DUPLICATES: &str = "resolution=ignore-duplicates,return=representation";

/// Builds a PostgREST `Prefer` header.
pub fn prefer(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static(value));
    headers
}
