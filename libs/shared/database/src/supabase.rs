use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

use crate::error::{SupabaseError, UNIQUE_VIOLATION_SQLSTATE};

/// Thin PostgREST client. Every call is a single HTTP round trip, so each
/// write is exactly one statement on the database side.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", header_value(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let bearer = auth_token.unwrap_or(&self.anon_key);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", bearer))?);

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T, SupabaseError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         auth_token: Option<&str>, body: Option<Value>,
                                         extra_headers: Option<HeaderMap>)
                                         -> Result<T, SupabaseError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(classify_error(status, error_text));
        }

        let body = response.text().await?;
        let data = serde_json::from_str::<T>(&body)?;
        Ok(data)
    }

    /// Insert a row and return its stored representation.
    pub async fn insert_returning<T>(&self, table: &str, row: Value) -> Result<Vec<T>, SupabaseError>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/{}", table);
        self.request_with_headers(
            Method::POST,
            &path,
            None,
            Some(row),
            Some(return_representation()),
        ).await
    }

    /// PATCH rows matching `filter` and return the rows that were changed.
    pub async fn update_returning<T>(&self, table: &str, filter: &str, patch: Value)
                                     -> Result<Vec<T>, SupabaseError>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/{}?{}", table, filter);
        self.request_with_headers(
            Method::PATCH,
            &path,
            None,
            Some(patch),
            Some(return_representation()),
        ).await
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, SupabaseError> {
    HeaderValue::from_str(raw).map_err(|e| SupabaseError::Header(e.to_string()))
}

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

/// Map a PostgREST failure onto the error taxonomy. A 409 carrying SQLSTATE
/// 23505 is the only thing treated as a uniqueness conflict.
pub fn classify_error(status: StatusCode, error_text: String) -> SupabaseError {
    let sqlstate = serde_json::from_str::<Value>(&error_text)
        .ok()
        .and_then(|body| body.get("code").and_then(|c| c.as_str()).map(str::to_owned));

    match status.as_u16() {
        409 if sqlstate.as_deref() == Some(UNIQUE_VIOLATION_SQLSTATE) => {
            warn!("Unique constraint rejected write: {}", error_text);
            SupabaseError::UniqueViolation(error_text)
        }
        401 | 403 => {
            error!("API auth error ({}): {}", status, error_text);
            SupabaseError::Auth(error_text)
        }
        404 => SupabaseError::NotFound(error_text),
        _ => {
            error!("API error ({}): {}", status, error_text);
            SupabaseError::Api { status: status.as_u16(), message: error_text }
        }
    }
}
