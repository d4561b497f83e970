use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use swap_core::session::SessionContext;
use swap_core::{ApiResponse, CoreError, CoreResult};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::app_config::ApiConfig;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Thin wrapper over `reqwest` for the booking backend's `{ success, message, data }` envelope.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: SessionContext) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CoreError::ConfigError(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request_id = Uuid::new_v4();
        debug!("{} {}{} [{}]", method, self.base_url, path, request_id);

        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header(REQUEST_ID_HEADER, request_id.to_string());

        match self.session.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode the envelope. Non-2xx statuses become `ServerError`
    /// carrying the envelope message when there is one.
    pub async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> CoreResult<ApiResponse<T>> {
        let response = builder.send().await.map_err(|e| CoreError::NetworkError(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| CoreError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiResponse<serde_json::Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.message().map(str::to_string))
                .unwrap_or_default();
            warn!("Backend responded {}: {}", status, message);
            return Err(CoreError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| CoreError::DecodeError(e.to_string()))
    }

    /// GET returning the envelope's `data`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> CoreResult<T> {
        let envelope = self.send(self.request(Method::GET, path).query(query)).await?;
        unwrap_data(envelope)
    }
}

/// `success: false` on a 2xx is still a failure for plain reads.
pub fn unwrap_data<T>(envelope: ApiResponse<T>) -> CoreResult<T> {
    if !envelope.success {
        return Err(CoreError::ServerError {
            status: 200,
            message: envelope.message().unwrap_or_default().to_string(),
        });
    }
    envelope
        .data
        .ok_or_else(|| CoreError::DecodeError("response envelope has no data".to_string()))
}
