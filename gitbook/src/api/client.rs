use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tfplug::Context;
use url::Url;

use super::error::ApiError;
use crate::auth::ApiSession;

/// GitBook API client
///
/// Built once from an [`ApiSession`] and never mutated afterwards. Clones share
/// the same connection pool and default headers.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: Url,
}

/// Error body returned by the GitBook API
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    message: String,
}

impl Client {
    pub fn new(session: &ApiSession) -> Result<Self, ApiError> {
        let base_url = Url::parse(&session.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", session.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(session.base_url.clone()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", session.bearer_token))
            .map_err(|_| ApiError::Config("API token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(session.user_agent.clone())
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
            }),
        })
    }

    /// Spaces API operations
    pub fn spaces(&self) -> super::spaces::SpacesApi<'_> {
        super::spaces::SpacesApi::new(self)
    }

    /// Entities API operations
    pub fn entities(&self) -> super::entities::EntitiesApi<'_> {
        super::entities::EntitiesApi::new(self)
    }

    /// Entity schemas API operations
    pub fn entity_schemas(&self) -> super::entity_schemas::EntitySchemasApi<'_> {
        super::entity_schemas::EntitySchemasApi::new(self)
    }

    /// Builds `<base>/v1/<segments...>`, percent-encoding each segment
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    /// Execute a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        segments: &[&str],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let body = self
            .execute(ctx, self.request(Method::GET, url))
            .await?;
        parse_body(&body)
    }

    /// Execute a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        ctx: &Context,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let body = self
            .execute(ctx, self.request(Method::POST, url).json(body))
            .await?;
        parse_body(&body)
    }

    /// Execute a PATCH request
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        ctx: &Context,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let body = self
            .execute(ctx, self.request(Method::PATCH, url).json(body))
            .await?;
        parse_body(&body)
    }

    /// Execute a PUT request whose response body is ignored
    pub async fn put<B: Serialize>(
        &self,
        ctx: &Context,
        segments: &[&str],
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(segments)?;
        self.execute(ctx, self.request(Method::PUT, url).json(body))
            .await
            .map(|_| ())
    }

    /// Execute a DELETE request
    pub async fn delete(&self, ctx: &Context, segments: &[&str]) -> Result<(), ApiError> {
        let url = self.endpoint(segments)?;
        self.execute(ctx, self.request(Method::DELETE, url))
            .await
            .map(|_| ())
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        tracing::debug!("{} request to: {}", method, url);
        self.inner.http_client.request(method, url)
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn execute(
        &self,
        ctx: &Context,
        request: reqwest::RequestBuilder,
    ) -> Result<String, ApiError> {
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        let (status, text) = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(ApiError::Cancelled),
            result = exchange => result?,
        };

        if status.is_success() {
            tracing::debug!("API response ({}): {} bytes", status, text.len());
            return Ok(text);
        }

        let message = error_message(&text).unwrap_or_else(|| status.to_string());
        tracing::warn!("API returned HTTP {}: {}", status.as_u16(), message);
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Extracts the message from an error body: the structured
/// `{"error":{"message":..}}` form when present, else the raw body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        return Some(parsed.error.message);
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!("Failed to deserialize response: {}", e);
        ApiError::Parse(e.to_string())
    })
}
