//! Credential exchange
//!
//! The provider block (with environment fallbacks) yields a long-lived
//! integration token. It is traded once, at configure time, for a short-lived
//! API token. The resulting [`ApiSession`] is never refreshed.

use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::Context;
use thiserror::Error;
use url::Url;

pub const DEFAULT_INTEGRATION_URL: &str =
    "https://integrations.gitbook.com/v1/integrations/terraform/integration";
pub const DEFAULT_API_BASE_URL: &str = "https://api.gitbook.com";

pub const ENV_API_BASE_URL: &str = "GITBOOK_API_BASE_URL";
pub const ENV_INTEGRATION_URL: &str = "GITBOOK_INTEGRATION_URL";
pub const ENV_ACCESS_TOKEN: &str = "GITBOOK_ACCESS_TOKEN";

pub fn user_agent(version: &str) -> String {
    format!("terraform-provider-gitbook/{}", version)
}

/// Provider settings after merging the provider block over the environment
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    /// Empty means the public API at [`DEFAULT_API_BASE_URL`]
    pub api_base_url: String,
    pub integration_url: String,
    pub access_token: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_base_url", &self.api_base_url)
            .field("integration_url", &self.integration_url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl ProviderConfig {
    /// Resolves the provider block against environment defaults.
    ///
    /// Every problem is reported before any network call is made.
    pub fn resolve(
        config: &DynamicValue,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();

        for (attribute, what, variable) in [
            ("base_url", "GitBook API base URL", ENV_API_BASE_URL),
            ("integration_url", "GitBook integration URL", ENV_INTEGRATION_URL),
            (
                "access_token",
                "GitBook Terraform integration access token",
                ENV_ACCESS_TOKEN,
            ),
        ] {
            let path = AttributePath::new(attribute);
            if config.is_unknown_at(&path) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Unknown {}", what),
                        format!(
                            "The provider cannot construct a GitBook API client as there is an unknown configuration value for the {}. \
                             Either target apply the source of the value first, set the value statically in the configuration, or use the {} environment variable.",
                            what, variable
                        ),
                    )
                    .with_attribute(path),
                );
            }
        }
        if !diagnostics.is_empty() {
            return Err(diagnostics);
        }

        let api_base_url = configured(config, "base_url")
            .or_else(|| env(ENV_API_BASE_URL))
            .unwrap_or_default();
        let integration_url = configured(config, "integration_url")
            .or_else(|| env(ENV_INTEGRATION_URL).filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_INTEGRATION_URL.to_string());
        let access_token = configured(config, "access_token")
            .or_else(|| env(ENV_ACCESS_TOKEN))
            .unwrap_or_default();

        if access_token.is_empty() {
            return Err(vec![Diagnostic::error(
                "Missing GitBook Terraform integration access token",
                format!(
                    "The provider cannot construct a GitBook API client as there is a missing or empty value for the GitBook Terraform integration access token. \
                     Set an `access_token` value in the configuration or use the {} environment variable. \
                     If either is already set, ensure the value is not empty.",
                    ENV_ACCESS_TOKEN
                ),
            )
            .with_attribute(AttributePath::new("access_token"))]);
        }

        Ok(Self {
            api_base_url,
            integration_url,
            access_token,
        })
    }
}

/// A configured string attribute; null and absent both mean "not set"
fn configured(config: &DynamicValue, attribute: &str) -> Option<String> {
    config
        .get(&AttributePath::new(attribute))
        .and_then(Dynamic::as_str)
        .map(str::to_string)
}

/// Everything the API client needs, fixed for the rest of the run
#[derive(Clone, PartialEq)]
pub struct ApiSession {
    pub bearer_token: String,
    pub base_url: String,
    pub user_agent: String,
}

impl fmt::Debug for ApiSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSession")
            .field("bearer_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid integration access token used")]
    InvalidAccessToken,

    #[error("Unable to obtain short-lived GitBook API access token: {0}")]
    UnexpectedStatus(StatusCode),

    #[error("Invalid integration URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse token response: {0}")]
    Parse(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl AuthError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            AuthError::InvalidAccessToken => Diagnostic::error(
                "Invalid integration access token used",
                "The provided GitBook Terraform integration access token is invalid. \
                 Visit the Terraform integration configuration on gitbook.com to obtain an access token.",
            ),
            AuthError::UnexpectedStatus(status) => Diagnostic::error(
                "Unable to obtain short-lived GitBook API access token",
                format!(
                    "An unexpected HTTP response was received when obtaining a short-lived GitBook API access token. \
                     If the error is not clear, please contact GitBook support.\n\n\
                     GitBook Terraform integration HTTP response status: {}",
                    status
                ),
            ),
            AuthError::InvalidUrl(e) => Diagnostic::error(
                "Unable to create HTTP request to obtain GitBook API access token",
                format!(
                    "An unexpected error occurred when constructing an HTTP request to obtain a short-lived GitBook API access token. \
                     If the error is not clear, please contact GitBook support.\n\n\
                     GitBook Terraform integration HTTP error: {}",
                    e
                ),
            ),
            AuthError::Request(e) => Diagnostic::error(
                "Unable to obtain short-lived GitBook API access token",
                format!(
                    "An unexpected error occurred when obtaining a short-lived GitBook API access token. \
                     If the error is not clear, please contact GitBook support.\n\n\
                     GitBook Terraform integration HTTP error: {}",
                    e
                ),
            ),
            AuthError::Parse(e) => Diagnostic::error(
                "Unable to parse token response from Terraform integration",
                format!(
                    "An unexpected error occurred parsing the HTTP response data from the Terraform integration. \
                     If the error persists, please contact GitBook support.\n\n\
                     Parsing error: {}",
                    e
                ),
            ),
            AuthError::Cancelled => Diagnostic::error(
                "Unable to obtain short-lived GitBook API access token",
                "The request was cancelled before the token exchange completed.",
            ),
        }
    }
}

#[derive(Deserialize)]
struct TokenEnvelope {
    token: String,
}

/// Trades the integration token for a short-lived API token.
///
/// One `GET` to the integration URL, no retries.
pub async fn exchange_token(
    ctx: &Context,
    config: &ProviderConfig,
    user_agent: &str,
) -> Result<ApiSession, AuthError> {
    let url = Url::parse(&config.integration_url)
        .map_err(|e| AuthError::InvalidUrl(format!("{}: {}", config.integration_url, e)))?;

    let http_client = reqwest::Client::builder().user_agent(user_agent).build()?;
    tracing::debug!("Exchanging integration token at: {}", url);

    let exchange = async {
        let response = http_client
            .get(url)
            .bearer_auth(&config.access_token)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok::<_, reqwest::Error>((status, body))
    };

    let (status, body) = tokio::select! {
        biased;
        _ = ctx.cancelled() => return Err(AuthError::Cancelled),
        result = exchange => result?,
    };

    if status == StatusCode::FORBIDDEN {
        tracing::warn!("Integration token rejected");
        return Err(AuthError::InvalidAccessToken);
    }
    if status != StatusCode::OK {
        tracing::warn!("Token exchange returned HTTP {}", status.as_u16());
        return Err(AuthError::UnexpectedStatus(status));
    }

    let envelope: TokenEnvelope =
        serde_json::from_str(&body).map_err(|e| AuthError::Parse(e.to_string()))?;

    let base_url = if config.api_base_url.is_empty() {
        DEFAULT_API_BASE_URL.to_string()
    } else {
        config.api_base_url.clone()
    };
    tracing::debug!("Obtained short-lived API token for {}", base_url);

    Ok(ApiSession {
        bearer_token: envelope.token,
        base_url,
        user_agent: user_agent.to_string(),
    })
}
