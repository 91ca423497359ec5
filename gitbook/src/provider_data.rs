//! Provider data passed to resources and data sources

use crate::api::Client;
use std::any::Any;
use std::sync::Arc;
use tfplug::types::Diagnostic;

#[derive(Clone)]
pub struct GitBookProviderData {
    pub client: Arc<Client>,
}

impl GitBookProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

/// Which kind of handler is being configured; only changes the wording
#[derive(Debug, Clone, Copy)]
pub(crate) enum HandlerKind {
    Resource,
    DataSource,
}

/// Extracts [`GitBookProviderData`] from the host-supplied provider data.
///
/// Missing data is not an error here: operations report it when they run.
pub(crate) fn downcast_provider_data(
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
    kind: HandlerKind,
) -> Result<Option<GitBookProviderData>, Diagnostic> {
    let Some(data) = provider_data else {
        return Ok(None);
    };

    match data.downcast_ref::<GitBookProviderData>() {
        Some(provider_data) => Ok(Some(provider_data.clone())),
        None => {
            let summary = match kind {
                HandlerKind::Resource => "Unexpected Resource Configure Type",
                HandlerKind::DataSource => "Unexpected Data Source Configure Type",
            };
            Err(Diagnostic::error(
                summary,
                format!(
                    "Expected GitBookProviderData, got: {:?}. Please report this issue to GitBook.",
                    (*data).type_id()
                ),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ApiSession;

    fn provider_data() -> GitBookProviderData {
        GitBookProviderData::new(
            Client::new(&ApiSession {
                bearer_token: "t".to_string(),
                base_url: "https://api.gitbook.com".to_string(),
                user_agent: "ua".to_string(),
            })
            .unwrap(),
        )
    }

    #[test]
    fn downcast_shares_the_client() {
        let data = provider_data();
        let erased: Arc<dyn Any + Send + Sync> = Arc::new(data.clone());

        let extracted = downcast_provider_data(Some(erased), HandlerKind::Resource)
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&extracted.client, &data.client));
    }

    #[test]
    fn downcast_tolerates_missing_data() {
        assert!(downcast_provider_data(None, HandlerKind::DataSource)
            .unwrap()
            .is_none());
    }

    #[test]
    fn downcast_rejects_foreign_types() {
        let erased: Arc<dyn Any + Send + Sync> = Arc::new("not provider data");

        let diag = downcast_provider_data(Some(erased.clone()), HandlerKind::Resource)
            .err()
            .unwrap();
        assert_eq!(diag.summary, "Unexpected Resource Configure Type");
        assert!(diag.detail.ends_with("Please report this issue to GitBook."));

        let diag = downcast_provider_data(Some(erased), HandlerKind::DataSource)
            .err()
            .unwrap();
        assert_eq!(diag.summary, "Unexpected Data Source Configure Type");
    }
}
