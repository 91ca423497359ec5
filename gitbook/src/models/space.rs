use chrono::SecondsFormat;
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use super::optional_string;
use crate::api::spaces::{ContentVisibility, Space, SpaceType};

/// The configurable part of a `gitbook_space`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpaceModel {
    pub id: Option<String>,
    pub space_type: Option<String>,
    pub title: Option<String>,
    pub visibility: Option<String>,
    pub organization: Option<String>,
    pub parent: Option<String>,
}

impl SpaceModel {
    pub fn from_value(value: &DynamicValue) -> Result<Self, Diagnostic> {
        Ok(Self {
            id: optional_string(value, "id")?,
            space_type: optional_string(value, "type")?,
            title: optional_string(value, "title")?,
            visibility: optional_string(value, "visibility")?,
            organization: optional_string(value, "organization")?,
            parent: optional_string(value, "parent")?,
        })
    }

    /// `None` when unset or empty
    pub fn space_type(&self) -> Result<Option<SpaceType>, Diagnostic> {
        match self.space_type.as_deref() {
            None | Some("") => Ok(None),
            Some(value) => SpaceType::from_value(value).map(Some).ok_or_else(|| {
                Diagnostic::error(
                    "Invalid `type` attribute",
                    format!("Allowed values: {}", quoted(&SpaceType::ALLOWED)),
                )
                .with_attribute(AttributePath::new("type"))
            }),
        }
    }

    /// `None` when unset or empty
    pub fn visibility(&self) -> Result<Option<ContentVisibility>, Diagnostic> {
        match self.visibility.as_deref() {
            None | Some("") => Ok(None),
            Some(value) => ContentVisibility::from_value(value)
                .map(Some)
                .ok_or_else(|| {
                    Diagnostic::error(
                        "Invalid space visibility",
                        format!("Allowed values: {}", quoted(&ContentVisibility::ALLOWED)),
                    )
                    .with_attribute(AttributePath::new("visibility"))
                }),
        }
    }
}

fn quoted(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("{:?}", v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Full state for a space; every attribute comes from the API response.
pub fn space_state(space: &Space) -> DynamicValue {
    DynamicValue::new(Dynamic::object([
        ("id", Dynamic::from(space.id.as_str())),
        ("type", Dynamic::from(space.space_type.as_str())),
        ("title", Dynamic::from(space.title.as_str())),
        ("visibility", Dynamic::from(space.visibility.as_str())),
        (
            "created_at",
            Dynamic::from(space.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        ),
        (
            "updated_at",
            Dynamic::from(space.updated_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        ),
        (
            "urls",
            Dynamic::object([
                ("location", Dynamic::from(space.urls.location.as_str())),
                ("app", Dynamic::from(space.urls.app.as_str())),
                ("published", Dynamic::string_or_null(space.urls.published.clone())),
                ("public", Dynamic::string_or_null(space.urls.public.clone())),
            ]),
        ),
        ("organization", Dynamic::string_or_null(space.organization.clone())),
        ("parent", Dynamic::string_or_null(space.parent.clone())),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::spaces::SpaceUrls;
    use chrono::{TimeZone, Utc};

    fn space() -> Space {
        Space {
            id: "space-1".to_string(),
            space_type: "document".to_string(),
            title: "Handbook".to_string(),
            visibility: "private".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 3, 2, 11, 30, 0).unwrap(),
            urls: SpaceUrls {
                location: "https://api.gitbook.com/v1/spaces/space-1".to_string(),
                app: "https://app.gitbook.com/s/space-1".to_string(),
                published: None,
                public: Some("https://docs.example.com".to_string()),
            },
            organization: Some("org-1".to_string()),
            parent: None,
        }
    }

    #[test]
    fn state_reflects_the_api_space() {
        let state = space_state(&space());

        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "space-1");
        assert_eq!(
            state.get_string(&AttributePath::new("created_at")).unwrap(),
            "2024-03-01T10:00:00Z"
        );
        let urls = AttributePath::new("urls");
        assert_eq!(
            state.get(&urls.clone().attribute("published")),
            Some(&Dynamic::Null)
        );
        assert_eq!(
            state
                .get_string(&urls.attribute("public"))
                .unwrap(),
            "https://docs.example.com"
        );
        assert_eq!(
            state.get(&AttributePath::new("parent")),
            Some(&Dynamic::Null)
        );
    }

    #[test]
    fn empty_enums_are_unset() {
        let model = SpaceModel {
            space_type: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(model.space_type().unwrap(), None);
        assert_eq!(model.visibility().unwrap(), None);
    }

    #[test]
    fn invalid_enums_list_allowed_values() {
        let model = SpaceModel {
            space_type: Some("wiki".to_string()),
            visibility: Some("secret".to_string()),
            ..Default::default()
        };

        let diag = model.space_type().unwrap_err();
        assert_eq!(diag.summary, "Invalid `type` attribute");
        assert_eq!(diag.detail, r#"Allowed values: "document", "collection""#);

        let diag = model.visibility().unwrap_err();
        assert_eq!(diag.summary, "Invalid space visibility");
        assert!(diag.detail.contains(r#""visitor-auth""#));
    }

    #[test]
    fn model_reads_optional_attributes() {
        let value = DynamicValue::new(Dynamic::object([
            ("title", Dynamic::from("Handbook")),
            ("organization", Dynamic::from("org-1")),
            ("visibility", Dynamic::Unknown),
            ("parent", Dynamic::Null),
        ]));
        let model = SpaceModel::from_value(&value).unwrap();
        assert_eq!(model.title.as_deref(), Some("Handbook"));
        assert_eq!(model.organization.as_deref(), Some("org-1"));
        assert_eq!(model.visibility, None);
        assert_eq!(model.id, None);
    }
}
