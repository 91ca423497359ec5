//! Space API implementation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tfplug::Context;

use super::{ApiError, Client};

/// A space as returned by `GET /v1/spaces/{id}`
///
/// `type` and `visibility` stay strings here so a value added server-side
/// does not break reads; requests use the typed enums below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: String,
    #[serde(rename = "type")]
    pub space_type: String,
    pub title: String,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub urls: SpaceUrls,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpaceUrls {
    pub location: String,
    pub app: String,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub public: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceType {
    Document,
    Collection,
}

impl SpaceType {
    pub const ALLOWED: [&'static str; 2] = ["document", "collection"];

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "document" => Some(Self::Document),
            "collection" => Some(Self::Collection),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Collection => "collection",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentVisibility {
    Public,
    Unlisted,
    ShareLink,
    VisitorAuth,
    InCollection,
    Private,
}

impl ContentVisibility {
    pub const ALLOWED: [&'static str; 6] = [
        "public",
        "unlisted",
        "share-link",
        "visitor-auth",
        "in-collection",
        "private",
    ];

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Self::Public),
            "unlisted" => Some(Self::Unlisted),
            "share-link" => Some(Self::ShareLink),
            "visitor-auth" => Some(Self::VisitorAuth),
            "in-collection" => Some(Self::InCollection),
            "private" => Some(Self::Private),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::ShareLink => "share-link",
            Self::VisitorAuth => "visitor-auth",
            Self::InCollection => "in-collection",
            Self::Private => "private",
        }
    }
}

/// Request body for `POST /v1/orgs/{organization}/spaces`
#[derive(Debug, Default, Serialize)]
pub struct CreateSpaceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub space_type: Option<SpaceType>,
}

/// Request body for `PATCH /v1/spaces/{id}`; only these fields are mutable
#[derive(Debug, Default, Serialize)]
pub struct UpdateSpaceRequest {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub space_type: Option<SpaceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<ContentVisibility>,
}

pub struct SpacesApi<'a> {
    client: &'a Client,
}

impl<'a> SpacesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, ctx: &Context, space_id: &str) -> Result<Space, ApiError> {
        self.client.get(ctx, &["spaces", space_id]).await
    }

    pub async fn create(
        &self,
        ctx: &Context,
        organization_id: &str,
        request: &CreateSpaceRequest,
    ) -> Result<Space, ApiError> {
        self.client
            .post(ctx, &["orgs", organization_id, "spaces"], request)
            .await
    }

    pub async fn update(
        &self,
        ctx: &Context,
        space_id: &str,
        request: &UpdateSpaceRequest,
    ) -> Result<Space, ApiError> {
        self.client.patch(ctx, &["spaces", space_id], request).await
    }
}
