//! Typed site-wide content blocks.
//!
//! Each block lives in one `site_content` row keyed by its `SiteContentKey`, with the
//! block body stored as JSONB. The body is decoded into the variant matching its key
//! both when an admin writes it and when it is read back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SiteContentKey {
    Hero,
    Greeting,
    Vision,
    WorshipTimes,
    Contact,
    History,
}

impl SiteContentKey {
    pub const ALL: [SiteContentKey; 6] = [
        SiteContentKey::Hero,
        SiteContentKey::Greeting,
        SiteContentKey::Vision,
        SiteContentKey::WorshipTimes,
        SiteContentKey::Contact,
        SiteContentKey::History,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SiteContentKey::Hero => "hero",
            SiteContentKey::Greeting => "greeting",
            SiteContentKey::Vision => "vision",
            SiteContentKey::WorshipTimes => "worship_times",
            SiteContentKey::Contact => "contact",
            SiteContentKey::History => "history",
        }
    }
}

impl fmt::Display for SiteContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteContentKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| AppError::invalid(format!("알 수 없는 콘텐츠 키입니다: {value}")))
    }
}

/// Main banner of the home page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct HeroContent {
    pub title: String,
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

/// Senior pastor's greeting on the about page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct GreetingContent {
    pub heading: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct VisionContent {
    pub statement: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct WorshipService {
    pub name: String,
    pub time: String,
    pub place: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct WorshipTimesContent {
    pub services: Vec<WorshipService>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct ContactContent {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct Milestone {
    pub year: i32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct HistoryContent {
    pub milestones: Vec<Milestone>,
}

/// SiteContentBody
///
/// One variant per content key. On the wire it is adjacently tagged:
/// `{ "key": "hero", "content": { "title": ..., "subtitle": ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "key", content = "content", rename_all = "snake_case")]
#[ts(export)]
pub enum SiteContentBody {
    Hero(HeroContent),
    Greeting(GreetingContent),
    Vision(VisionContent),
    WorshipTimes(WorshipTimesContent),
    Contact(ContactContent),
    History(HistoryContent),
}

impl SiteContentBody {
    pub fn key(&self) -> SiteContentKey {
        match self {
            SiteContentBody::Hero(_) => SiteContentKey::Hero,
            SiteContentBody::Greeting(_) => SiteContentKey::Greeting,
            SiteContentBody::Vision(_) => SiteContentKey::Vision,
            SiteContentBody::WorshipTimes(_) => SiteContentKey::WorshipTimes,
            SiteContentBody::Contact(_) => SiteContentKey::Contact,
            SiteContentBody::History(_) => SiteContentKey::History,
        }
    }

    /// Decodes a stored or submitted body against the shape its key requires.
    pub fn from_parts(key: SiteContentKey, content: Value) -> Result<Self, serde_json::Error> {
        Ok(match key {
            SiteContentKey::Hero => SiteContentBody::Hero(serde_json::from_value(content)?),
            SiteContentKey::Greeting => SiteContentBody::Greeting(serde_json::from_value(content)?),
            SiteContentKey::Vision => SiteContentBody::Vision(serde_json::from_value(content)?),
            SiteContentKey::WorshipTimes => {
                SiteContentBody::WorshipTimes(serde_json::from_value(content)?)
            }
            SiteContentKey::Contact => SiteContentBody::Contact(serde_json::from_value(content)?),
            SiteContentKey::History => SiteContentBody::History(serde_json::from_value(content)?),
        })
    }

    /// The JSONB column value: the variant's payload without the tag.
    pub fn content_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            SiteContentBody::Hero(c) => serde_json::to_value(c),
            SiteContentBody::Greeting(c) => serde_json::to_value(c),
            SiteContentBody::Vision(c) => serde_json::to_value(c),
            SiteContentBody::WorshipTimes(c) => serde_json::to_value(c),
            SiteContentBody::Contact(c) => serde_json::to_value(c),
            SiteContentBody::History(c) => serde_json::to_value(c),
        }
    }
}

/// SiteContent
///
/// A stored block as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteContent {
    #[serde(flatten)]
    pub body: SiteContentBody,
    pub updated_at: DateTime<Utc>,
}

/// SiteContentRow
///
/// Raw `site_content` row before decoding.
#[derive(Debug, sqlx::FromRow)]
pub struct SiteContentRow {
    pub key: String,
    pub content: sqlx::types::Json<Value>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SiteContentRow> for SiteContent {
    type Error = anyhow::Error;

    /// A row that no longer matches its variant is a data error, not a fallback case.
    fn try_from(row: SiteContentRow) -> Result<Self, Self::Error> {
        let key: SiteContentKey = row
            .key
            .parse()
            .map_err(|_| anyhow::anyhow!("unknown site content key in storage: {}", row.key))?;
        let body = SiteContentBody::from_parts(key, row.content.0)
            .map_err(|e| anyhow::anyhow!("malformed site content '{key}': {e}"))?;
        Ok(SiteContent {
            body,
            updated_at: row.updated_at,
        })
    }
}
