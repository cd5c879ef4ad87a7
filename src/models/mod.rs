use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Partition under which a blob is stored on disk and grouped in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Events,
    Projects,
    Blogs,
    Members,
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 4] = [
        MediaCategory::Events,
        MediaCategory::Projects,
        MediaCategory::Blogs,
        MediaCategory::Members,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Events => "events",
            MediaCategory::Projects => "projects",
            MediaCategory::Blogs => "blogs",
            MediaCategory::Members => "members",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Caller-declared asset kind. Not derived from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Reel,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Reel => "reel",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            "reel" => Ok(MediaType::Reel),
            other => Err(other.to_string()),
        }
    }
}

/// One record of the media index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub filename: String,
    pub original_name: String,
    pub size: u64,
    pub mime_type: String,
    pub category: MediaCategory,
    #[serde(serialize_with = "serialize_millis")]
    pub uploaded_at: DateTime<Utc>,
    pub url: String,
}

impl MediaItem {
    /// Public path under which the static file server exposes a blob.
    pub fn public_url(category: MediaCategory, filename: &str) -> String {
        format!("/media/{}/{}", category, filename)
    }
}

/// `uploadedAt` always carries exactly three fractional digits and a `Z`,
/// e.g. `2023-11-14T22:13:20.000Z`.
fn serialize_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
