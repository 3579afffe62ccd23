//! Club record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A club as stored in the `clubs` collection.
///
/// The document ID is injected as `id` when read back; every other field
/// is owned by the remote store and never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Club {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Category key (see [`ClubCategory`]); kept as stored
    pub category: String,
    /// ID of the club organizer/president
    pub organizer_id: String,
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    /// Website or social media link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Meeting location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// e.g. "Every Wednesday 6PM"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u32>,
    /// Member UIDs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    // Extended contact information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// City and state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campus_office: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uw_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_advisor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_campus_advisor: Option<String>,
    /// National/local affiliation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wechat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
}

impl Club {
    /// Human-readable category label.
    pub fn category_label(&self) -> String {
        format_club_category(&self.category)
    }
}

/// Known club categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClubCategory {
    Academic,
    Sports,
    Arts,
    Technology,
    Volunteering,
    Cultural,
    Professional,
    Social,
    Other,
}

impl ClubCategory {
    pub const ALL: [ClubCategory; 9] = [
        ClubCategory::Academic,
        ClubCategory::Sports,
        ClubCategory::Arts,
        ClubCategory::Technology,
        ClubCategory::Volunteering,
        ClubCategory::Cultural,
        ClubCategory::Professional,
        ClubCategory::Social,
        ClubCategory::Other,
    ];

    /// Stored key, e.g. `"ACADEMIC"`.
    pub fn key(self) -> &'static str {
        match self {
            ClubCategory::Academic => "ACADEMIC",
            ClubCategory::Sports => "SPORTS",
            ClubCategory::Arts => "ARTS",
            ClubCategory::Technology => "TECHNOLOGY",
            ClubCategory::Volunteering => "VOLUNTEERING",
            ClubCategory::Cultural => "CULTURAL",
            ClubCategory::Professional => "PROFESSIONAL",
            ClubCategory::Social => "SOCIAL",
            ClubCategory::Other => "OTHER",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ClubCategory::Academic => "Academic",
            ClubCategory::Sports => "Sports",
            ClubCategory::Arts => "Arts & Culture",
            ClubCategory::Technology => "Technology",
            ClubCategory::Volunteering => "Volunteering",
            ClubCategory::Cultural => "Cultural",
            ClubCategory::Professional => "Professional",
            ClubCategory::Social => "Social",
            ClubCategory::Other => "Other",
        }
    }
}

impl FromStr for ClubCategory {
    type Err = UnknownCategory;

    /// Case-insensitive parse of a stored category key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        ClubCategory::ALL
            .into_iter()
            .find(|c| c.key() == upper)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown club category: {0}")]
pub struct UnknownCategory(pub String);

/// Format a stored category for display; unknown categories pass through.
pub fn format_club_category(category: &str) -> String {
    category
        .parse::<ClubCategory>()
        .map(|c| c.label().to_string())
        .unwrap_or_else(|_| category.to_string())
}
