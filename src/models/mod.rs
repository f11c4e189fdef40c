// Domain records and wire types for the Away Days API.
// Column names and JSON field names follow the persisted camelCase layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Declined,
    Blocked,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Declined => "declined",
            FriendshipStatus::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(FriendshipStatus::Pending),
            "accepted" => Some(FriendshipStatus::Accepted),
            "declined" => Some(FriendshipStatus::Declined),
            "blocked" => Some(FriendshipStatus::Blocked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: String,
    pub requester_id: String,
    pub addressee_id: String,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Photo => "photo",
            MediaType::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(MediaType::Photo),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub match_date: DateTime<Utc>,
    pub competition: String,
    pub venue: Option<String>,
    pub season: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchingExperience {
    pub id: String,
    pub user_id: String,
    pub match_id: Option<String>,
    pub custom_match_description: Option<String>,
    pub watching_location: String,
    pub location_details: Option<String>,
    pub rating: i64,
    pub review: Option<String>,
    pub watched_at: DateTime<Utc>,
    pub is_public: bool,
    pub ai_categorized_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceMedia {
    pub id: String,
    pub experience_id: String,
    pub media_type: MediaType,
    pub media_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Media fields exposed inside feed and profile listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaView {
    pub id: String,
    pub media_type: MediaType,
    pub media_url: String,
    pub caption: Option<String>,
}

/// An experience row joined with its (optional) match, as returned by the
/// profile listing. Match fields are null when no match is linked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceView {
    pub id: String,
    pub match_id: Option<String>,
    pub custom_match_description: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub competition: Option<String>,
    pub venue: Option<String>,
    pub watching_location: String,
    pub location_details: Option<String>,
    pub rating: i64,
    pub review: Option<String>,
    pub watched_at: DateTime<Utc>,
    pub ai_categorized_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub media: Vec<MediaView>,
}

/// A feed row: an experience joined with match and author details.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub id: String,
    pub user_id: String,
    pub match_id: Option<String>,
    pub custom_match_description: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub competition: Option<String>,
    pub venue: Option<String>,
    pub watching_location: String,
    pub location_details: Option<String>,
    pub rating: i64,
    pub review: Option<String>,
    pub watched_at: DateTime<Utc>,
    pub ai_categorized_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_image: Option<String>,
    pub media: Vec<MediaView>,
}

/// One entry in the friends listing: the other user's identity plus the
/// state of the relationship as seen from the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendEntry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub status: FriendshipStatus,
    pub is_requester: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_experiences: usize,
    pub average_rating: f64,
    pub favorite_location: Option<String>,
}

/// Request body shared by experience creation and update. Creation enforces
/// the required fields; update treats everything as optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceInput {
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub home_score: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub away_score: Option<i64>,
    pub match_date: Option<String>,
    pub competition: Option<String>,
    pub venue: Option<String>,
    pub watching_location: Option<String>,
    pub location_details: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub custom_match_description: Option<String>,
}

/// Score and rating fields arrive from form-backed clients as either JSON
/// numbers or numeric strings; accept both.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(i64),
        String(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experience_input_accepts_numeric_strings() {
        let input: ExperienceInput =
            serde_json::from_str(r#"{"homeScore": "2", "awayScore": 1, "rating": "4"}"#).unwrap();
        assert_eq!(input.home_score, Some(2));
        assert_eq!(input.away_score, Some(1));
        assert_eq!(input.rating, Some(4));
    }

    #[test]
    fn experience_input_treats_empty_score_as_absent() {
        let input: ExperienceInput = serde_json::from_str(r#"{"homeScore": ""}"#).unwrap();
        assert_eq!(input.home_score, None);
    }

    #[test]
    fn friendship_status_round_trips() {
        for status in [
            FriendshipStatus::Pending,
            FriendshipStatus::Accepted,
            FriendshipStatus::Declined,
            FriendshipStatus::Blocked,
        ] {
            assert_eq!(FriendshipStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(FriendshipStatus::parse("cancelled"), None);
    }
}
