use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A round submitted to the leaderboard. Lower is better.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScoreRecord {
    pub player: String,
    pub course: String,
    pub score: f64,
    #[serde(rename = "user")]
    pub submitter_email: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of a score write; `createdAt` is left to the store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NewScore {
    pub player: String,
    pub course: String,
    pub score: f64,
    #[serde(rename = "user")]
    pub submitter_email: String,
}
