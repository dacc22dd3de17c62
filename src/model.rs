pub mod player;
pub mod score;
pub mod session;

pub use player::{HandicapSign, NewPlayer, PlayerRecord, format_handicap};
pub use score::{NewScore, ScoreRecord};
pub use session::{Credentials, Session};

pub const USERS_COLLECTION: &str = "users";
pub const SCORES_COLLECTION: &str = "scores";
pub const PLAYERS_COLLECTION: &str = "players";

/// Field every collection carries; stamped by the store at write time.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Profile document written under `users/{uid}` right after sign-up.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(rename = "createdAt", default, skip_serializing)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
