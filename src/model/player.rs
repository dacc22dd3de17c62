use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entry in the "looking for a game" directory.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlayerRecord {
    pub name: String,
    pub email: String,
    /// Already formatted for display, e.g. `+5` or `12.4`.
    pub handicap: String,
    #[serde(rename = "user")]
    pub submitter_email: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NewPlayer {
    pub name: String,
    pub email: String,
    pub handicap: String,
    #[serde(rename = "user")]
    pub submitter_email: String,
}

/// State of the `+`/`-` selector next to the handicap input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandicapSign {
    Plus,
    Minus,
}

impl HandicapSign {
    /// Anything other than a literal `+` counts as not positive.
    #[must_use]
    pub fn from_selector(value: &str) -> Self {
        if value.trim() == "+" {
            Self::Plus
        } else {
            Self::Minus
        }
    }
}

/// A plus handicap gets an explicit `+`; everything else is shown as entered.
/// The minus selector does not negate the value.
#[must_use]
pub fn format_handicap(sign: HandicapSign, value: f64) -> String {
    // -0 prints as "0"
    let value = if value == 0.0 { 0.0 } else { value };
    match sign {
        HandicapSign::Plus => format!("+{value}"),
        HandicapSign::Minus => format!("{value}"),
    }
}
