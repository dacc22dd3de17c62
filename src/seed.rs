use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::backend::{BackendError, MemoryBackend, NewDocument};
use crate::model::{
    CREATED_AT_FIELD, NewPlayer, NewScore, PLAYERS_COLLECTION, SCORES_COLLECTION,
    USERS_COLLECTION, UserProfile,
};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seed file has the wrong shape: {0}")]
    Format(#[from] serde_json::Error),
    #[error("seeding account {email}: {source}")]
    Account {
        email: String,
        #[source]
        source: BackendError,
    },
    #[error("encoding seed document: {0}")]
    Encode(#[source] BackendError),
}

#[derive(Deserialize, Debug)]
struct SeedAccount {
    name: String,
    email: String,
    password: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    #[serde(default)]
    accounts: Vec<SeedAccount>,
    #[serde(default)]
    scores: Vec<NewScore>,
    #[serde(default)]
    players: Vec<NewPlayer>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub accounts: usize,
    pub scores: usize,
    pub players: usize,
}

/// Loads accounts, scores and players into the in-memory backend.
///
/// format we expect is this:
/// { "accounts": [{"name": "..", "email": "..", "password": ".."}, ...]
/// , "scores": [{"player": "..", "course": "..", "score": <number>, "user": ".."}, ...]
/// , "players": [{"name": "..", "email": "..", "handicap": "..", "user": ".."}, ...]
/// }
///
/// Every key is optional. Scores and players are stamped with `createdAt` in
/// file order.
///
/// # Errors
///
/// Will return `Err` if the json doesn't match the format above or an
/// account can't be registered
pub fn prefill(json: &Value, backend: &MemoryBackend) -> Result<SeedSummary, SeedError> {
    let seed: SeedFile = serde_json::from_value(json.clone())?;
    let store = backend.memory_store();

    for account in &seed.accounts {
        let uid = backend
            .create_account(&account.email, &account.password)
            .map_err(|source| SeedError::Account {
                email: account.email.clone(),
                source,
            })?;
        let profile = UserProfile {
            name: account.name.clone(),
            email: account.email.clone(),
            created_at: None,
        };
        let doc = NewDocument::from_serializable(&profile).map_err(SeedError::Encode)?;
        store.set_unchecked(
            USERS_COLLECTION,
            &uid,
            doc.with_server_timestamp(CREATED_AT_FIELD),
        );
    }
    for score in &seed.scores {
        let doc = NewDocument::from_serializable(score).map_err(SeedError::Encode)?;
        store.insert_unchecked(SCORES_COLLECTION, doc.with_server_timestamp(CREATED_AT_FIELD));
    }
    for player in &seed.players {
        let doc = NewDocument::from_serializable(player).map_err(SeedError::Encode)?;
        store.insert_unchecked(PLAYERS_COLLECTION, doc.with_server_timestamp(CREATED_AT_FIELD));
    }

    let summary = SeedSummary {
        accounts: seed.accounts.len(),
        scores: seed.scores.len(),
        players: seed.players.len(),
    };
    info!(?summary, "seeded in-memory backend");
    Ok(summary)
}
