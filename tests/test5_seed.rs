use serde_json::json;

use clubhouse::args::validation::validate_json_format;
use clubhouse::backend::MemoryBackend;
use clubhouse::model::{PLAYERS_COLLECTION, SCORES_COLLECTION, USERS_COLLECTION};
use clubhouse::mvu::page::Msg;
use clubhouse::seed::{self, SeedError, SeedSummary};
use clubhouse::view::dom::ids;

mod common;
use common::{ALICE, PASSWORD, TestBackend};

#[test]
fn seed_file_passes_format_check() -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::from_str(include_str!("test5_seed.json"))?;
    validate_json_format(&json)?;
    Ok(())
}

#[test]
fn prefill_loads_every_collection() -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::from_str(include_str!("test5_seed.json"))?;
    let backend = MemoryBackend::new();

    let summary = seed::prefill(&json, &backend)?;

    assert_eq!(
        summary,
        SeedSummary {
            accounts: 1,
            scores: 3,
            players: 1
        }
    );
    let store = backend.memory_store();
    assert_eq!(store.count(USERS_COLLECTION), 1);
    assert_eq!(store.count(SCORES_COLLECTION), 3);
    assert_eq!(store.count(PLAYERS_COLLECTION), 1);
    Ok(())
}

#[test]
fn duplicate_account_fails_the_seed() {
    let json = json!({ "accounts": [
        { "name": "A", "email": "a@b.c", "password": "secret1" },
        { "name": "A again", "email": "a@b.c", "password": "secret2" }
    ]});
    let err = seed::prefill(&json, &MemoryBackend::new()).unwrap_err();
    assert!(matches!(err, SeedError::Account { ref email, .. } if email == "a@b.c"));
}

#[tokio::test]
async fn seeded_account_sees_seeded_leaderboard() -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::from_str(include_str!("test5_seed.json"))?;
    let backend = TestBackend::new();
    seed::prefill(&json, &backend.memory)?;

    let mut client = backend.client().await;
    client
        .dispatch(Msg::SignInSubmitted {
            email: ALICE.into(),
            password: PASSWORD.into(),
        })
        .await;

    let body = client.model.doc.inner_html(ids::LEADERBOARD_BODY);
    let bob = body.find("Bob").expect("Bob's row");
    let alice = body.find("Alice").expect("Alice's row");
    assert!(bob < alice);
    assert!(client.model.doc.inner_html(ids::ACTIVE_PLAYERS_LIST).contains("Handicap +5"));
    Ok(())
}
