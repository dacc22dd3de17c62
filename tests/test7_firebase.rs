use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use serde_json::{Value, json};
use std::net::TcpListener;
use std::sync::Mutex;

use clubhouse::PageClient;
use clubhouse::auth::SessionState;
use clubhouse::backend::{Backend, FirebaseBackend, FirebaseConfig};
use clubhouse::model::Credentials;
use clubhouse::mvu::page::Msg;
use clubhouse::view::dom::Document;
use clubhouse::view::leaderboard::fetch_scores;

const ALICE: &str = "alice@example.com";

/// Canned Identity Toolkit, securetoken and Firestore replies.
struct FakeFirebase {
    calls: Mutex<Vec<String>>,
    expires_in: &'static str,
    fail_commit: bool,
    run_query: Value,
}

impl FakeFirebase {
    fn new(expires_in: &'static str) -> Self {
        Self {
            calls: Mutex::new(vec![]),
            expires_in,
            fail_commit: false,
            run_query: json!([{ "readTime": "2026-10-01T12:00:00Z" }]),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

async fn reply(req: HttpRequest, fake: web::Data<FakeFirebase>) -> HttpResponse {
    let path = req.path().to_string();
    fake.calls.lock().unwrap().push(path.clone());

    if path.ends_with("accounts:signInWithPassword") || path.ends_with("accounts:signUp") {
        HttpResponse::Ok().json(json!({
            "localId": "uid-alice",
            "email": ALICE,
            "idToken": "id-token",
            "refreshToken": "refresh-token",
            "expiresIn": fake.expires_in,
        }))
    } else if path.ends_with("accounts:delete") {
        HttpResponse::Ok().json(json!({}))
    } else if path.ends_with("/token") {
        HttpResponse::BadRequest().json(json!({ "error": { "message": "TOKEN_EXPIRED" } }))
    } else if path.ends_with(":commit") {
        if fake.fail_commit {
            HttpResponse::InternalServerError().json(json!({ "error": { "message": "INTERNAL" } }))
        } else {
            HttpResponse::Ok().json(json!({ "writeResults": [] }))
        }
    } else if path.ends_with(":runQuery") {
        HttpResponse::Ok().json(&fake.run_query)
    } else {
        HttpResponse::NotFound().finish()
    }
}

type Started = (FirebaseBackend, web::Data<FakeFirebase>);

/// Starts the fake on a free port and returns a backend pointed at it.
fn start(fake: FakeFirebase) -> Result<Started, Box<dyn std::error::Error>> {
    let fake = web::Data::new(fake);
    let data = fake.clone();
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let base = format!("http://{}", listener.local_addr()?);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .default_service(web::to(reply))
    })
    .workers(1)
    .disable_signals()
    .listen(listener)?
    .run();
    actix_web::rt::spawn(server);

    let mut config = FirebaseConfig::new("test-key", "clubhouse-test");
    config.identity_base = format!("{base}/identity");
    config.secure_token_base = format!("{base}/securetoken");
    config.firestore_base = format!("{base}/firestore");
    Ok((FirebaseBackend::new(config), fake))
}

async fn client(backend: &FirebaseBackend) -> PageClient {
    PageClient::new(backend.new_identity(), backend.store(), Document::default()).await
}

#[actix_web::test]
async fn rejected_token_refresh_signs_the_page_out() -> Result<(), Box<dyn std::error::Error>> {
    // expires inside the refresh margin, so the next event refreshes
    let (backend, fake) = start(FakeFirebase::new("30"))?;
    let mut client = client(&backend).await;

    client
        .dispatch(Msg::SignInSubmitted {
            email: ALICE.into(),
            password: "hunter22".into(),
        })
        .await;
    assert_eq!(client.model.auth.state(), SessionState::SignedIn(ALICE.into()));

    client.sync().await;

    assert_eq!(client.model.auth.state(), SessionState::SignedOut);
    assert!(client.identity().current_user().is_none());
    assert_eq!(
        client.model.doc.last_message(),
        Some("Please sign in to see full content")
    );
    assert!(fake.calls().iter().any(|c| c == "/securetoken/token"));
    Ok(())
}

#[actix_web::test]
async fn failed_profile_commit_deletes_the_firebase_account() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = FakeFirebase::new("3600");
    fake.fail_commit = true;
    let (backend, fake) = start(fake)?;
    let mut client = client(&backend).await;

    client
        .dispatch(Msg::SignUpSubmitted {
            name: "Alice".into(),
            email: ALICE.into(),
            password: "hunter22".into(),
        })
        .await;

    let calls = fake.calls();
    let commit = calls.iter().position(|c| c.ends_with(":commit"));
    let delete = calls.iter().position(|c| c == "/identity/accounts:delete");
    assert!(commit.is_some());
    assert!(delete > commit, "calls: {calls:?}");
    assert_eq!(client.model.auth.state(), SessionState::SignedOut);
    assert!(client.identity().current_user().is_none());
    assert_eq!(
        client.model.doc.last_message(),
        Some("Could not create account. Try again.")
    );
    Ok(())
}

fn score_doc(id: &str, player: &str, score: Value) -> Value {
    json!({
        "document": {
            "name": format!("projects/clubhouse-test/databases/(default)/documents/scores/{id}"),
            "fields": {
                "player": { "stringValue": player },
                "course": { "stringValue": "Pebble Beach" },
                "score": score,
                "user": { "stringValue": ALICE },
                "createdAt": { "timestampValue": "2026-10-01T12:00:00.000001Z" },
            }
        },
        "readTime": "2026-10-01T12:00:01Z"
    })
}

#[actix_web::test]
async fn run_query_reply_decodes_into_scores() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = FakeFirebase::new("3600");
    fake.run_query = json!([
        score_doc("a", "Cam", json!({ "integerValue": "68" })),
        score_doc("b", "Dee", json!({ "doubleValue": 70.5 })),
        score_doc("c", "Eli", json!({ "integerValue": "74" })),
    ]);
    let (backend, fake) = start(fake)?;
    let auth = Credentials {
        uid: "uid-alice".into(),
        email: ALICE.into(),
        id_token: Some("id-token".into()),
    };

    let rows = fetch_scores(backend.store().as_ref(), Some(&auth)).await?;

    let got: Vec<(&str, f64)> = rows.iter().map(|r| (r.player.as_str(), r.score)).collect();
    assert_eq!(got, vec![("Cam", 68.0), ("Dee", 70.5), ("Eli", 74.0)]);
    assert!(rows.iter().all(|r| r.created_at.is_some()));
    assert!(fake.calls().iter().any(|c| c.ends_with(":runQuery")));
    Ok(())
}
