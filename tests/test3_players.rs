use scraper::{Html, Selector};

use clubhouse::model::PLAYERS_COLLECTION;
use clubhouse::mvu::page::Msg;
use clubhouse::view::dom::ids;
use clubhouse::view::players::PostInfoForm;

mod common;
use common::{ALICE, PASSWORD, TestBackend, signed_in_client};

fn post(name: &str, email: &str, sign: &str, value: &str) -> Msg {
    Msg::PostInfoSubmitted(PostInfoForm {
        pi_name: name.into(),
        pi_email: email.into(),
        pi_handicap_sign: sign.into(),
        pi_handicap_value: value.into(),
    })
}

fn entries(list: &str) -> Vec<(String, Option<String>)> {
    let html = Html::parse_fragment(&format!("<ul>{list}</ul>"));
    let li = Selector::parse("li").unwrap();
    let a = Selector::parse("a").unwrap();
    html.select(&li)
        .map(|item| {
            let href = item
                .select(&a)
                .next()
                .and_then(|link| link.value().attr("href"))
                .map(str::to_string);
            (item.text().collect::<String>(), href)
        })
        .collect()
}

#[tokio::test]
async fn handicap_sign_controls_display() -> Result<(), Box<dyn std::error::Error>> {
    let backend = TestBackend::new();
    backend.memory.create_account(ALICE, PASSWORD)?;
    let mut client = signed_in_client(&backend).await;

    client.dispatch(post("Bob", "bob@x.com", "+", "5")).await;
    assert_eq!(client.model.doc.last_message(), Some("Your info has been posted!"));
    client.dispatch(post("Carol", "carol@x.com", "-", "5")).await;

    let list = entries(client.model.doc.inner_html(ids::ACTIVE_PLAYERS_LIST));
    assert_eq!(list.len(), 2);
    // Newest first.
    assert_eq!(list[0].0, "Carol - Handicap 5 - Contact");
    assert_eq!(list[0].1.as_deref(), Some("mailto:carol@x.com"));
    assert_eq!(list[1].0, "Bob - Handicap +5 - Contact");
    assert_eq!(client.model.doc.form_value(ids::POSTINFO_FORM, "pi_name"), "");
    Ok(())
}

#[tokio::test]
async fn signed_out_post_writes_nothing() {
    let backend = TestBackend::new();
    let mut client = backend.client().await;

    client.dispatch(post("Bob", "bob@x.com", "+", "5")).await;

    assert_eq!(backend.store.inner.count(PLAYERS_COLLECTION), 0);
    assert_eq!(
        client.model.doc.last_message(),
        Some("You must be signed in to post your info.")
    );
}

#[tokio::test]
async fn non_numeric_handicap_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let backend = TestBackend::new();
    backend.memory.create_account(ALICE, PASSWORD)?;
    let mut client = signed_in_client(&backend).await;

    client.dispatch(post("Bob", "bob@x.com", "+", "scratch")).await;
    assert_eq!(client.model.doc.last_message(), Some("Handicap must be a number."));

    client.dispatch(post("Bob", "", "+", "5")).await;
    assert_eq!(
        client.model.doc.last_message(),
        Some("Please fill in name, email, and handicap.")
    );
    assert_eq!(backend.store.inner.count(PLAYERS_COLLECTION), 0);
    assert_eq!(client.model.doc.form_value(ids::POSTINFO_FORM, "pi_name"), "Bob");
    Ok(())
}

#[tokio::test]
async fn players_are_hidden_again_after_sign_out() -> Result<(), Box<dyn std::error::Error>> {
    let backend = TestBackend::new();
    backend.memory.create_account(ALICE, PASSWORD)?;
    let mut client = signed_in_client(&backend).await;
    client.dispatch(post("Bob", "bob@x.com", "+", "5")).await;

    client.dispatch(Msg::SignOutClicked).await;

    let doc = &client.model.doc;
    assert_eq!(doc.inner_html(ids::ACTIVE_PLAYERS_LIST), "");
    assert!(doc.is_hidden(ids::ACTIVE_PLAYERS_LIST));
    assert!(!doc.is_hidden(ids::PLAYERS_PLACEHOLDER));
    assert!(doc.is_hidden(ids::POSTINFO_BOX));
    Ok(())
}
