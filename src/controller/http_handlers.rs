use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::web::{self, Data};
use actix_web::{HttpRequest, HttpResponse};
use serde::Deserialize;
use std::time::Instant;
use tracing::debug;

use super::clients::{ClientRegistry, SESSION_COOKIE, SessionId, SharedClient};
use crate::mvu::page::Msg;
use crate::view::dom::Document;
use crate::view::index::{render_message_bar, render_page};
use crate::view::leaderboard::ScoreForm;
use crate::view::nav::{Section, ViewEvent};
use crate::view::players::PostInfoForm;

#[derive(Deserialize, Debug)]
pub struct SignInForm {
    #[serde(default)]
    pub email_: String,
    #[serde(default)]
    pub password_: String,
}

#[derive(Deserialize, Debug)]
pub struct SignUpForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct KeyForm {
    #[serde(default)]
    pub key: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/message_bar", web::get().to(message_bar))
        .route("/signin", web::post().to(sign_in))
        .route("/signup", web::post().to(sign_up))
        .route("/signout", web::post().to(sign_out))
        .route("/scores", web::post().to(submit_score))
        .route("/players", web::post().to(post_info))
        .route("/nav/{section}", web::get().to(navigate))
        .route("/modal/open/{target}", web::get().to(open_modal))
        .route("/modal/dismiss", web::get().to(dismiss_modal))
        .route("/key", web::post().to(key_down))
        .route("/menu", web::get().to(toggle_menu))
        .route("/health", web::get().to(HttpResponse::Ok));
}

fn session_cookie(id: &SessionId) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, id.value().to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

async fn client(req: &HttpRequest, registry: &ClientRegistry) -> (SessionId, SharedClient) {
    let cookie = req.cookie(SESSION_COOKIE);
    registry.client_for(cookie.as_ref().map(Cookie::value)).await
}

/// Feeds `msgs` to the browser's client and sends it back to the page.
async fn dispatch(req: &HttpRequest, registry: &ClientRegistry, msgs: Vec<Msg>) -> HttpResponse {
    let (id, client) = client(req, registry).await;
    client.lock().await.dispatch_all(msgs).await;
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .cookie(session_cookie(&id))
        .finish()
}

pub async fn index(req: HttpRequest, registry: Data<ClientRegistry>) -> HttpResponse {
    let (id, client) = client(&req, &registry).await;
    let markup = {
        let mut client = client.lock().await;
        client.sync().await;
        render_page(&client.model, Instant::now())
    };
    HttpResponse::Ok()
        .content_type("text/html")
        .cookie(session_cookie(&id))
        .body(markup.into_string())
}

/// Polled by the page; a browser without a live session gets an empty bar
/// and no new session.
pub async fn message_bar(req: HttpRequest, registry: Data<ClientRegistry>) -> HttpResponse {
    let cookie = req.cookie(SESSION_COOKIE);
    let Some((id, client)) = registry.existing(cookie.as_ref().map(Cookie::value)) else {
        let empty = Document::new(registry.message_ttl());
        return HttpResponse::Ok()
            .content_type("text/html")
            .body(render_message_bar(&empty, Instant::now()).into_string());
    };
    let markup = {
        let mut client = client.lock().await;
        client.sync().await;
        render_message_bar(&client.model.doc, Instant::now())
    };
    HttpResponse::Ok()
        .content_type("text/html")
        .cookie(session_cookie(&id))
        .body(markup.into_string())
}

pub async fn sign_in(
    req: HttpRequest,
    registry: Data<ClientRegistry>,
    form: web::Form<SignInForm>,
) -> HttpResponse {
    let SignInForm { email_, password_ } = form.into_inner();
    let msg = Msg::SignInSubmitted {
        email: email_,
        password: password_,
    };
    dispatch(&req, &registry, vec![msg]).await
}

pub async fn sign_up(
    req: HttpRequest,
    registry: Data<ClientRegistry>,
    form: web::Form<SignUpForm>,
) -> HttpResponse {
    let SignUpForm {
        name,
        email,
        password,
    } = form.into_inner();
    let msg = Msg::SignUpSubmitted {
        name,
        email,
        password,
    };
    dispatch(&req, &registry, vec![msg]).await
}

pub async fn sign_out(req: HttpRequest, registry: Data<ClientRegistry>) -> HttpResponse {
    dispatch(&req, &registry, vec![Msg::SignOutClicked]).await
}

pub async fn submit_score(
    req: HttpRequest,
    registry: Data<ClientRegistry>,
    form: web::Form<ScoreForm>,
) -> HttpResponse {
    dispatch(&req, &registry, vec![Msg::ScoreSubmitted(form.into_inner())]).await
}

pub async fn post_info(
    req: HttpRequest,
    registry: Data<ClientRegistry>,
    form: web::Form<PostInfoForm>,
) -> HttpResponse {
    dispatch(&req, &registry, vec![Msg::PostInfoSubmitted(form.into_inner())]).await
}

pub async fn navigate(
    req: HttpRequest,
    registry: Data<ClientRegistry>,
    path: web::Path<String>,
) -> HttpResponse {
    let msgs = match path.parse::<Section>() {
        Ok(section) => vec![Msg::View(ViewEvent::Navigate(section))],
        Err(e) => {
            debug!("{e}");
            vec![]
        }
    };
    dispatch(&req, &registry, msgs).await
}

pub async fn open_modal(
    req: HttpRequest,
    registry: Data<ClientRegistry>,
    path: web::Path<String>,
) -> HttpResponse {
    let msg = Msg::View(ViewEvent::OpenModal(path.into_inner()));
    dispatch(&req, &registry, vec![msg]).await
}

pub async fn dismiss_modal(req: HttpRequest, registry: Data<ClientRegistry>) -> HttpResponse {
    dispatch(&req, &registry, vec![Msg::View(ViewEvent::DismissModal)]).await
}

pub async fn key_down(
    req: HttpRequest,
    registry: Data<ClientRegistry>,
    form: web::Form<KeyForm>,
) -> HttpResponse {
    let msg = Msg::View(ViewEvent::KeyDown(form.into_inner().key));
    dispatch(&req, &registry, vec![msg]).await
}

pub async fn toggle_menu(req: HttpRequest, registry: Data<ClientRegistry>) -> HttpResponse {
    dispatch(&req, &registry, vec![Msg::View(ViewEvent::ToggleMenu)]).await
}
