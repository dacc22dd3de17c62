use super::error::AppError;
use crate::auth::{self, AuthGate, SessionObserver};
use crate::backend::{BackendError, DocumentStore, IdentityService, NewDocument};
use crate::model::{
    CREATED_AT_FIELD, NewPlayer, NewScore, PLAYERS_COLLECTION, PlayerRecord, SCORES_COLLECTION,
    ScoreRecord, Session,
};
use crate::view::dom::{Document, ids};
use crate::view::fetch::Ticket;
use crate::view::leaderboard::{self, LeaderboardView, ScoreForm};
use crate::view::nav::{ModalId, ViewEvent, ViewState};
use crate::view::players::{self, PlayersView, PostInfoForm};

/// Everything one browser session sees.
#[derive(Clone, Debug, Default)]
pub struct PageModel {
    pub auth: AuthGate,
    pub view: ViewState,
    pub leaderboard: LeaderboardView,
    pub players: PlayersView,
    pub doc: Document,
}

impl PageModel {
    #[must_use]
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug)]
pub enum Msg {
    /// Pushed by the identity service.
    SessionChanged(Session),
    SignInSubmitted { email: String, password: String },
    SignUpSubmitted { name: String, email: String, password: String },
    SignOutClicked,
    ScoreSubmitted(ScoreForm),
    PostInfoSubmitted(PostInfoForm),
    View(ViewEvent),

    SignedIn(Result<(), AppError>),
    SignedUp(Result<(), AppError>),
    SignedOut,
    ScoresLoaded(Ticket, Result<Vec<ScoreRecord>, AppError>),
    PlayersLoaded(Ticket, Result<Vec<PlayerRecord>, AppError>),
    ScoreWritten(Result<(), AppError>),
    PlayerWritten(Result<(), AppError>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    SignIn { email: String, password: String },
    SignUp { name: String, email: String, password: String },
    SignOut,
    LoadScores(Ticket),
    LoadPlayers(Ticket),
    WriteScore(NewScore),
    WritePlayer(NewPlayer),
}

pub fn update(model: &mut PageModel, msg: Msg) -> Vec<Effect> {
    match msg {
        Msg::SessionChanged(session) => {
            let PageModel {
                auth,
                leaderboard,
                players,
                doc,
                ..
            } = model;
            let mut observers: [&mut dyn SessionObserver; 2] = [leaderboard, players];
            auth.reconcile(&session, doc, &mut observers)
        }
        Msg::SignInSubmitted { email, password } => {
            model.doc.fill_form(ids::SIGNIN_FORM, &[("email_", email.as_str())]);
            vec![Effect::SignIn { email, password }]
        }
        Msg::SignUpSubmitted {
            name,
            email,
            password,
        } => {
            model.doc.fill_form(
                ids::SIGNUP_FORM,
                &[("name", name.as_str()), ("email", email.as_str())],
            );
            vec![Effect::SignUp {
                name,
                email,
                password,
            }]
        }
        Msg::SignOutClicked => vec![Effect::SignOut],
        Msg::ScoreSubmitted(form) => {
            model
                .leaderboard
                .submit_score(&model.auth, &form, &mut model.doc)
        }
        Msg::PostInfoSubmitted(form) => model.players.post_info(&model.auth, &form, &mut model.doc),
        Msg::View(event) => {
            model.view = model.view.reduce(&event);
            vec![]
        }
        Msg::SignedIn(result) => {
            match result {
                Ok(()) => {
                    model.doc.reset_form(ids::SIGNIN_FORM);
                    model.view = model.view.reduce(&ViewEvent::CloseModal(ModalId::SignIn));
                    model.doc.configure_message_bar("Signed in successfully.");
                }
                Err(_) => model.doc.configure_message_bar("Invalid login credentials."),
            }
            vec![]
        }
        Msg::SignedUp(result) => {
            match result {
                Ok(()) => {
                    model.doc.reset_form(ids::SIGNUP_FORM);
                    model.view = model.view.reduce(&ViewEvent::CloseModal(ModalId::SignUp));
                    model
                        .doc
                        .configure_message_bar("Account created. You can now sign in.");
                }
                Err(_) => model
                    .doc
                    .configure_message_bar("Could not create account. Try again."),
            }
            vec![]
        }
        Msg::SignedOut => {
            model.doc.configure_message_bar("Signed out.");
            vec![]
        }
        Msg::ScoresLoaded(ticket, result) => {
            model.leaderboard.scores_loaded(ticket, result, &mut model.doc);
            vec![]
        }
        Msg::PlayersLoaded(ticket, result) => {
            model.players.players_loaded(ticket, result, &mut model.doc);
            vec![]
        }
        Msg::ScoreWritten(result) => model.leaderboard.score_written(result, &mut model.doc),
        Msg::PlayerWritten(result) => model.players.player_written(result, &mut model.doc),
    }
}

#[derive(Clone, Copy)]
pub struct Deps<'a> {
    pub identity: &'a dyn IdentityService,
    pub store: &'a dyn DocumentStore,
}

async fn write(
    deps: Deps<'_>,
    collection: &str,
    body: Result<NewDocument, BackendError>,
) -> Result<(), AppError> {
    let doc = body.map_err(AppError::Write)?;
    let auth = deps.identity.current_user();
    deps.store
        .add(
            auth.as_ref(),
            collection,
            doc.with_server_timestamp(CREATED_AT_FIELD),
        )
        .await
        .map(|_| ())
        .map_err(AppError::Write)
}

pub async fn run_effect(effect: Effect, deps: Deps<'_>) -> Msg {
    match effect {
        Effect::SignIn { email, password } => Msg::SignedIn(
            auth::sign_in(deps.identity, &email, &password)
                .await
                .map(|_| ()),
        ),
        Effect::SignUp {
            name,
            email,
            password,
        } => Msg::SignedUp(
            auth::sign_up(deps.identity, deps.store, &name, &email, &password)
                .await
                .map(|_| ()),
        ),
        Effect::SignOut => {
            auth::sign_out(deps.identity).await;
            Msg::SignedOut
        }
        Effect::LoadScores(ticket) => {
            let auth = deps.identity.current_user();
            Msg::ScoresLoaded(
                ticket,
                leaderboard::fetch_scores(deps.store, auth.as_ref()).await,
            )
        }
        Effect::LoadPlayers(ticket) => {
            let auth = deps.identity.current_user();
            Msg::PlayersLoaded(
                ticket,
                players::fetch_players(deps.store, auth.as_ref()).await,
            )
        }
        Effect::WriteScore(score) => Msg::ScoreWritten(
            write(deps, SCORES_COLLECTION, NewDocument::from_serializable(&score)).await,
        ),
        Effect::WritePlayer(player) => Msg::PlayerWritten(
            write(deps, PLAYERS_COLLECTION, NewDocument::from_serializable(&player)).await,
        ),
    }
}
