use maud::{Markup, html};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::{AuthGate, SessionObserver, SessionState};
use crate::backend::{Direction, DocumentStore, Query};
use crate::model::{
    CREATED_AT_FIELD, Credentials, HandicapSign, NewPlayer, PLAYERS_COLLECTION, PlayerRecord,
    format_handicap,
};
use crate::mvu::error::AppError;
use crate::mvu::page::Effect;
use crate::view::dom::{Document, ids};
use crate::view::fetch::{FetchSlot, Ticket};

/// Raw values of the "post your info" form.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PostInfoForm {
    #[serde(default)]
    pub pi_name: String,
    #[serde(default)]
    pub pi_email: String,
    #[serde(default)]
    pub pi_handicap_sign: String,
    #[serde(default)]
    pub pi_handicap_value: String,
}

impl PostInfoForm {
    /// # Errors
    ///
    /// Will return `AppError::Validation` carrying the message to show when a
    /// field is blank or the handicap isn't a number
    pub fn validate(&self, submitter: &str) -> Result<NewPlayer, AppError> {
        let name = self.pi_name.trim();
        let email = self.pi_email.trim();
        let raw = self.pi_handicap_value.trim();
        if name.is_empty() || email.is_empty() || raw.is_empty() {
            return Err(AppError::validation(
                "Please fill in name, email, and handicap.",
            ));
        }
        let value = match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => return Err(AppError::validation("Handicap must be a number.")),
        };
        Ok(NewPlayer {
            name: name.to_string(),
            email: email.to_string(),
            handicap: format_handicap(HandicapSign::from_selector(&self.pi_handicap_sign), value),
            submitter_email: submitter.to_string(),
        })
    }
}

#[must_use]
pub fn players_query() -> Query {
    Query::collection(PLAYERS_COLLECTION).order_by(CREATED_AT_FIELD, Direction::Descending)
}

/// # Errors
///
/// Will return `AppError::Query` if the store rejects the query or a
/// document doesn't decode
pub async fn fetch_players(
    store: &dyn DocumentStore,
    auth: Option<&Credentials>,
) -> Result<Vec<PlayerRecord>, AppError> {
    let docs = store
        .query(auth, &players_query())
        .await
        .map_err(AppError::Query)?;
    docs.iter()
        .map(|d| d.decode::<PlayerRecord>().map_err(AppError::Query))
        .collect()
}

#[must_use]
pub fn render_players(players: &[PlayerRecord]) -> Markup {
    html! {
        @for p in players {
            li {
                (p.name) " - Handicap " (p.handicap) " - "
                a href={ "mailto:" (p.email) } { "Contact" }
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PlayersView {
    slot: FetchSlot,
}

impl PlayersView {
    pub fn load_players(&mut self) -> Effect {
        Effect::LoadPlayers(self.slot.issue())
    }

    pub fn players_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<PlayerRecord>, AppError>,
        doc: &mut Document,
    ) {
        if !self.slot.accept(ticket) {
            debug!(?ticket, "dropping stale players");
            return;
        }
        match result {
            Ok(players) => {
                doc.set_inner_html(ids::ACTIVE_PLAYERS_LIST, render_players(&players).into_string());
            }
            Err(e) => {
                warn!("loading players: {e}");
                doc.configure_message_bar("Could not load active players.");
            }
        }
    }

    pub fn post_info(
        &mut self,
        gate: &AuthGate,
        form: &PostInfoForm,
        doc: &mut Document,
    ) -> Vec<Effect> {
        doc.fill_form(
            ids::POSTINFO_FORM,
            &[
                ("pi_name", form.pi_name.as_str()),
                ("pi_email", form.pi_email.as_str()),
                ("pi_handicap_sign", form.pi_handicap_sign.as_str()),
                ("pi_handicap_value", form.pi_handicap_value.as_str()),
            ],
        );
        let Some(email) = gate.user_email() else {
            doc.configure_message_bar("You must be signed in to post your info.");
            return vec![];
        };
        match form.validate(email) {
            Ok(player) => vec![Effect::WritePlayer(player)],
            Err(AppError::Validation(msg)) => {
                doc.configure_message_bar(&msg);
                vec![]
            }
            Err(e) => {
                warn!("{e}");
                vec![]
            }
        }
    }

    pub fn player_written(
        &mut self,
        result: Result<(), AppError>,
        doc: &mut Document,
    ) -> Vec<Effect> {
        match result {
            Ok(()) => {
                doc.configure_message_bar("Your info has been posted!");
                doc.reset_form(ids::POSTINFO_FORM);
                vec![self.load_players()]
            }
            Err(e) => {
                warn!("posting player info: {e}");
                doc.configure_message_bar("Error posting your info.");
                vec![]
            }
        }
    }
}

impl SessionObserver for PlayersView {
    fn session_changed(&mut self, state: &SessionState, doc: &mut Document) -> Vec<Effect> {
        match state {
            SessionState::SignedIn(_) => {
                doc.hide(ids::PLAYERS_PLACEHOLDER);
                doc.show(ids::ACTIVE_PLAYERS_LIST);
                vec![self.load_players()]
            }
            SessionState::SignedOut => {
                self.slot.invalidate();
                doc.show(ids::PLAYERS_PLACEHOLDER);
                doc.hide(ids::ACTIVE_PLAYERS_LIST);
                doc.set_inner_html(ids::ACTIVE_PLAYERS_LIST, String::new());
                doc.reset_form(ids::POSTINFO_FORM);
                vec![]
            }
        }
    }
}
