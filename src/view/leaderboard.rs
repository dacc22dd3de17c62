use maud::{Markup, html};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::{AuthGate, SessionObserver, SessionState};
use crate::backend::{Direction, DocumentStore, Query};
use crate::model::{Credentials, NewScore, SCORES_COLLECTION, ScoreRecord};
use crate::mvu::error::AppError;
use crate::mvu::page::Effect;
use crate::view::dom::{Document, ids};
use crate::view::fetch::{FetchSlot, Ticket};

pub const LEADERBOARD_LIMIT: usize = 10;

/// Raw values of the score submission form.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ScoreForm {
    #[serde(default)]
    pub score_player: String,
    #[serde(default)]
    pub score_course: String,
    #[serde(default)]
    pub score_value: String,
}

impl ScoreForm {
    /// # Errors
    ///
    /// Will return `AppError::Validation` if a field is blank or the score is
    /// zero or not a number
    pub fn validate(&self, submitter: &str) -> Result<NewScore, AppError> {
        let player = self.score_player.trim();
        let course = self.score_course.trim();
        let score = self.score_value.trim().parse::<f64>().unwrap_or(0.0);
        if player.is_empty() || course.is_empty() || score == 0.0 || !score.is_finite() {
            return Err(AppError::validation("Please fill in all score fields."));
        }
        Ok(NewScore {
            player: player.to_string(),
            course: course.to_string(),
            score,
            submitter_email: submitter.to_string(),
        })
    }
}

#[must_use]
pub fn scores_query() -> Query {
    Query::collection(SCORES_COLLECTION)
        .order_by("score", Direction::Ascending)
        .limit(LEADERBOARD_LIMIT)
}

/// # Errors
///
/// Will return `AppError::Query` if the store rejects the query or a
/// document doesn't decode
pub async fn fetch_scores(
    store: &dyn DocumentStore,
    auth: Option<&Credentials>,
) -> Result<Vec<ScoreRecord>, AppError> {
    let docs = store
        .query(auth, &scores_query())
        .await
        .map_err(AppError::Query)?;
    docs.iter()
        .map(|d| d.decode::<ScoreRecord>().map_err(AppError::Query))
        .collect()
}

#[must_use]
pub fn render_rows(rows: &[ScoreRecord]) -> Markup {
    html! {
        @for (i, s) in rows.iter().enumerate() {
            tr {
                td class="has-text-black" { (i + 1) }
                td class="has-text-black" { (s.player) }
                td class="has-text-black" { (s.course) }
                td class="has-text-black" { (s.score) }
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LeaderboardView {
    slot: FetchSlot,
}

impl LeaderboardView {
    pub fn load_scores(&mut self) -> Effect {
        Effect::LoadScores(self.slot.issue())
    }

    /// Replaces the table body with the query result. Results for a ticket
    /// that is no longer current are dropped.
    pub fn scores_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<ScoreRecord>, AppError>,
        doc: &mut Document,
    ) {
        if !self.slot.accept(ticket) {
            debug!(?ticket, "dropping stale scores");
            return;
        }
        match result {
            Ok(mut rows) => {
                rows.sort_by(|a, b| a.score.total_cmp(&b.score));
                rows.truncate(LEADERBOARD_LIMIT);
                doc.set_inner_html(ids::LEADERBOARD_BODY, render_rows(&rows).into_string());
            }
            Err(e) => {
                warn!("loading scores: {e}");
                doc.configure_message_bar("Could not load scores.");
            }
        }
    }

    pub fn submit_score(
        &mut self,
        gate: &AuthGate,
        form: &ScoreForm,
        doc: &mut Document,
    ) -> Vec<Effect> {
        doc.fill_form(
            ids::SCORE_FORM,
            &[
                ("score_player", form.score_player.as_str()),
                ("score_course", form.score_course.as_str()),
                ("score_value", form.score_value.as_str()),
            ],
        );
        let Some(email) = gate.user_email() else {
            doc.configure_message_bar("You must be signed in to submit a score.");
            return vec![];
        };
        match form.validate(email) {
            Ok(score) => vec![Effect::WriteScore(score)],
            Err(e) => {
                debug!("{e}");
                doc.configure_message_bar("Please fill in all score fields.");
                vec![]
            }
        }
    }

    pub fn score_written(&mut self, result: Result<(), AppError>, doc: &mut Document) -> Vec<Effect> {
        match result {
            Ok(()) => {
                doc.configure_message_bar("Score submitted!");
                doc.reset_form(ids::SCORE_FORM);
                vec![self.load_scores()]
            }
            Err(e) => {
                warn!("submitting score: {e}");
                doc.configure_message_bar("Error submitting score.");
                vec![]
            }
        }
    }
}

impl SessionObserver for LeaderboardView {
    fn session_changed(&mut self, state: &SessionState, doc: &mut Document) -> Vec<Effect> {
        match state {
            SessionState::SignedIn(_) => {
                doc.hide(ids::LEADERBOARD_PLACEHOLDER);
                doc.show(ids::LEADERBOARD_TABLE);
                vec![self.load_scores()]
            }
            SessionState::SignedOut => {
                self.slot.invalidate();
                doc.show(ids::LEADERBOARD_PLACEHOLDER);
                doc.hide(ids::LEADERBOARD_TABLE);
                doc.set_inner_html(ids::LEADERBOARD_BODY, String::new());
                doc.reset_form(ids::SCORE_FORM);
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(player: &str, course: &str, score: &str) -> ScoreForm {
        ScoreForm {
            score_player: player.into(),
            score_course: course.into(),
            score_value: score.into(),
        }
    }

    #[test]
    fn blank_or_zero_fields_fail_validation() {
        for f in [
            form("", "Pebble Beach", "72"),
            form("Alice", "  ", "72"),
            form("Alice", "Pebble Beach", ""),
            form("Alice", "Pebble Beach", "0"),
            form("Alice", "Pebble Beach", "abc"),
        ] {
            assert!(matches!(f.validate("a@b.c"), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn valid_form_is_trimmed() {
        let s = form(" Alice ", "Pebble Beach", " 72 ").validate("a@b.c").unwrap();
        assert_eq!(s.player, "Alice");
        assert!((s.score - 72.0).abs() < f64::EPSILON);
        assert_eq!(s.submitter_email, "a@b.c");
    }

    #[test]
    fn signed_out_submission_makes_no_effect() {
        let mut view = LeaderboardView::default();
        let mut doc = Document::default();
        let effects = view.submit_score(
            &AuthGate::default(),
            &form("Alice", "Pebble Beach", "72"),
            &mut doc,
        );
        assert!(effects.is_empty());
        assert_eq!(
            doc.last_message(),
            Some("You must be signed in to submit a score.")
        );
        assert_eq!(doc.form_value(ids::SCORE_FORM, "score_player"), "Alice");
    }
}
