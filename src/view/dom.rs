use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};
use tracing::info;

pub const HIDDEN: &str = "is-hidden";
pub const ACTIVE: &str = "is-active";
/// Elements only shown to a signed-in user.
pub const SIGNED_IN: &str = "signedin";
/// Elements only shown to a signed-out visitor.
pub const SIGNED_OUT: &str = "signedout";

pub const DEFAULT_MESSAGE_TTL: Duration = Duration::from_millis(3000);

/// Element ids shared by the templates and the views.
pub mod ids {
    pub const MESSAGE_BAR: &str = "message_bar";
    pub const USER_EMAIL: &str = "user_email";
    pub const NAV_SIGN_IN: &str = "signin_trigger";
    pub const NAV_SIGN_UP: &str = "signup_trigger";
    pub const SIGN_OUT_BTN: &str = "signoutbtn";
    pub const LEADERBOARD_PLACEHOLDER: &str = "leaderboard_placeholder";
    pub const LEADERBOARD_TABLE: &str = "leaderboard_table";
    pub const LEADERBOARD_BODY: &str = "leaderboard_body";
    pub const SCORE_FORM_BOX: &str = "score_form_box";
    pub const PLAYERS_PLACEHOLDER: &str = "players_placeholder";
    pub const ACTIVE_PLAYERS_LIST: &str = "active_players_list";
    pub const POSTINFO_BOX: &str = "postinfo_box";

    pub const SIGNIN_FORM: &str = "signin_form";
    pub const SIGNUP_FORM: &str = "signup_form";
    pub const SCORE_FORM: &str = "submitScoreForm";
    pub const POSTINFO_FORM: &str = "postinfo_form";
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    classes: BTreeSet<String>,
    inner_html: String,
}

impl Element {
    fn with_classes(classes: &[&str]) -> Self {
        Self {
            classes: classes.iter().map(|c| (*c).to_string()).collect(),
            inner_html: String::new(),
        }
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn add_class(&mut self, class: &str) {
        self.classes.insert(class.to_string());
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.remove(class);
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.has_class(HIDDEN)
    }

    #[must_use]
    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    pub fn set_inner_html(&mut self, html: String) {
        self.inner_html = html;
    }
}

#[derive(Clone, Debug)]
struct MessageBar {
    text: String,
    shown_at: Option<Instant>,
    ttl: Duration,
}

/// The page's mutable element state: visibility classes, rendered list
/// content, the message bar and the values typed into each form.
#[derive(Clone, Debug)]
pub struct Document {
    elements: BTreeMap<String, Element>,
    message_bar: MessageBar,
    forms: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_TTL)
    }
}

impl Document {
    /// The site's elements in their pre-auth state: nothing auth-only is
    /// shown until the first session arrives.
    #[must_use]
    pub fn new(message_ttl: Duration) -> Self {
        let elements = [
            (ids::USER_EMAIL, vec![SIGNED_IN, HIDDEN]),
            (ids::NAV_SIGN_IN, vec![SIGNED_OUT]),
            (ids::NAV_SIGN_UP, vec![SIGNED_OUT]),
            (ids::SIGN_OUT_BTN, vec![SIGNED_IN, HIDDEN]),
            (ids::LEADERBOARD_PLACEHOLDER, vec![]),
            (ids::LEADERBOARD_TABLE, vec![HIDDEN]),
            (ids::LEADERBOARD_BODY, vec![]),
            (ids::SCORE_FORM_BOX, vec![SIGNED_IN, HIDDEN]),
            (ids::PLAYERS_PLACEHOLDER, vec![]),
            (ids::ACTIVE_PLAYERS_LIST, vec![HIDDEN]),
            (ids::POSTINFO_BOX, vec![SIGNED_IN, HIDDEN]),
        ]
        .into_iter()
        .map(|(id, classes)| (id.to_string(), Element::with_classes(&classes)))
        .collect();

        Self {
            elements,
            message_bar: MessageBar {
                text: String::new(),
                shown_at: None,
                ttl: message_ttl,
            },
            forms: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    pub fn show(&mut self, id: &str) {
        if let Some(el) = self.element_mut(id) {
            el.remove_class(HIDDEN);
        }
    }

    pub fn hide(&mut self, id: &str) {
        if let Some(el) = self.element_mut(id) {
            el.add_class(HIDDEN);
        }
    }

    #[must_use]
    pub fn is_hidden(&self, id: &str) -> bool {
        self.element(id).is_some_and(Element::is_hidden)
    }

    pub fn set_inner_html(&mut self, id: &str, html: String) {
        if let Some(el) = self.element_mut(id) {
            el.set_inner_html(html);
        }
    }

    #[must_use]
    pub fn inner_html(&self, id: &str) -> &str {
        self.element(id).map_or("", Element::inner_html)
    }

    /// `base` plus whatever state classes the element currently carries.
    #[must_use]
    pub fn class_attr(&self, id: &str, base: &str) -> String {
        let mut out = base.to_string();
        if let Some(el) = self.element(id) {
            for class in &el.classes {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(class);
            }
        }
        out
    }

    /// Shows `msg` until the bar's lifetime runs out or another message replaces it.
    pub fn configure_message_bar(&mut self, msg: &str) {
        info!(message = msg, "notification");
        self.message_bar.text = msg.to_string();
        self.message_bar.shown_at = Some(Instant::now());
    }

    #[must_use]
    pub fn message_at(&self, now: Instant) -> Option<&str> {
        let shown_at = self.message_bar.shown_at?;
        if now.saturating_duration_since(shown_at) < self.message_bar.ttl {
            Some(&self.message_bar.text)
        } else {
            None
        }
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message_at(Instant::now())
    }

    /// The most recent notification, whether or not it has expired.
    #[must_use]
    pub fn last_message(&self) -> Option<&str> {
        self.message_bar.shown_at.map(|_| self.message_bar.text.as_str())
    }

    #[must_use]
    pub fn message_ttl(&self) -> Duration {
        self.message_bar.ttl
    }

    pub fn configure_nav_bar(&mut self, email: Option<&str>) {
        let signed_in = email.is_some();
        for el in self.elements.values_mut() {
            if el.has_class(SIGNED_IN) {
                if signed_in {
                    el.remove_class(HIDDEN);
                } else {
                    el.add_class(HIDDEN);
                }
            }
            if el.has_class(SIGNED_OUT) {
                if signed_in {
                    el.add_class(HIDDEN);
                } else {
                    el.remove_class(HIDDEN);
                }
            }
        }
    }

    #[must_use]
    pub fn form_value(&self, form: &str, field: &str) -> &str {
        self.forms
            .get(form)
            .and_then(|f| f.get(field))
            .map_or("", String::as_str)
    }

    /// Remembers what was typed so a rejected submission re-renders it.
    pub fn fill_form(&mut self, form: &str, values: &[(&str, &str)]) {
        let entry = self.forms.entry(form.to_string()).or_default();
        for (field, value) in values {
            entry.insert((*field).to_string(), (*value).to_string());
        }
    }

    pub fn reset_form(&mut self, form: &str) {
        self.forms.remove(form);
    }
}
