use maud::{DOCTYPE, Markup, html};
use std::time::Instant;

use crate::mvu::page::PageModel;
use crate::view::dom::{ACTIVE, Document, HIDDEN, ids};
use crate::view::nav::{ModalId, Section, ViewState};

const HTMX_PATH: &str = "https://unpkg.com/htmx.org@1.9.12";
const BULMA_PATH: &str = "https://cdn.jsdelivr.net/npm/bulma@1.0.2/css/bulma.min.css";

const COURSES: [(&str, &str); 4] = [
    ("Pebble Beach", "Pebble Beach, California. Par 72."),
    ("St Andrews Old Course", "St Andrews, Scotland. Par 72."),
    ("Augusta National", "Augusta, Georgia. Par 72."),
    ("Pinehurst No. 2", "Pinehurst, North Carolina. Par 70."),
];

#[must_use]
pub fn render_page(model: &PageModel, now: Instant) -> Markup {
    let doc = &model.doc;
    let view = &model.view;
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                link rel="stylesheet" href=(BULMA_PATH);
                link rel="stylesheet" type="text/css" href="/static/styles.css";
                title { "Clubhouse" }
                script src=(HTMX_PATH) {}
            }
            body hx-boost="true" {
                (render_nav_bar(doc, view))
                (render_message_bar(doc, now))
                div hx-post="/key" hx-vals="{\"key\": \"Escape\"}"
                    hx-trigger="keyup[key=='Escape'] from:body" hx-target="body" {}
                main class="section" {
                    (render_home(view))
                    (render_courses(view))
                    (render_leaderboard(doc, view))
                    (render_play(doc, view))
                    (render_about(view))
                }
                (render_sign_in_modal(doc, view))
                (render_sign_up_modal(doc, view))
            }
        }
    }
}

/// The notification slot. While a message is live the bar polls itself so
/// it disappears once the message expires.
#[must_use]
pub fn render_message_bar(doc: &Document, now: Instant) -> Markup {
    match doc.message_at(now) {
        Some(msg) => html! {
            div id=(ids::MESSAGE_BAR) class="notification is-info has-text-centered"
                hx-get="/message_bar" hx-swap="outerHTML"
                hx-trigger={ "load delay:" (doc.message_ttl().as_millis().to_string()) "ms" } {
                (msg)
            }
        },
        None => html! {
            div id=(ids::MESSAGE_BAR) class={ "notification " (HIDDEN) } {}
        },
    }
}

fn active_if(base: &str, on: bool) -> String {
    if on {
        format!("{base} {ACTIVE}")
    } else {
        base.to_string()
    }
}

fn section_class(view: &ViewState, section: Section) -> String {
    if view.section() == section {
        "page".to_string()
    } else {
        format!("page {HIDDEN}")
    }
}

fn render_nav_bar(doc: &Document, view: &ViewState) -> Markup {
    html! {
        nav class="navbar is-success" role="navigation" aria-label="main navigation" {
            div class="navbar-brand" {
                a class="navbar-item has-text-weight-bold" href="/nav/home" { "Clubhouse" }
                a role="button" class=(active_if("navbar-burger", view.menu_open()))
                    aria-label="menu" data-target="navMenu" href="/menu" {
                    span aria-hidden="true" {}
                    span aria-hidden="true" {}
                    span aria-hidden="true" {}
                    span aria-hidden="true" {}
                }
            }
            div id="navMenu" class=(active_if("navbar-menu", view.menu_open())) {
                div class="navbar-start" {
                    @for section in Section::ALL {
                        a class=(active_if("navbar-item", view.section() == section))
                            href={ "/nav/" (section.slug()) } { (section.label()) }
                    }
                }
                div class="navbar-end" {
                    div class="navbar-item" {
                        span id=(ids::USER_EMAIL) class=(doc.class_attr(ids::USER_EMAIL, "has-text-white")) {
                            (maud::PreEscaped(doc.inner_html(ids::USER_EMAIL)))
                        }
                    }
                    div class="navbar-item buttons" {
                        a id=(ids::NAV_SIGN_IN) class=(doc.class_attr(ids::NAV_SIGN_IN, "button is-light js-modal-trigger"))
                            data-target=(ModalId::SignIn.element_id()) href={ "/modal/open/" (ModalId::SignIn.element_id()) } { "Sign In" }
                        a id=(ids::NAV_SIGN_UP) class=(doc.class_attr(ids::NAV_SIGN_UP, "button is-primary js-modal-trigger"))
                            data-target=(ModalId::SignUp.element_id()) href={ "/modal/open/" (ModalId::SignUp.element_id()) } { "Sign Up" }
                        form method="post" action="/signout" {
                            button id=(ids::SIGN_OUT_BTN) type="submit"
                                class=(doc.class_attr(ids::SIGN_OUT_BTN, "button is-danger")) { "Sign Out" }
                        }
                    }
                }
            }
        }
    }
}

fn render_home(view: &ViewState) -> Markup {
    html! {
        div id=(Section::Home.element_id()) class=(section_class(view, Section::Home)) {
            h1 class="title" { "Welcome to the Clubhouse" }
            p { "Track your rounds, climb the leaderboard and find people to play with." }
        }
    }
}

fn render_courses(view: &ViewState) -> Markup {
    html! {
        div id=(Section::Courses.element_id()) class=(section_class(view, Section::Courses)) {
            h1 class="title" { "Courses" }
            div class="columns is-multiline" {
                @for (name, blurb) in COURSES {
                    div class="column is-half" {
                        div class="box" {
                            h2 class="subtitle has-text-weight-bold" { (name) }
                            p { (blurb) }
                        }
                    }
                }
            }
        }
    }
}

fn render_leaderboard(doc: &Document, view: &ViewState) -> Markup {
    let form = ids::SCORE_FORM;
    html! {
        div id=(Section::Leaderboard.element_id()) class=(section_class(view, Section::Leaderboard)) {
            h1 class="title" { "Leaderboards" }
            p id=(ids::LEADERBOARD_PLACEHOLDER) class=(doc.class_attr(ids::LEADERBOARD_PLACEHOLDER, "")) {
                "Sign in to see the leaderboard."
            }
            table id=(ids::LEADERBOARD_TABLE) class=(doc.class_attr(ids::LEADERBOARD_TABLE, "table is-fullwidth is-striped")) {
                thead {
                    tr { th { "Rank" } th { "Player" } th { "Course" } th { "Score" } }
                }
                tbody id=(ids::LEADERBOARD_BODY) {
                    (maud::PreEscaped(doc.inner_html(ids::LEADERBOARD_BODY)))
                }
            }
            div id=(ids::SCORE_FORM_BOX) class=(doc.class_attr(ids::SCORE_FORM_BOX, "box")) {
                h2 class="subtitle" { "Submit a score" }
                form id=(form) method="post" action="/scores" {
                    (text_field("Player", "score_player", "text", doc.form_value(form, "score_player")))
                    (text_field("Course", "score_course", "text", doc.form_value(form, "score_course")))
                    (text_field("Score", "score_value", "number", doc.form_value(form, "score_value")))
                    button class="button is-success" type="submit" { "Submit" }
                }
            }
        }
    }
}

fn render_play(doc: &Document, view: &ViewState) -> Markup {
    let form = ids::POSTINFO_FORM;
    let sign = doc.form_value(form, "pi_handicap_sign");
    html! {
        div id=(Section::Play.element_id()) class=(section_class(view, Section::Play)) {
            h1 class="title" { "Play" }
            h2 class="subtitle" { "Active players" }
            p id=(ids::PLAYERS_PLACEHOLDER) class=(doc.class_attr(ids::PLAYERS_PLACEHOLDER, "")) {
                "Sign in to see who is looking for a game."
            }
            ul id=(ids::ACTIVE_PLAYERS_LIST) class=(doc.class_attr(ids::ACTIVE_PLAYERS_LIST, "")) {
                (maud::PreEscaped(doc.inner_html(ids::ACTIVE_PLAYERS_LIST)))
            }
            div id=(ids::POSTINFO_BOX) class=(doc.class_attr(ids::POSTINFO_BOX, "box")) {
                h2 class="subtitle" { "Post your info" }
                form id=(form) method="post" action="/players" {
                    (text_field("Name", "pi_name", "text", doc.form_value(form, "pi_name")))
                    (text_field("Email", "pi_email", "email", doc.form_value(form, "pi_email")))
                    div class="field" {
                        label class="label" for="pi_handicap_sign" { "Handicap" }
                        div class="field has-addons" {
                            div class="control" {
                                div class="select" {
                                    select id="pi_handicap_sign" name="pi_handicap_sign" {
                                        option value="-" selected[sign != "+"] { "-" }
                                        option value="+" selected[sign == "+"] { "+" }
                                    }
                                }
                            }
                            div class="control" {
                                input class="input" id="pi_handicap_value" name="pi_handicap_value"
                                    type="text" value=(doc.form_value(form, "pi_handicap_value"));
                            }
                        }
                    }
                    button class="button is-success" type="submit" { "Post" }
                }
            }
        }
    }
}

fn render_about(view: &ViewState) -> Markup {
    html! {
        div id=(Section::About.element_id()) class=(section_class(view, Section::About)) {
            h1 class="title" { "About" }
            p { "A members' site for a small golf club: scores, courses and playing partners." }
        }
    }
}

fn text_field(label: &str, id: &str, kind: &str, value: &str) -> Markup {
    html! {
        div class="field" {
            label class="label" for=(id) { (label) }
            div class="control" {
                input class="input" id=(id) name=(id) type=(kind) value=(value);
            }
        }
    }
}

fn modal_shell(view: &ViewState, modal: ModalId, title: &str, body: Markup) -> Markup {
    html! {
        div id=(modal.element_id()) class=(active_if("modal", view.is_open(modal))) {
            a class="modal-background" href="/modal/dismiss" {}
            div class="modal-card" {
                header class="modal-card-head" {
                    p class="modal-card-title" { (title) }
                    a class="delete" aria-label="close" href="/modal/dismiss" {}
                }
                section class="modal-card-body" { (body) }
                footer class="modal-card-foot" {
                    a class="button" href="/modal/dismiss" { "Cancel" }
                }
            }
            a class="modal-close is-large" aria-label="close" href="/modal/dismiss" {}
        }
    }
}

fn render_sign_in_modal(doc: &Document, view: &ViewState) -> Markup {
    let form = ids::SIGNIN_FORM;
    let body = html! {
        form id=(form) method="post" action="/signin" {
            (text_field("Email", "email_", "email", doc.form_value(form, "email_")))
            (text_field("Password", "password_", "password", ""))
            button class="button is-success" type="submit" { "Sign In" }
        }
    };
    modal_shell(view, ModalId::SignIn, "Sign In", body)
}

fn render_sign_up_modal(doc: &Document, view: &ViewState) -> Markup {
    let form = ids::SIGNUP_FORM;
    let body = html! {
        form id=(form) method="post" action="/signup" {
            (text_field("Name", "name", "text", doc.form_value(form, "name")))
            (text_field("Email", "email", "email", doc.form_value(form, "email")))
            (text_field("Password", "password", "password", ""))
            button class="button is-primary" type="submit" { "Sign Up" }
        }
    };
    modal_shell(view, ModalId::SignUp, "Sign Up", body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::nav::ViewEvent;

    #[test]
    fn only_current_section_is_visible() {
        let mut model = PageModel::default();
        model.view = model.view.reduce(&ViewEvent::Navigate(Section::Play));
        let html = render_page(&model, Instant::now()).into_string();
        assert!(html.contains(r#"id="play-page" class="page""#));
        assert!(html.contains(r#"id="index" class="page is-hidden""#));
    }

    #[test]
    fn expired_message_renders_hidden_bar() {
        let mut doc = Document::default();
        doc.configure_message_bar("Signed out.");
        let later = Instant::now() + doc.message_ttl();
        let html = render_message_bar(&doc, later).into_string();
        assert!(!html.contains("Signed out."));
        assert!(html.contains(HIDDEN));
    }
}
