use std::collections::BTreeSet;
use std::str::FromStr;

/// The page sections; exactly one is visible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    #[default]
    Home,
    Courses,
    Leaderboard,
    Play,
    About,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Home,
        Section::Courses,
        Section::Leaderboard,
        Section::Play,
        Section::About,
    ];

    /// Id of the section's container element.
    #[must_use]
    pub fn element_id(self) -> &'static str {
        match self {
            Section::Home => "index",
            Section::Courses => "courses-page",
            Section::Leaderboard => "leaderboard-page",
            Section::Play => "play-page",
            Section::About => "about-page",
        }
    }

    /// Path segment used by the nav buttons.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Section::Home => "home",
            Section::Courses => "courses",
            Section::Leaderboard => "leaderboards",
            Section::Play => "play",
            Section::About => "about",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::Courses => "Courses",
            Section::Leaderboard => "Leaderboards",
            Section::Play => "Play",
            Section::About => "About",
        }
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|sec| sec.slug() == s || sec.element_id() == s)
            .ok_or_else(|| format!("unknown section '{s}'"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModalId {
    SignIn,
    SignUp,
}

impl ModalId {
    pub const ALL: [ModalId; 2] = [ModalId::SignIn, ModalId::SignUp];

    #[must_use]
    pub fn element_id(self) -> &'static str {
        match self {
            ModalId::SignIn => "sign-in-modal",
            ModalId::SignUp => "sign-up-modal",
        }
    }
}

impl FromStr for ModalId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModalId::ALL
            .into_iter()
            .find(|m| m.element_id() == s)
            .ok_or_else(|| format!("unknown modal '{s}'"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    Navigate(Section),
    /// A trigger was clicked; carries the trigger's declared target.
    OpenModal(String),
    /// Background, close button, header delete or footer button clicked.
    DismissModal,
    KeyDown(String),
    ToggleMenu,
    /// A successful sign-in/sign-up closes its own modal.
    CloseModal(ModalId),
}

/// Which section is shown and which modals are open. Not tied to the
/// session: signing in or out leaves it alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    section: Section,
    open_modals: BTreeSet<ModalId>,
    menu_open: bool,
}

impl ViewState {
    #[must_use]
    pub fn section(&self) -> Section {
        self.section
    }

    #[must_use]
    pub fn is_open(&self, modal: ModalId) -> bool {
        self.open_modals.contains(&modal)
    }

    #[must_use]
    pub fn any_modal_open(&self) -> bool {
        !self.open_modals.is_empty()
    }

    #[must_use]
    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    #[must_use]
    pub fn reduce(&self, event: &ViewEvent) -> ViewState {
        let mut next = self.clone();
        match event {
            ViewEvent::Navigate(section) => next.section = *section,
            ViewEvent::OpenModal(target) => {
                // Triggers pointing at nothing do nothing.
                if let Ok(modal) = target.parse::<ModalId>() {
                    next.open_modals.insert(modal);
                }
            }
            ViewEvent::DismissModal => next.open_modals.clear(),
            ViewEvent::KeyDown(key) => {
                if key == "Escape" {
                    next.open_modals.clear();
                }
            }
            ViewEvent::ToggleMenu => next.menu_open = !next.menu_open,
            ViewEvent::CloseModal(modal) => {
                next.open_modals.remove(modal);
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_home() {
        let v = ViewState::default();
        assert_eq!(v.section(), Section::Home);
        assert!(!v.any_modal_open());
    }

    #[test]
    fn opening_a_modal_keeps_the_section() {
        let v = ViewState::default()
            .reduce(&ViewEvent::Navigate(Section::Play))
            .reduce(&ViewEvent::OpenModal("sign-in-modal".into()));
        assert_eq!(v.section(), Section::Play);
        assert!(v.is_open(ModalId::SignIn));
    }

    #[test]
    fn unknown_modal_target_is_ignored() {
        let v = ViewState::default().reduce(&ViewEvent::OpenModal("nope".into()));
        assert_eq!(v, ViewState::default());
    }

    #[test]
    fn other_keys_leave_modals_open() {
        let v = ViewState::default()
            .reduce(&ViewEvent::OpenModal("sign-up-modal".into()))
            .reduce(&ViewEvent::KeyDown("Enter".into()));
        assert!(v.is_open(ModalId::SignUp));
    }

    #[test]
    fn reduce_does_not_touch_the_original() {
        let v = ViewState::default();
        let _ = v.reduce(&ViewEvent::ToggleMenu);
        assert!(!v.menu_open());
    }

    #[test]
    fn section_parses_from_slug_or_id() {
        assert_eq!("leaderboards".parse::<Section>(), Ok(Section::Leaderboard));
        assert_eq!("about-page".parse::<Section>(), Ok(Section::About));
        assert!("garage".parse::<Section>().is_err());
    }
}
