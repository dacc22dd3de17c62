use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::backend::{DocumentStore, IdentityService};
use crate::model::Session;
use crate::mvu::page::{Deps, Effect, Msg, PageModel, run_effect, update};
use crate::view::dom::Document;

/// Runs the MVU loop for one page: applies `msgs`, then keeps running the
/// produced effects concurrently and feeding their results back in
/// completion order until nothing is left. Session pushes are applied as
/// soon as they are seen.
pub async fn run_page(
    model: &mut PageModel,
    msgs: Vec<Msg>,
    deps: Deps<'_>,
    sessions: &mut watch::Receiver<Session>,
) {
    let mut pending = FuturesUnordered::new();
    let schedule = |effects: Vec<Effect>, pending: &mut FuturesUnordered<_>| {
        for effect in effects {
            debug!(?effect, "scheduling");
            pending.push(run_effect(effect, deps));
        }
    };

    let effects = drain_sessions(model, sessions);
    schedule(effects, &mut pending);
    for msg in msgs {
        let effects = update(model, msg);
        schedule(effects, &mut pending);
        let effects = drain_sessions(model, sessions);
        schedule(effects, &mut pending);
    }

    while let Some(msg) = pending.next().await {
        let effects = update(model, msg);
        schedule(effects, &mut pending);
        let effects = drain_sessions(model, sessions);
        schedule(effects, &mut pending);
    }
}

fn drain_sessions(model: &mut PageModel, sessions: &mut watch::Receiver<Session>) -> Vec<Effect> {
    match sessions.has_changed() {
        Ok(true) => {
            let session = sessions.borrow_and_update().clone();
            update(model, Msg::SessionChanged(session))
        }
        Ok(false) => vec![],
        Err(_) => {
            warn!("identity service dropped its session channel");
            vec![]
        }
    }
}

/// One browser session: its page model plus its connection to the backend.
pub struct PageClient {
    pub model: PageModel,
    identity: Arc<dyn IdentityService>,
    store: Arc<dyn DocumentStore>,
    sessions: watch::Receiver<Session>,
}

impl PageClient {
    /// Subscribes to the identity service and reconciles the page to the
    /// session it reports right away.
    pub async fn new(
        identity: Arc<dyn IdentityService>,
        store: Arc<dyn DocumentStore>,
        doc: Document,
    ) -> Self {
        let mut sessions = identity.subscribe();
        let initial = sessions.borrow_and_update().clone();
        let mut client = Self {
            model: PageModel::new(doc),
            identity,
            store,
            sessions,
        };
        client.dispatch_all(vec![Msg::SessionChanged(initial)]).await;
        client
    }

    pub async fn dispatch(&mut self, msg: Msg) {
        self.dispatch_all(vec![msg]).await;
    }

    /// Picks up session changes that happened since the last event.
    pub async fn sync(&mut self) {
        self.dispatch_all(vec![]).await;
    }

    pub async fn dispatch_all(&mut self, msgs: Vec<Msg>) {
        if let Err(e) = self.identity.refresh_session().await {
            debug!("session refresh: {e}");
        }
        let deps = Deps {
            identity: self.identity.as_ref(),
            store: self.store.as_ref(),
        };
        run_page(&mut self.model, msgs, deps, &mut self.sessions).await;
    }

    #[must_use]
    pub fn identity(&self) -> &Arc<dyn IdentityService> {
        &self.identity
    }
}
