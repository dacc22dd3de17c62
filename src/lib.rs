pub mod args;
pub mod auth;
pub mod backend;
pub mod model;
pub mod seed;
pub mod controller {
    pub mod clients;
    pub mod http_handlers;
}
pub mod mvu {
    pub mod error;
    pub mod page;
    pub mod runtime;
}
pub mod view {
    pub mod dom;
    pub mod fetch;
    pub mod index;
    pub mod leaderboard;
    pub mod nav;
    pub mod players;
}

pub use controller::clients::ClientRegistry;
pub use mvu::error::AppError;
pub use mvu::runtime::PageClient;
