use clap::{CommandFactory, Parser};
use clap::error::ErrorKind;
use std::time::Duration;

use crate::backend::FirebaseConfig;

pub mod types;
pub mod validation;

pub use types::{Args, BackendKind, CleanArgs, SelectedBackend};

/// Parses and validates the command line, exiting with clap's usage error
/// when the combination of options is unusable.
#[must_use]
pub fn args_checks() -> CleanArgs {
    let args = Args::parse();
    if let Err(e) = args.validate() {
        Args::command().error(ErrorKind::ArgumentConflict, e).exit();
    }
    CleanArgs::new(args)
}

impl CleanArgs {
    /// Expects `args` to have passed [`Args::validate`].
    #[must_use]
    pub fn new(args: Args) -> Self {
        let backend = match (args.backend, args.firebase_api_key, args.firebase_project_id) {
            (BackendKind::Firebase, Some(key), Some(project)) => {
                SelectedBackend::Firebase(FirebaseConfig::new(&key, &project))
            }
            _ => SelectedBackend::Memory,
        };
        CleanArgs {
            bind: args.bind,
            port: args.port,
            backend,
            message_ttl: Duration::from_millis(args.message_ttl_ms),
            seed_json: args.seed_json,
        }
    }
}
