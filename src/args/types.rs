use clap::{Parser, ValueEnum};
use serde_json::Value;
use std::time::Duration;

use crate::backend::FirebaseConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Process-local accounts and documents; lost on restart.
    Memory,
    /// Firebase Authentication and Cloud Firestore over REST.
    Firebase,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(long, env = "CLUBHOUSE_BIND", default_value = "0.0.0.0")]
    pub bind: String,
    #[arg(short = 'p', long, env = "CLUBHOUSE_PORT", default_value_t = 8081)]
    pub port: u16,
    #[arg(short = 'b', long, value_enum, env = "CLUBHOUSE_BACKEND", default_value = "memory")]
    pub backend: BackendKind,
    // Only necessary for firebase.
    #[arg(long, value_name = "API_KEY", env = "FIREBASE_API_KEY", hide_env_values = true)]
    pub firebase_api_key: Option<String>,
    #[arg(long, value_name = "PROJECT_ID", env = "FIREBASE_PROJECT_ID")]
    pub firebase_project_id: Option<String>,
    /// How long a notification stays in the message bar.
    #[arg(long, value_name = "MILLIS", default_value_t = 3000)]
    pub message_ttl_ms: u64,
    /// Accounts, scores and players to load into the memory backend at startup.
    #[arg(
        long,
        value_name = "SEED_JSON",
        value_parser = crate::args::validation::check_readable_file_and_json
    )]
    pub seed_json: Option<Value>,
}

#[derive(Clone, Debug)]
pub enum SelectedBackend {
    Memory,
    Firebase(FirebaseConfig),
}

#[derive(Clone, Debug)]
pub struct CleanArgs {
    pub bind: String,
    pub port: u16,
    pub backend: SelectedBackend,
    pub message_ttl: Duration,
    pub seed_json: Option<Value>,
}
