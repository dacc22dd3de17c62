use actix_files::Files;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use clubhouse::args::{self, CleanArgs, SelectedBackend};
use clubhouse::backend::{Backend, FirebaseBackend, MemoryBackend};
use clubhouse::controller::http_handlers;
use clubhouse::{ClientRegistry, seed};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = args::args_checks();
    let backend = init_backend(&args)?;
    let registry = Data::new(ClientRegistry::new(backend, args.message_ttl));

    info!(bind = %args.bind, port = args.port, "starting clubhouse");
    HttpServer::new(move || {
        App::new()
            .app_data(registry.clone())
            .configure(http_handlers::configure)
            .service(Files::new("/static", "./static"))
    })
    .bind((args.bind.as_str(), args.port))?
    .run()
    .await?;
    Ok(())
}

fn init_backend(args: &CleanArgs) -> Result<Arc<dyn Backend>, Box<dyn std::error::Error>> {
    match &args.backend {
        SelectedBackend::Memory => {
            let backend = MemoryBackend::new();
            if let Some(json) = &args.seed_json {
                seed::prefill(json, &backend)?;
            }
            Ok(Arc::new(backend))
        }
        SelectedBackend::Firebase(config) => {
            info!(project = %config.project_id, "using firebase backend");
            Ok(Arc::new(FirebaseBackend::new(config.clone())))
        }
    }
}
