use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use task_manager::repository::{MemoryStore, PgStore};
use task_manager::{AppState, Config};

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

async fn build_state(config: &Config) -> io::Result<AppState> {
    let state = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url).await.map_err(startup_error)?;
            store.migrate().await.map_err(startup_error)?;
            log::info!("using postgres store");
            AppState::new(config, Arc::new(store))
        }
        None => {
            log::warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
            AppState::new(config, Arc::new(MemoryStore::new()))
        }
    };
    state.map_err(startup_error)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(startup_error)?;
    let state = build_state(&config).await?;

    log::info!("Starting task manager at {}", config.server_url());
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .configure(|cfg| state.configure(cfg))
            .wrap(state.policy().filter())
            .wrap(state.policy().headers())
            .wrap(cors)
            .wrap(Logger::default())
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
