use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use mongodb::Client;
use tracing_subscriber::EnvFilter;

use splitledger::api::{self, AppState};
use splitledger::cache::BalanceCache;
use splitledger::config::Config;
use splitledger::mongo::MongoLedgerStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let client = Client::with_uri_str(&config.mongodb_uri)
        .await
        .expect("failed to connect");
    tracing::info!("connected to MongoDB");

    let state = web::Data::new(AppState {
        store: Arc::new(MongoLedgerStore::new(&client)),
        cache: BalanceCache::new(),
        secret: config.api_secret.clone(),
    });

    tracing::info!(addr = %config.bind_addr, "listening");
    let allowed_origin = config.allowed_origin.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .supports_credentials();
        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
