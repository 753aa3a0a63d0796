use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use mongodb::Client;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod balance;
mod config;
mod errors;
mod exchange;
mod filter;
mod money;
mod routes;
mod schemas;
mod split;
mod store;

use crate::config::Config;
use crate::errors::Result;
use crate::store::Store;

#[actix_web::main]
async fn main() -> Result<()> {
    // RUST_LOG may come from .env, so load it before the subscriber reads it.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().inspect_err(|e| error!("{}", e))?;
    info!(
        database = %config.database_name,
        people = ?config.people,
        "Using configuration"
    );

    let client = Client::with_uri_str(&config.mongodb_uri)
        .await
        .inspect_err(|e| error!("Failed to connect: {}", e))?;
    let store = Store::new(&client, &config.database_name);
    store.ensure_indexes().await?;
    info!("Connected");

    let address = (config.bind_address.clone(), config.port);
    let store = web::Data::new(store);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(store.clone())
            .app_data(config.clone())
            .configure(routes::configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
