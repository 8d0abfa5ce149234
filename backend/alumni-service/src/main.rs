use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use alumni_service::{
    config::{Config, StorageBackend, SERVICE_NAME},
    logging,
    repository::Repositories,
    routes,
    state::AppState,
    websocket::ConnectionRegistry,
};
use anyhow::{Context, Result};
use tracing::info;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(env = %config.app.env, backend = ?config.storage.backend, "starting {}", SERVICE_NAME);

    let (repos, db) = match (config.storage.backend, config.storage.database.clone()) {
        (StorageBackend::Postgres, Some(db_config)) => {
            db_config.log_config();
            let pool = db_pool::create_pool(db_config)
                .await
                .context("failed to create database pool")?;

            if config.storage.run_migrations {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("failed to run migrations")?;
                info!("database migrations applied");
            }

            db_pool::spawn_pool_metrics(pool.clone(), SERVICE_NAME.to_string());
            (Repositories::postgres(pool.clone()), Some(pool))
        }
        (StorageBackend::Postgres, None) => {
            anyhow::bail!("postgres backend selected without database configuration")
        }
        (StorageBackend::Memory, _) => {
            tracing::warn!("using in-memory storage, data is lost on restart");
            (Repositories::in_memory(), None)
        }
    };

    let bind_addr = format!("{}:{}", config.app.host, config.app.port);
    let cors_config = config.cors.clone();
    let state = AppState::new(config, repos, db, ConnectionRegistry::new());

    info!(%bind_addr, "HTTP server listening");

    HttpServer::new(move || {
        let origins = if cors_config.allow_any() {
            Cors::default().allow_any_origin()
        } else {
            cors_config
                .allowed_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        };
        let cors = origins
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::HeaderName::from_static("x-user-id"),
                header::HeaderName::from_static("x-correlation-id"),
            ])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors)
            .wrap(actix_middleware::MetricsMiddleware)
            .wrap(actix_middleware::Logging)
            .wrap(actix_middleware::CorrelationIdMiddleware)
            .configure(routes::configure)
    })
    .bind(&bind_addr)
    .with_context(|| format!("failed to bind {}", bind_addr))?
    .run()
    .await
    .context("HTTP server error")?;

    info!("{} shut down", SERVICE_NAME);
    Ok(())
}
