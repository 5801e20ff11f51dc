//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-level errors render through
//! `kernel::error::AppError`.

use anyhow::{Context, bail};
use auth::{AuthConfig, AuthLayerState, PgAuthRepository, auth_router, with_authentication};
use axum::{
    Router, http,
    http::{Method, header},
};
use platform::crypto::{key_from_base64, random_key};
use platform::mail::{Mailer, SmtpConfig};
use reviews::{PgReviewsRepository, ReviewsConfig, reviews_router};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Optional environment variable parsed as `T`
fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} is not valid")),
        Err(_) => Ok(None),
    }
}

/// 32-byte secret from base64; random in debug builds when unset
fn secret(key: &str) -> anyhow::Result<[u8; 32]> {
    match env::var(key) {
        Ok(raw) => key_from_base64(raw.trim()).with_context(|| format!("{key} is not a valid key")),
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!(key, "Secret not set, using a random one for this run");
            Ok(random_key())
        }
        Err(_) => bail!("{key} must be set in production"),
    }
}

fn auth_config(page_size: u32) -> anyhow::Result<AuthConfig> {
    let mut config = AuthConfig {
        jwt_secret: secret("JWT_SECRET")?,
        confirmation_secret: secret("CONFIRMATION_SECRET")?,
        page_size,
        ..AuthConfig::default()
    };
    if let Some(secs) = env_parse::<u64>("ACCESS_TOKEN_TTL_SECS")? {
        config.access_token_ttl = Duration::from_secs(secs);
    }
    if let Some(secs) = env_parse::<u64>("CONFIRMATION_CODE_TTL_SECS")? {
        config.confirmation_code_ttl = Duration::from_secs(secs);
    }
    if let Ok(from) = env::var("MAIL_FROM") {
        config.mail_from = from;
    }
    Ok(config)
}

/// SMTP relay settings, when `SMTP_HOST` is set
fn smtp_config() -> anyhow::Result<Option<SmtpConfig>> {
    let Ok(host) = env::var("SMTP_HOST") else {
        return Ok(None);
    };
    let defaults = SmtpConfig::default();
    Ok(Some(SmtpConfig {
        host,
        port: env_parse("SMTP_PORT")?.unwrap_or(defaults.port),
        username: env::var("SMTP_USERNAME").ok(),
        password: env::var("SMTP_PASSWORD").ok(),
        starttls: env_parse("SMTP_STARTTLS")?.unwrap_or(defaults.starttls),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,reviews=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Configuration
    let page_size = env_parse::<u32>("PAGE_SIZE")?
        .filter(|size| *size > 0)
        .unwrap_or(ReviewsConfig::default().page_size);
    let auth_config = auth_config(page_size)?;
    let reviews_config = ReviewsConfig::with_page_size(page_size);

    let mailer = Mailer::from_config(smtp_config()?.as_ref())?;
    tracing::info!(mailer = mailer.kind(), "Mail delivery configured");

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]));

    // Build router
    let auth_repo = PgAuthRepository::new(pool.clone());
    let layer_state = AuthLayerState::new(Arc::new(auth_repo.clone()), &auth_config);

    let api = Router::new()
        .merge(auth_router(auth_repo, mailer, auth_config))
        .merge(reviews_router(
            PgReviewsRepository::new(pool.clone()),
            reviews_config,
        ));

    let app = Router::new()
        .nest("/api/v1", with_authentication(api, layer_state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env_parse("BIND_ADDR")?.unwrap_or(SocketAddr::from(([0, 0, 0, 0], 8000)));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
