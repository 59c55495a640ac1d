//! PizzaHub ordering service

use std::sync::Arc;

use anyhow::Result;
use pizzahub_core::{Lifecycle, TokenService};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pizzahub_server::{
    routes, seed, AppState, CatalogStore, Config, ConsoleEmailSender, EmailSender,
    InMemoryCatalogStore, InMemoryOrderStore, InMemoryUserStore, OrderStore, SmtpConfig,
    SmtpEmailSender, SqliteStore, UploadSettings, UserStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pizzahub_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    let email_sender = create_email_sender();

    match &config.database_path {
        Some(path) => {
            let store = Arc::new(SqliteStore::open(path)?);
            tracing::info!(path = %path, "Using SQLite storage");
            serve(config.clone(), store.clone(), store.clone(), store, email_sender).await
        }
        None => {
            tracing::warn!("DATABASE_PATH not set, data will not survive a restart");
            serve(
                config.clone(),
                InMemoryUserStore::new(),
                InMemoryCatalogStore::new(),
                InMemoryOrderStore::new(),
                email_sender,
            )
            .await
        }
    }
}

/// SMTP when configured and reachable, otherwise print codes to the console
fn create_email_sender() -> Box<dyn EmailSender> {
    match SmtpConfig::from_env() {
        Some(smtp_config) => match SmtpEmailSender::new(smtp_config) {
            Ok(sender) => Box::new(sender),
            Err(e) => {
                tracing::warn!(error = %e, "SMTP unavailable, falling back to console email");
                Box::new(ConsoleEmailSender::new())
            }
        },
        None => {
            tracing::info!("No mail credentials set, verification codes go to the console");
            Box::new(ConsoleEmailSender::new())
        }
    }
}

async fn serve<U, C, O, E>(
    config: Config,
    user_store: U,
    catalog_store: C,
    order_store: O,
    email_sender: E,
) -> Result<()>
where
    U: UserStore + 'static,
    C: CatalogStore + 'static,
    O: OrderStore + 'static,
    E: EmailSender + 'static,
{
    if config.seed_demo_data {
        seed::seed_demo_data(&user_store, &catalog_store)?;
    }

    // Create app state
    let state = Arc::new(
        AppState::new(
            TokenService::new(&config.jwt_secret),
            user_store,
            catalog_store,
            order_store,
            email_sender,
        )
        .with_lifecycle(Lifecycle::new(config.status_policy))
        .with_uploads(UploadSettings {
            dir: config.uploads_dir.clone(),
            public_base_url: config.public_base_url.clone(),
        }),
    );

    tokio::fs::create_dir_all(&config.uploads_dir).await?;

    // Create router
    let app = routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("PizzaHub listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
