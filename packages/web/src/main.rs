use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use api::db::{get_pool, migrate, PgUserStore};
use api::{AppState, Settings};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let settings = Settings::new().context("Failed to load settings")?;
    if settings.uses_default_secret() {
        warn!("KINDRED_AUTH__JWT_SECRET is not set, signing sessions with the development secret");
    }

    let pool = get_pool(&settings.database)
        .await
        .context("Failed to connect to database")?;
    migrate(pool).await.context("Failed to run migrations")?;

    let session_store = PostgresStore::new(pool.clone());
    session_store
        .migrate()
        .await
        .context("Failed to migrate session store")?;

    // Session lifetime matches the token lifetime; the token's own expiry is
    // what the gate checks.
    let ttl = Duration::from_secs(settings.auth.token_ttl_secs);
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(settings.auth.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(ttl.try_into()?));

    let state = AppState::new(&settings, Arc::new(PgUserStore::new(pool.clone())));
    let app = api::routes::router(state, &settings.server.assets).layer(session_layer);

    let listener = TcpListener::bind(&settings.server.address)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server.address))?;
    info!("Server listening on {}", settings.server.address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }
}
