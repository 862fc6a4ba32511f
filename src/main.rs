use std::sync::Arc;

use devsetup_onboarding::config::ServerConfig;
use devsetup_onboarding::onboarding::{OnboardingController, OnboardingRouteState, onboarding_routes};
use devsetup_onboarding::store::{LibSqlStore, ProgressStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;

    eprintln!("devsetup-onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   User: {}", config.user_id);
    eprintln!("   API: http://0.0.0.0:{}/api/onboarding", config.port);

    let store: Arc<dyn ProgressStore> =
        Arc::new(LibSqlStore::new_local(&config.db_path, config.user_id.clone()).await?);

    let (controller, outcome) = OnboardingController::mount(
        store,
        config.onboarding.clone(),
        config.entry_url.as_deref(),
    )
    .await;

    if let Some(location) = &outcome.location {
        eprintln!(
            "   Resumed at step {} (entry rewritten to {})",
            outcome.position.step_index, location
        );
    }

    let app = onboarding_routes(OnboardingRouteState {
        controller: Arc::new(controller),
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Onboarding server started");
    axum::serve(listener, app).await?;

    Ok(())
}
