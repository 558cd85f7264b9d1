use std::{net::SocketAddr, sync::Arc};

use scanner::{PushoverNotifier, RunManager};
use site_driver::ForeUpFactory;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::build_router;
use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let zone = settings.zone()?;
    let factory = ForeUpFactory {
        webdriver_url: settings.webdriver_url()?,
        venue: settings.venue()?,
        element_timeout: settings.element_timeout(),
        settle: settings.settle(),
        headless: settings.headless,
    };
    info!(
        venue = %factory.venue,
        webdriver = %factory.webdriver_url,
        %zone,
        "tee sheet driver configured"
    );

    let mut runs = RunManager::new(Arc::new(factory), zone);
    let notifier = PushoverNotifier::new(settings.pushover_token, settings.pushover_user);
    if notifier.is_configured() {
        runs = runs.with_notifier(Arc::new(notifier));
    } else {
        warn!("pushover credentials missing; scan notifications are disabled");
    }
    let app = build_router(AppState {
        runs: Arc::new(runs),
    });

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
