mod api;
mod dialog;
mod middleware;
mod notify;
mod scheduler;
mod telegram;
#[cfg(test)]
mod testing;
mod watch;

use std::sync::Arc;
use std::time::Duration;

use pricewatch_scraper::{ExtractContext, MarketplaceClient};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, WebhookState, WEBHOOK_PATH},
    dialog::Dispatcher,
    middleware::WebhookSecret,
    telegram::TelegramClient,
    watch::Orchestrator,
};

const TELEGRAM_TIMEOUT_SECS: u64 = 15;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(pricewatch_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let token = config.require_bot_token()?;
    let catalog = Arc::new(pricewatch_core::load_categories_or_builtin(
        &config.categories_path,
    )?);
    tracing::info!(categories = catalog.len(), "category catalog loaded");

    let store = pricewatch_db::open_store(&config).await?;
    let source = Arc::new(MarketplaceClient::from_config(&config, Arc::clone(&catalog))?);
    let bot = Arc::new(TelegramClient::new(
        &config.telegram_api_url,
        token,
        TELEGRAM_TIMEOUT_SECS,
    )?);

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&store),
        source,
        Arc::clone(&bot) as Arc<dyn notify::Notifier>,
        ExtractContext {
            site_url: config.marketplace_site_url.clone(),
            max_entries: config.max_entries,
        },
        config.max_concurrent_users,
    ));
    let interval = Duration::from_secs(config.check_interval_secs);
    let _scheduler = scheduler::build_scheduler(Arc::clone(&orchestrator), interval).await?;

    let dispatcher = Arc::new(Dispatcher::new(store, catalog, orchestrator, interval));

    let (webhook, poller) = if let Some(base) = config.webhook_url.as_deref() {
        let url = format!("{}{WEBHOOK_PATH}", base.trim_end_matches('/'));
        bot.set_webhook(&url, config.webhook_secret.as_deref())
            .await?;
        tracing::info!(%url, "telegram: webhook registered");
        let state = WebhookState {
            updates: dialog::spawn_update_worker(bot, dispatcher),
            secret: WebhookSecret(config.webhook_secret.clone()),
        };
        (Some(state), None)
    } else {
        let poller = tokio::spawn(dialog::run_polling(bot, dispatcher));
        (None, Some(poller))
    };

    let app = build_app(webhook);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "pricewatch-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // In-flight fetches are abandoned; nothing beyond sent messages is persisted.
    if let Some(poller) = poller {
        poller.abort();
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
