use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::{universe, Config, NotificationSink};
use engine::{SignalEngine, YahooClient};
use store::{GithubMirror, Store};
use strategy::SessionClock;
use telegram_ctrl::{start_bot, BotDeps, TelegramNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    let instruments = universe::load_universe(&cfg.instruments_config_path);
    info!(
        instruments = instruments.len(),
        interval_secs = cfg.refresh_interval_secs,
        "Sniper starting"
    );

    // ── Persistence ───────────────────────────────────────────────────────────
    let mirror = match &cfg.mirror {
        Some(m) => {
            info!(repo = %m.repo, "Remote state mirror enabled");
            Some(GithubMirror::new(&m.token, &m.repo))
        }
        None => {
            info!("Remote state mirror disabled (GITHUB_TOKEN/GITHUB_REPO not set)");
            None
        }
    };
    let store = Arc::new(Store::new(&cfg.state_dir, mirror));

    // ── Notifications + operator bot ──────────────────────────────────────────
    let notifier: Option<Arc<dyn NotificationSink>> = match &cfg.telegram {
        Some(t) => {
            let deps = BotDeps {
                store: store.clone(),
                allowed_user_ids: Arc::new(t.allowed_user_ids.clone()),
            };
            tokio::spawn(start_bot(t.token.clone(), deps));
            Some(Arc::new(TelegramNotifier::new(&t.token, &t.allowed_user_ids)))
        }
        None => {
            info!("Telegram disabled (TELEGRAM_TOKEN not set)");
            None
        }
    };

    // ── Engine ────────────────────────────────────────────────────────────────
    let market = Arc::new(YahooClient::new(&cfg.data_base_url));
    let session = SessionClock::from_offset_hours(cfg.session_utc_offset_hours);
    let engine = SignalEngine::new(instruments, market, store, notifier, session);

    // ── Evaluation loop ───────────────────────────────────────────────────────
    let mut ticker = interval(Duration::from_secs(cfg.refresh_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = engine.run_cycle().await {
                    error!(error = %e, "evaluation cycle failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Exiting.");
                break;
            }
        }
    }

    Ok(())
}
