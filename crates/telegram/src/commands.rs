use std::sync::Arc;

use teloxide::{dispatching::UpdateHandler, prelude::*, utils::command::BotCommands};
use tracing::{info, warn};

use ledger::PerformanceSummary;
use store::Store;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies injected into every handler via `dptree`.
#[derive(Clone)]
pub struct BotDeps {
    /// The administrative commands act on the store directly, bypassing the
    /// engine; the next cycle picks the change up at its state read.
    pub store: Arc<Store>,
    pub allowed_user_ids: Arc<Vec<i64>>,
}

/// Telegram commands exposed to the operator.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Signal engine commands:")]
pub enum Command {
    #[command(description = "Show open positions and performance summary")]
    Status,
    #[command(description = "List open positions with their levels")]
    Positions,
    #[command(description = "Show the most recent resolved trades")]
    History,
    #[command(description = "Clear the active-position store")]
    ResetPositions,
    #[command(description = "Erase the trade history log")]
    ClearHistory,
    #[command(description = "Force a storage connectivity test")]
    TestSync,
    #[command(description = "Send a test notification")]
    TestNotify,
}

/// Start the Telegram bot in long-polling mode.
pub async fn start_bot(token: String, deps: BotDeps) {
    let bot = Bot::new(token);
    let deps = Arc::new(deps);

    info!("Telegram bot starting (long-polling)");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Status].endpoint(handle_status))
        .branch(case![Command::Positions].endpoint(handle_positions))
        .branch(case![Command::History].endpoint(handle_history))
        .branch(case![Command::ResetPositions].endpoint(handle_reset_positions))
        .branch(case![Command::ClearHistory].endpoint(handle_clear_history))
        .branch(case![Command::TestSync].endpoint(handle_test_sync))
        .branch(case![Command::TestNotify].endpoint(handle_test_notify));

    Update::filter_message()
        .filter_map(|msg: Message| msg.from().map(|u| u.id))
        .filter_async(auth_filter)
        .branch(command_handler)
}

/// Silently drop messages from users not in the allowed list.
async fn auth_filter(user_id: UserId, deps: Arc<BotDeps>) -> bool {
    let uid = user_id.0 as i64;
    let allowed = deps.allowed_user_ids.contains(&uid);
    if !allowed {
        warn!(user_id = uid, "Unauthorized Telegram access attempt");
    }
    allowed
}

async fn handle_status(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let positions = deps.store.load_positions().await?;
    let history = deps.store.load_history().await?;
    let summary = PerformanceSummary::from_history(&history);

    let text = format!(
        "Sniper Status\n\
         Open positions: {}\n\
         Closed trades: {}\n\
         Win rate: {:.1}%\n\
         Cumulative: {:+.2} R",
        positions.len(),
        summary.trades,
        summary.win_rate_pct(),
        summary.cumulative_rr,
    );
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_positions(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let positions = deps.store.load_positions().await?;
    if positions.is_empty() {
        bot.send_message(msg.chat.id, "No open positions.").await?;
        return Ok(());
    }

    let mut entries: Vec<_> = positions.into_values().collect();
    entries.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    let lines: Vec<String> = entries
        .iter()
        .map(|p| {
            format!(
                "{} {} @ {:.5} (SL {:.5} / TP {:.5}, RR {:.2})",
                p.symbol, p.direction, p.entry, p.stop_loss, p.take_profit, p.risk_reward
            )
        })
        .collect();
    bot.send_message(msg.chat.id, lines.join("\n")).await?;
    Ok(())
}

async fn handle_history(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let history = deps.store.load_history().await?;
    if history.is_empty() {
        bot.send_message(msg.chat.id, "History is empty.").await?;
        return Ok(());
    }

    let lines: Vec<String> = history
        .iter()
        .rev()
        .take(10)
        .map(|t| {
            let mark = match t.outcome {
                common::Outcome::Win => "✅",
                common::Outcome::Loss => "❌",
            };
            format!(
                "{mark} {} {} {} {:+.2} R",
                t.outcome, t.symbol, t.direction, t.realized_rr
            )
        })
        .collect();
    bot.send_message(msg.chat.id, lines.join("\n")).await?;
    Ok(())
}

async fn handle_reset_positions(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    deps.store.clear_positions().await?;
    info!("Active-position store cleared by operator");
    bot.send_message(msg.chat.id, "Active-position store cleared.")
        .await?;
    Ok(())
}

async fn handle_clear_history(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    deps.store.clear_history().await?;
    info!("Trade history erased by operator");
    bot.send_message(msg.chat.id, "Trade history erased.").await?;
    Ok(())
}

async fn handle_test_sync(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let text = match deps.store.connectivity_test().await {
        Ok(message) => format!("✅ {message}"),
        Err(e) => format!("❌ Connectivity test failed: {e}"),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_test_notify(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "✅ Telegram test message from the signal engine.")
        .await?;
    Ok(())
}
