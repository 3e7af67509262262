use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info};

use cineverse_bot::admin;
use cineverse_bot::app::App;
use cineverse_bot::callbacks;
use cineverse_bot::config;
use cineverse_bot::db;
use cineverse_bot::handlers;
use cineverse_bot::scheduler::Scheduler;
use cineverse_bot::telegram::TelegramApi;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/cineverse.db", cfg.app.data_dir));

    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let bot = Bot::new(cfg.telegram.bot_token.clone());
    let api = Arc::new(TelegramApi::new(bot.clone()));
    let scheduler = Scheduler::new(api.clone());

    let app = Arc::new(App {
        cfg,
        pool,
        api,
        scheduler,
        sessions: admin::new_sessions(),
    });

    info!("starting telegram bot");
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(
            |bot: Bot, app: Arc<App>, msg: Message| async move {
                if let Err(err) = handlers::handle_message(bot, app, msg).await {
                    error!(?err, "failed to handle message");
                }
                respond(())
            },
        ))
        .branch(Update::filter_callback_query().endpoint(
            |bot: Bot, app: Arc<App>, q: CallbackQuery| async move {
                if let Err(err) = callbacks::handle_callback(bot, app, q).await {
                    error!(?err, "failed to handle callback query");
                }
                respond(())
            },
        ));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
