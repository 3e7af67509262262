//! Message routing: commands, reply-keyboard buttons, and the free-text
//! search fallback. Every message passes the join gate first, then an active
//! admin session gets a chance to consume it.
use crate::admin;
use crate::app::App;
use crate::db;
use crate::delivery::{self, Item};
use crate::gate;
use crate::keyboards;
use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::instrument;

const WELCOME: &str = "🎬 Welcome to Cineverse!\n\n\
    Browse the catalog with the buttons below, or just type a title to search.";

const HELP: &str = "❓ Help & FAQ\n\n\
    🎬 All Movies / 📺 All Series - browse the full catalog.\n\
    🗓 Browse by Year / 📚 Browse by Category - filtered views.\n\
    🔎 Type any title to search.\n\n\
    Files may auto-delete after a while to keep the chat clean. Use the \
    'Get Again' button under the deletion notice to re-fetch them.";

#[instrument(skip_all, fields(chat = msg.chat.id.0))]
pub async fn handle_message(bot: Bot, app: Arc<App>, msg: Message) -> Result<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };

    if !gate::is_allowed(&bot, &app.cfg, user).await {
        gate::send_join_prompt(&bot, &app.cfg, msg.chat.id).await?;
        return Ok(());
    }

    if admin::handle_message(&bot, &app, &msg).await? {
        return Ok(());
    }

    let Some(text) = msg.text().map(str::trim) else {
        return Ok(());
    };

    if let Some(payload) = text.strip_prefix("/start") {
        return start(&bot, &app, &msg, payload.trim()).await;
    }
    match text {
        "/help" | keyboards::BTN_HELP => {
            bot.send_message(msg.chat.id, HELP).await?;
        }
        "/admin" => admin::start_panel(&bot, &app, &msg).await?,
        "/mv" | keyboards::BTN_ALL_MOVIES => list_movies(&bot, &app, msg.chat.id).await?,
        "/sr" | keyboards::BTN_ALL_SERIES => list_series(&bot, &app, msg.chat.id).await?,
        keyboards::BTN_BROWSE_YEAR => browse_years(&bot, &app, msg.chat.id).await?,
        keyboards::BTN_BROWSE_CATEGORY => browse_categories(&bot, &app, msg.chat.id).await?,
        query if !query.is_empty() && !query.starts_with('/') => {
            search(&bot, &app, msg.chat.id, query).await?;
        }
        _ => {}
    }
    Ok(())
}

async fn start(bot: &Bot, app: &App, msg: &Message, payload: &str) -> Result<()> {
    // Deep links from shared content: t.me/<bot>?start=mv_<id> / sr_<id>.
    if let Some(id) = payload.strip_prefix("mv_") {
        if let Some(movie) = db::find_movie(&app.pool, id).await? {
            delivery::deliver(
                app.api.as_ref(),
                &app.scheduler,
                &app.delivery_options(),
                &Item::movie(&movie),
                msg.chat.id,
            )
            .await?;
            return Ok(());
        }
    } else if let Some(id) = payload.strip_prefix("sr_") {
        if let Some(series) = db::find_series(&app.pool, id).await? {
            crate::callbacks::send_series_card(bot, msg.chat.id, &series).await?;
            return Ok(());
        }
    }
    bot.send_message(msg.chat.id, WELCOME)
        .reply_markup(keyboards::main_menu())
        .await?;
    Ok(())
}

async fn list_movies(bot: &Bot, app: &App, chat: ChatId) -> Result<()> {
    let movies = db::all_movies(&app.pool).await?;
    if movies.is_empty() {
        bot.send_message(chat, "No movies available yet.").await?;
        return Ok(());
    }
    bot.send_message(chat, "🎬 All Movies:")
        .reply_markup(keyboards::movie_list(&movies, 0))
        .await?;
    Ok(())
}

async fn list_series(bot: &Bot, app: &App, chat: ChatId) -> Result<()> {
    let series = db::all_series(&app.pool).await?;
    if series.is_empty() {
        bot.send_message(chat, "No series available yet.").await?;
        return Ok(());
    }
    bot.send_message(chat, "📺 All Series:")
        .reply_markup(keyboards::series_list(&series, 0))
        .await?;
    Ok(())
}

async fn browse_years(bot: &Bot, app: &App, chat: ChatId) -> Result<()> {
    let years = db::unique_years(&app.pool).await?;
    if years.is_empty() {
        bot.send_message(chat, "The catalog is empty.").await?;
        return Ok(());
    }
    bot.send_message(chat, "🗓 Select a year:")
        .reply_markup(keyboards::year_list(&years, 0))
        .await?;
    Ok(())
}

async fn browse_categories(bot: &Bot, app: &App, chat: ChatId) -> Result<()> {
    let categories = db::unique_categories(&app.pool).await?;
    if categories.is_empty() {
        bot.send_message(chat, "The catalog is empty.").await?;
        return Ok(());
    }
    bot.send_message(chat, "📚 Select a category:")
        .reply_markup(keyboards::category_list(&categories, 0))
        .await?;
    Ok(())
}

async fn search(bot: &Bot, app: &App, chat: ChatId, query: &str) -> Result<()> {
    let movies = db::search_movies(&app.pool, query).await?;
    let series = db::search_series(&app.pool, query).await?;
    if movies.is_empty() && series.is_empty() {
        bot.send_message(chat, format!("🤷 No results found for '{query}'."))
            .await?;
        return Ok(());
    }
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for movie in &movies {
        rows.push(vec![keyboards::button(
            format!("🎬 {} ({})", movie.name, movie.year),
            crate::model::CallbackAction::SelectMovie(movie.id.clone()),
        )]);
    }
    for s in &series {
        rows.push(vec![keyboards::button(
            format!("📺 {} ({})", s.name, s.year),
            crate::model::CallbackAction::SelectSeries(s.id.clone()),
        )]);
    }
    bot.send_message(chat, format!("🔎 Results for '{query}':"))
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;
    Ok(())
}
