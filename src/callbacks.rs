//! Callback-query dispatch. Tokens are parsed once into a
//! [`CallbackAction`] and routed; unknown or stale tokens are answered and
//! dropped.
use crate::admin;
use crate::app::App;
use crate::db;
use crate::delivery::{self, Item};
use crate::gate;
use crate::keyboards;
use crate::model::CallbackAction;
use crate::refetch;
use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, Message};
use tracing::{instrument, warn};

#[instrument(skip_all, fields(user = q.from.id.0))]
pub async fn handle_callback(bot: Bot, app: Arc<App>, q: CallbackQuery) -> Result<()> {
    // Telegram accepts a single answer per query id, so each path below
    // answers exactly once: with the denial alert, or plainly.
    let Some(data) = q.data.as_deref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let Some(action) = CallbackAction::parse(data) else {
        warn!(data, "unrecognized callback token");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    if matches!(action, CallbackAction::CheckJoin) {
        return check_join(&bot, &app, &q).await;
    }

    if !gate::is_allowed(&bot, &app.cfg, &q.from).await {
        answer_denied(&bot, &app, &q).await?;
        return Ok(());
    }

    bot.answer_callback_query(q.id.clone()).await?;

    if matches!(action, CallbackAction::NoOp) {
        return Ok(());
    }

    if admin::handle_callback(&bot, &app, &q, &action).await? {
        return Ok(());
    }

    let Some(message) = &q.message else {
        return Ok(());
    };

    match action {
        CallbackAction::SelectMovie(id) => select_movie(&bot, &app, message, &id).await?,
        CallbackAction::SelectSeries(id) => select_series(&bot, &app, message, &id).await?,
        CallbackAction::SelectSeason { series_id, season } => {
            select_season(&bot, &app, message, &series_id, season).await?;
        }
        CallbackAction::MoviePage(page) => {
            let movies = db::all_movies(&app.pool).await?;
            bot.edit_message_text(message.chat.id, message.id, "🎬 All Movies:")
                .reply_markup(keyboards::movie_list(&movies, page))
                .await?;
        }
        CallbackAction::SeriesPage(page) => {
            let series = db::all_series(&app.pool).await?;
            bot.edit_message_text(message.chat.id, message.id, "📺 All Series:")
                .reply_markup(keyboards::series_list(&series, page))
                .await?;
        }
        CallbackAction::YearPage(page) => {
            let years = db::unique_years(&app.pool).await?;
            bot.edit_message_text(message.chat.id, message.id, "🗓 Select a year:")
                .reply_markup(keyboards::year_list(&years, page))
                .await?;
        }
        CallbackAction::SelectYear(year) => {
            bot.edit_message_text(
                message.chat.id,
                message.id,
                format!("🗓 {year} - what are you looking for?"),
            )
            .reply_markup(keyboards::year_content(year))
            .await?;
        }
        CallbackAction::YearContent { year, movies } => {
            year_content(&bot, &app, message, year, movies).await?;
        }
        CallbackAction::CategoryPage(page) => {
            let categories = db::unique_categories(&app.pool).await?;
            bot.edit_message_text(message.chat.id, message.id, "📚 Select a category:")
                .reply_markup(keyboards::category_list(&categories, page))
                .await?;
        }
        CallbackAction::SelectCategory(category) => {
            bot.edit_message_text(
                message.chat.id,
                message.id,
                format!("📚 {category} - what are you looking for?"),
            )
            .reply_markup(keyboards::category_content(&category))
            .await?;
        }
        CallbackAction::CategoryContent { category, movies } => {
            category_content(&bot, &app, message, &category, movies).await?;
        }
        CallbackAction::Refetch(content) => {
            refetch::handle(
                app.api.as_ref(),
                &app.pool,
                &app.scheduler,
                &app.delivery_options(),
                &content,
                message.chat.id,
                message.id,
            )
            .await?;
        }
        CallbackAction::BackToMain => {
            bot.delete_message(message.chat.id, message.id).await?;
            bot.send_message(message.chat.id, "What would you like to browse?")
                .reply_markup(keyboards::main_menu())
                .await?;
        }
        CallbackAction::BackToYears => {
            let years = db::unique_years(&app.pool).await?;
            bot.edit_message_text(message.chat.id, message.id, "🗓 Select a year:")
                .reply_markup(keyboards::year_list(&years, 0))
                .await?;
        }
        CallbackAction::BackToCategories => {
            let categories = db::unique_categories(&app.pool).await?;
            bot.edit_message_text(message.chat.id, message.id, "📚 Select a category:")
                .reply_markup(keyboards::category_list(&categories, 0))
                .await?;
        }
        _ => {
            // Admin action without a live session.
            warn!(data, "callback matched no active flow");
        }
    }
    Ok(())
}

async fn check_join(bot: &Bot, app: &App, q: &CallbackQuery) -> Result<()> {
    if gate::is_allowed(bot, &app.cfg, &q.from).await {
        bot.answer_callback_query(q.id.clone()).await?;
        if let Some(message) = &q.message {
            bot.delete_message(message.chat.id, message.id).await?;
            bot.send_message(message.chat.id, "✅ Thanks for joining! You're all set.")
                .reply_markup(keyboards::main_menu())
                .await?;
        }
    } else {
        answer_denied(bot, app, q).await?;
    }
    Ok(())
}

/// The single answer for a denied tap: an on-screen alert naming the channel
/// when one is configured, a plain ack otherwise.
async fn answer_denied(bot: &Bot, app: &App, q: &CallbackQuery) -> Result<()> {
    let answer = bot.answer_callback_query(q.id.clone());
    match denial_text(&app.cfg) {
        Some(text) => {
            answer.text(text).show_alert(true).await?;
        }
        None => {
            answer.await?;
        }
    }
    Ok(())
}

fn denial_text(cfg: &crate::config::Config) -> Option<String> {
    cfg.telegram
        .force_join_channel
        .as_deref()
        .map(gate::denied_alert)
}

async fn select_movie(bot: &Bot, app: &App, message: &Message, id: &str) -> Result<()> {
    let Some(movie) = db::find_movie(&app.pool, id).await? else {
        bot.edit_message_text(
            message.chat.id,
            message.id,
            "❌ This content is no longer available.",
        )
        .await?;
        return Ok(());
    };
    // The menu message is replaced by the delivery itself.
    bot.delete_message(message.chat.id, message.id).await?;
    delivery::deliver(
        app.api.as_ref(),
        &app.scheduler,
        &app.delivery_options(),
        &Item::movie(&movie),
        message.chat.id,
    )
    .await?;
    Ok(())
}

async fn select_series(bot: &Bot, app: &App, message: &Message, id: &str) -> Result<()> {
    let Some(series) = db::find_series(&app.pool, id).await? else {
        bot.edit_message_text(
            message.chat.id,
            message.id,
            "❌ This content is no longer available.",
        )
        .await?;
        return Ok(());
    };
    bot.delete_message(message.chat.id, message.id).await?;
    send_series_card(bot, message.chat.id, &series).await?;
    Ok(())
}

/// Cover photo plus the season picker for one series.
pub async fn send_series_card(
    bot: &Bot,
    chat: ChatId,
    series: &crate::model::Series,
) -> Result<()> {
    let caption = format!("📺 {} ({})\n\nSelect a season:", series.name, series.year);
    bot.send_photo(chat, InputFile::file_id(&series.cover_file_id))
        .caption(caption)
        .reply_markup(keyboards::season_list(series))
        .await?;
    Ok(())
}

async fn select_season(
    bot: &Bot,
    app: &App,
    message: &Message,
    series_id: &str,
    season: u32,
) -> Result<()> {
    let item = db::find_series(&app.pool, series_id)
        .await?
        .and_then(|s| Item::season(&s, season));
    let Some(item) = item else {
        bot.edit_message_caption(message.chat.id, message.id)
            .caption("❌ This content is no longer available.")
            .await?;
        return Ok(());
    };
    bot.delete_message(message.chat.id, message.id).await?;
    delivery::deliver(
        app.api.as_ref(),
        &app.scheduler,
        &app.delivery_options(),
        &item,
        message.chat.id,
    )
    .await?;
    Ok(())
}

async fn year_content(
    bot: &Bot,
    app: &App,
    message: &Message,
    year: i32,
    movies: bool,
) -> Result<()> {
    if movies {
        let items = db::movies_by_year(&app.pool, year).await?;
        if items.is_empty() {
            bot.edit_message_text(message.chat.id, message.id, format!("No movies from {year}."))
                .reply_markup(keyboards::year_content(year))
                .await?;
            return Ok(());
        }
        bot.edit_message_text(message.chat.id, message.id, format!("🎬 Movies from {year}:"))
            .reply_markup(keyboards::movie_list(&items, 0))
            .await?;
    } else {
        let items = db::series_by_year(&app.pool, year).await?;
        if items.is_empty() {
            bot.edit_message_text(message.chat.id, message.id, format!("No series from {year}."))
                .reply_markup(keyboards::year_content(year))
                .await?;
            return Ok(());
        }
        bot.edit_message_text(message.chat.id, message.id, format!("📺 Series from {year}:"))
            .reply_markup(keyboards::series_list(&items, 0))
            .await?;
    }
    Ok(())
}

async fn category_content(
    bot: &Bot,
    app: &App,
    message: &Message,
    category: &str,
    movies: bool,
) -> Result<()> {
    if movies {
        let items = db::movies_by_category(&app.pool, category).await?;
        if items.is_empty() {
            bot.edit_message_text(
                message.chat.id,
                message.id,
                format!("No movies in {category}."),
            )
            .reply_markup(keyboards::category_content(category))
            .await?;
            return Ok(());
        }
        bot.edit_message_text(
            message.chat.id,
            message.id,
            format!("🎬 {category} movies:"),
        )
        .reply_markup(keyboards::movie_list(&items, 0))
        .await?;
    } else {
        let items = db::series_by_category(&app.pool, category).await?;
        if items.is_empty() {
            bot.edit_message_text(
                message.chat.id,
                message.id,
                format!("No series in {category}."),
            )
            .reply_markup(keyboards::category_content(category))
            .await?;
            return Ok(());
        }
        bot.edit_message_text(
            message.chat.id,
            message.id,
            format!("📺 {category} series:"),
        )
        .reply_markup(keyboards::series_list(&items, 0))
        .await?;
    }
    Ok(())
}
