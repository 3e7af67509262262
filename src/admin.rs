//! Admin panel: a linear intake form for adding content, plus delete/rename
//! and season editing.
//!
//! In-progress form data lives in an explicit per-user [`Session`] keyed by
//! user id, cleared on completion or cancellation. A session is taken out of
//! the map while its update is being handled, so a slow network call for one
//! admin never blocks the others.
use crate::app::App;
use crate::db;
use crate::keyboards;
use crate::model::{CallbackAction, Movie, Series};
use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::UserId;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub type Sessions = Arc<Mutex<HashMap<UserId, Session>>>;

pub fn new_sessions() -> Sessions {
    Arc::new(Mutex::new(HashMap::new()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    SelectingAction,
    GetName,
    GetPhoto,
    GetYear,
    GetCategories,
    GetTimer,
    GetMovieVideos,
    GetSeasonCount,
    GetEpisodes,
    ConfirmDelete,
    SelectRenameItem,
    GetNewName,
    SelectEditSeries,
    SelectEditSeason,
    SelectEditAction,
    AddEpisodes,
    RemoveEpisodes,
}

/// All in-progress form state for one admin.
#[derive(Debug, Default)]
pub struct Session {
    pub step: Step,
    pub adding_movie: bool,
    pub name: String,
    pub cover_file_id: String,
    pub year: i32,
    pub categories: Vec<String>,
    pub timer_minutes: u32,
    pub videos: Vec<String>,
    pub seasons: BTreeMap<u32, Vec<String>>,
    pub season_total: u32,
    pub current_season: u32,
    pub rename_movie: bool,
    pub rename_id: String,
    pub edit_series_id: String,
    pub edit_season: u32,
    pub new_episodes: Vec<String>,
}

/// What an update did to the flow it was fed into.
enum Flow {
    /// Still mid-flow; the session goes back into the map.
    Continue,
    /// Completed or cancelled; the session is dropped.
    Finished,
    /// Not meant for this flow; the session goes back untouched.
    Unhandled,
}

async fn take_session(sessions: &Sessions, user: UserId) -> Option<Session> {
    sessions.lock().await.remove(&user)
}

async fn put_session(sessions: &Sessions, user: UserId, session: Session) {
    sessions.lock().await.insert(user, session);
}

/// Entry point for /admin. Non-admins are ignored.
pub async fn start_panel(bot: &Bot, app: &App, msg: &Message) -> Result<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    if !app.cfg.is_admin(user.id.0) {
        warn!(user = user.id.0, "unauthorized /admin attempt");
        return Ok(());
    }
    put_session(&app.sessions, user.id, Session::default()).await;
    bot.send_message(msg.chat.id, "Welcome to the Admin Panel. Choose an action:")
        .reply_markup(keyboards::admin_panel())
        .await?;
    Ok(())
}

/// Feed a message into an active admin session. Returns true when consumed.
pub async fn handle_message(bot: &Bot, app: &App, msg: &Message) -> Result<bool> {
    let Some(user) = msg.from() else {
        return Ok(false);
    };
    if !app.cfg.is_admin(user.id.0) {
        return Ok(false);
    }
    let Some(mut session) = take_session(&app.sessions, user.id).await else {
        return Ok(false);
    };
    match drive_message(bot, app, msg, &mut session).await {
        Ok(Flow::Continue) => {
            put_session(&app.sessions, user.id, session).await;
            Ok(true)
        }
        Ok(Flow::Finished) => Ok(true),
        Ok(Flow::Unhandled) => {
            put_session(&app.sessions, user.id, session).await;
            Ok(false)
        }
        Err(err) => {
            // A failed send leaves the flow where it was.
            put_session(&app.sessions, user.id, session).await;
            Err(err)
        }
    }
}

async fn drive_message(
    bot: &Bot,
    app: &App,
    msg: &Message,
    session: &mut Session,
) -> Result<Flow> {
    let chat = msg.chat.id;
    let text = msg.text().map(str::trim);

    if text == Some("/cancel") {
        bot.send_message(chat, "Operation cancelled.")
            .reply_markup(keyboards::main_menu())
            .await?;
        return Ok(Flow::Finished);
    }

    match session.step {
        Step::GetName => {
            let Some(name) = text.filter(|t| !t.is_empty()) else {
                bot.send_message(chat, "❌ Please send the name as text.").await?;
                return Ok(Flow::Continue);
            };
            session.name = name.to_string();
            session.step = Step::GetPhoto;
            bot.send_message(
                chat,
                format!("🖼 Great! Now, send the cover photo for '{}'.", session.name),
            )
            .reply_markup(keyboards::cancel())
            .await?;
        }
        Step::GetPhoto => {
            let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
                bot.send_message(chat, "❌ Please send a photo.").await?;
                return Ok(Flow::Continue);
            };
            session.cover_file_id = photo.file.id.clone();
            session.step = Step::GetYear;
            bot.send_message(chat, "🗓 Got it. Now enter the release year (e.g. 2023).")
                .reply_markup(keyboards::cancel())
                .await?;
        }
        Step::GetYear => match text.and_then(|t| t.parse::<i32>().ok()) {
            Some(year) => {
                session.year = year;
                session.step = Step::GetCategories;
                bot.send_message(
                    chat,
                    "📚 Enter the categories, separated by commas.\nExample: Action, Comedy, Sci-Fi",
                )
                .reply_markup(keyboards::cancel())
                .await?;
            }
            None => {
                bot.send_message(chat, "❌ Invalid year. Please enter a number (e.g. 2023).")
                    .await?;
            }
        },
        Step::GetCategories => {
            let Some(raw) = text else {
                bot.send_message(chat, "❌ Please send the categories as text.").await?;
                return Ok(Flow::Continue);
            };
            session.categories = raw
                .split(',')
                .map(|c| capitalize(c.trim()))
                .filter(|c| !c.is_empty())
                .collect();
            session.step = Step::GetTimer;
            bot.send_message(
                chat,
                "⏳ Enter the auto-delete timer in minutes (e.g. 15). Enter 0 for no timer.",
            )
            .reply_markup(keyboards::cancel())
            .await?;
        }
        Step::GetTimer => match text.and_then(|t| t.parse::<u32>().ok()) {
            Some(timer) => {
                session.timer_minutes = timer;
                if session.adding_movie {
                    session.step = Step::GetMovieVideos;
                    bot.send_message(
                        chat,
                        "🎥 Forward the movie file(s). Click 'Done Uploading' when finished.",
                    )
                    .reply_markup(keyboards::done_uploading_menu())
                    .await?;
                } else {
                    session.step = Step::GetSeasonCount;
                    bot.send_message(chat, "🔢 How many seasons does this series have?")
                        .reply_markup(keyboards::cancel())
                        .await?;
                }
            }
            None => {
                bot.send_message(chat, "❌ Invalid timer. Please enter a number (e.g. 15).")
                    .await?;
            }
        },
        Step::GetMovieVideos => {
            if let Some(video) = msg.video() {
                session.videos.push(video.file.id.clone());
                bot.send_message(
                    chat,
                    format!(
                        "✅ Video #{} received. Forward more or click Done.",
                        session.videos.len()
                    ),
                )
                .await?;
            } else if text == Some(keyboards::BTN_DONE_UPLOADING) {
                if session.videos.is_empty() {
                    bot.send_message(chat, "❌ You haven't added any videos!")
                        .reply_markup(keyboards::done_uploading_menu())
                        .await?;
                    return Ok(Flow::Continue);
                }
                let movie = Movie {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: session.name.clone(),
                    year: session.year,
                    categories: session.categories.clone(),
                    cover_file_id: session.cover_file_id.clone(),
                    timer_minutes: session.timer_minutes,
                    videos: session.videos.clone(),
                };
                db::insert_movie(&app.pool, &movie).await?;
                info!(id = %movie.id, name = %movie.name, "added movie");
                bot.send_message(chat, format!("✅ Movie '{}' added!", movie.name))
                    .reply_markup(keyboards::main_menu())
                    .await?;
                return Ok(Flow::Finished);
            }
        }
        Step::GetSeasonCount => match text.and_then(|t| t.parse::<u32>().ok()).filter(|c| *c > 0) {
            Some(count) => {
                session.season_total = count;
                session.current_season = 1;
                session.step = Step::GetEpisodes;
                bot.send_message(
                    chat,
                    "🎥 Forward all episodes for Season 1. Click 'Done Uploading' when finished.",
                )
                .reply_markup(keyboards::done_uploading_menu())
                .await?;
            }
            None => {
                bot.send_message(chat, "❌ Invalid number. Please enter a positive integer.")
                    .await?;
            }
        },
        Step::GetEpisodes => {
            let season = session.current_season;
            if let Some(video) = msg.video() {
                let episodes = session.seasons.entry(season).or_default();
                episodes.push(video.file.id.clone());
                let count = episodes.len();
                bot.send_message(chat, format!("✅ Season {season}, Episode #{count} received."))
                    .await?;
            } else if text == Some(keyboards::BTN_DONE_UPLOADING) {
                if session.seasons.get(&season).map_or(true, Vec::is_empty) {
                    bot.send_message(
                        chat,
                        format!("❌ You haven't added episodes for Season {season}!"),
                    )
                    .reply_markup(keyboards::done_uploading_menu())
                    .await?;
                    return Ok(Flow::Continue);
                }
                if season < session.season_total {
                    session.current_season += 1;
                    bot.send_message(
                        chat,
                        format!(
                            "🎥 Season {season} done. Forward episodes for Season {}.",
                            session.current_season
                        ),
                    )
                    .reply_markup(keyboards::done_uploading_menu())
                    .await?;
                } else {
                    let series = Series {
                        id: uuid::Uuid::new_v4().to_string(),
                        name: session.name.clone(),
                        year: session.year,
                        categories: session.categories.clone(),
                        cover_file_id: session.cover_file_id.clone(),
                        timer_minutes: session.timer_minutes,
                        seasons: session.seasons.clone(),
                    };
                    db::insert_series(&app.pool, &series).await?;
                    info!(id = %series.id, name = %series.name, "added series");
                    bot.send_message(chat, format!("✅ Series '{}' added!", series.name))
                        .reply_markup(keyboards::main_menu())
                        .await?;
                    return Ok(Flow::Finished);
                }
            }
        }
        Step::GetNewName => {
            let Some(new_name) = text.filter(|t| !t.is_empty()) else {
                bot.send_message(chat, "❌ Please send the new name as text.").await?;
                return Ok(Flow::Continue);
            };
            let renamed = if session.rename_movie {
                db::rename_movie(&app.pool, &session.rename_id, new_name).await?
            } else {
                db::rename_series(&app.pool, &session.rename_id, new_name).await?
            };
            let reply = if renamed {
                format!("✅ Successfully renamed to '{new_name}'.")
            } else {
                "❌ Content not found.".to_string()
            };
            bot.send_message(chat, reply)
                .reply_markup(keyboards::main_menu())
                .await?;
            return Ok(Flow::Finished);
        }
        Step::AddEpisodes => {
            if let Some(video) = msg.video() {
                session.new_episodes.push(video.file.id.clone());
                bot.send_message(
                    chat,
                    format!("✅ Episode received ({} new so far).", session.new_episodes.len()),
                )
                .await?;
            } else if text == Some(keyboards::BTN_DONE_UPLOADING) {
                if session.new_episodes.is_empty() {
                    bot.send_message(chat, "❌ You haven't added any episodes!")
                        .reply_markup(keyboards::done_uploading_menu())
                        .await?;
                    return Ok(Flow::Continue);
                }
                let series_id = session.edit_series_id.clone();
                let season = session.edit_season;
                let reply = match db::find_series(&app.pool, &series_id).await? {
                    Some(series) => {
                        let mut episodes =
                            series.seasons.get(&season).cloned().unwrap_or_default();
                        let added = session.new_episodes.len();
                        episodes.extend(session.new_episodes.drain(..));
                        db::set_season_episodes(&app.pool, &series_id, season, episodes).await?;
                        format!(
                            "✅ Added {added} episode(s) to Season {season} of '{}'!",
                            series.name
                        )
                    }
                    None => "❌ Series or season not found!".to_string(),
                };
                bot.send_message(chat, reply)
                    .reply_markup(keyboards::main_menu())
                    .await?;
                return Ok(Flow::Finished);
            }
        }
        // Callback-driven steps ignore plain messages.
        _ => return Ok(Flow::Unhandled),
    }
    Ok(Flow::Continue)
}

/// Feed a parsed callback action into the admin flow. Returns true when
/// consumed. The caller answers the callback query itself.
pub async fn handle_callback(
    bot: &Bot,
    app: &App,
    q: &CallbackQuery,
    action: &CallbackAction,
) -> Result<bool> {
    if !app.cfg.is_admin(q.from.id.0) {
        return Ok(false);
    }
    let Some(message) = &q.message else {
        return Ok(false);
    };
    let Some(mut session) = take_session(&app.sessions, q.from.id).await else {
        return Ok(false);
    };
    let chat = message.chat.id;
    let msg_id = message.id;
    match drive_callback(bot, app, chat, msg_id, action, &mut session).await {
        Ok(Flow::Continue) => {
            put_session(&app.sessions, q.from.id, session).await;
            Ok(true)
        }
        Ok(Flow::Finished) => Ok(true),
        Ok(Flow::Unhandled) => {
            put_session(&app.sessions, q.from.id, session).await;
            Ok(false)
        }
        Err(err) => {
            put_session(&app.sessions, q.from.id, session).await;
            Err(err)
        }
    }
}

async fn drive_callback(
    bot: &Bot,
    app: &App,
    chat: ChatId,
    msg_id: teloxide::types::MessageId,
    action: &CallbackAction,
    session: &mut Session,
) -> Result<Flow> {
    if matches!(action, CallbackAction::AdminCancel) {
        bot.edit_message_text(chat, msg_id, "Operation cancelled. Use /admin to start again.")
            .await?;
        return Ok(Flow::Finished);
    }

    match (session.step, action) {
        (Step::SelectingAction, CallbackAction::AdminAddMovie | CallbackAction::AdminAddSeries) => {
            let movie = matches!(action, CallbackAction::AdminAddMovie);
            *session = Session {
                step: Step::GetName,
                adding_movie: movie,
                ..Session::default()
            };
            let kind = if movie { "Movie" } else { "Series" };
            bot.edit_message_text(chat, msg_id, format!("🎬 Send the name for the new {kind}."))
                .reply_markup(keyboards::cancel())
                .await?;
        }
        (
            Step::SelectingAction,
            CallbackAction::AdminDeleteMovie | CallbackAction::AdminDeleteSeries,
        ) => {
            let movie = matches!(action, CallbackAction::AdminDeleteMovie);
            let items = pick_items(app, movie).await?;
            if items.is_empty() {
                bot.edit_message_text(chat, msg_id, "Nothing to delete.").await?;
                return Ok(Flow::Continue);
            }
            session.step = Step::ConfirmDelete;
            bot.edit_message_text(chat, msg_id, "Select the item to delete:")
                .reply_markup(keyboards::admin_pick_list(&items, movie, false))
                .await?;
        }
        (Step::ConfirmDelete, CallbackAction::DeleteItem { movie, id }) => {
            let deleted = if *movie {
                db::delete_movie(&app.pool, id).await?
            } else {
                db::delete_series(&app.pool, id).await?
            };
            let reply = if deleted {
                "✅ Successfully deleted."
            } else {
                "❌ Content not found or already deleted."
            };
            session.step = Step::SelectingAction;
            bot.edit_message_text(chat, msg_id, reply).await?;
            bot.send_message(chat, "Admin Panel:")
                .reply_markup(keyboards::admin_panel())
                .await?;
        }
        (
            Step::SelectingAction,
            CallbackAction::AdminRenameMovie | CallbackAction::AdminRenameSeries,
        ) => {
            let movie = matches!(action, CallbackAction::AdminRenameMovie);
            let items = pick_items(app, movie).await?;
            if items.is_empty() {
                bot.edit_message_text(chat, msg_id, "Nothing to rename.").await?;
                return Ok(Flow::Continue);
            }
            session.step = Step::SelectRenameItem;
            bot.edit_message_text(chat, msg_id, "Select the item to rename:")
                .reply_markup(keyboards::admin_pick_list(&items, movie, true))
                .await?;
        }
        (Step::SelectRenameItem, CallbackAction::RenameItem { movie, id }) => {
            let current = if *movie {
                db::find_movie(&app.pool, id).await?.map(|m| m.name)
            } else {
                db::find_series(&app.pool, id).await?.map(|s| s.name)
            };
            let Some(current) = current else {
                bot.edit_message_text(chat, msg_id, "Content not found.").await?;
                return Ok(Flow::Finished);
            };
            session.rename_movie = *movie;
            session.rename_id = id.clone();
            session.step = Step::GetNewName;
            bot.edit_message_text(
                chat,
                msg_id,
                format!("Current name: {current}\n\nPlease send the new name."),
            )
            .reply_markup(keyboards::cancel())
            .await?;
        }
        (
            Step::SelectingAction
            | Step::SelectEditSeries
            | Step::SelectEditSeason
            | Step::SelectEditAction
            | Step::RemoveEpisodes,
            CallbackAction::AdminEditSeries,
        ) => {
            let series = db::all_series(&app.pool).await?;
            if series.is_empty() {
                bot.edit_message_text(chat, msg_id, "No series available to edit.").await?;
                return Ok(Flow::Finished);
            }
            session.step = Step::SelectEditSeries;
            bot.edit_message_text(chat, msg_id, "Select a series to edit:")
                .reply_markup(keyboards::edit_series_list(&series, 0))
                .await?;
        }
        (Step::SelectEditSeries, CallbackAction::EditSeriesPage(page)) => {
            let series = db::all_series(&app.pool).await?;
            bot.edit_message_text(chat, msg_id, "Select a series to edit:")
                .reply_markup(keyboards::edit_series_list(&series, *page))
                .await?;
        }
        (Step::SelectEditSeries, CallbackAction::EditSeriesSelect(id)) => {
            let Some(series) = db::find_series(&app.pool, id).await? else {
                bot.edit_message_text(chat, msg_id, "Series not found.").await?;
                return Ok(Flow::Finished);
            };
            session.edit_series_id = id.clone();
            session.step = Step::SelectEditSeason;
            bot.edit_message_text(
                chat,
                msg_id,
                format!("Editing: {}\n\nSelect a season to edit:", series.name),
            )
            .reply_markup(keyboards::edit_season_list(&series))
            .await?;
        }
        (Step::SelectEditSeason, CallbackAction::EditSeasonSelect { series_id, season }) => {
            let episodes = db::find_series(&app.pool, series_id)
                .await?
                .and_then(|s| s.seasons.get(season).map(Vec::len));
            let Some(count) = episodes else {
                bot.edit_message_text(chat, msg_id, "Season not found.").await?;
                return Ok(Flow::Finished);
            };
            session.edit_series_id = series_id.clone();
            session.edit_season = *season;
            session.step = Step::SelectEditAction;
            bot.edit_message_text(
                chat,
                msg_id,
                format!("Season {season} - {count} episodes\n\nWhat would you like to do?"),
            )
            .reply_markup(keyboards::edit_actions())
            .await?;
        }
        (Step::SelectEditAction, CallbackAction::EditActionAdd) => {
            let series_id = session.edit_series_id.clone();
            let season = session.edit_season;
            let existing = db::find_series(&app.pool, &series_id)
                .await?
                .and_then(|s| s.seasons.get(&season).map(Vec::len))
                .unwrap_or(0);
            session.new_episodes.clear();
            session.step = Step::AddEpisodes;
            bot.edit_message_text(
                chat,
                msg_id,
                format!(
                    "📹 Season {season} currently has {existing} episodes.\n\nForward the new \
                     episode videos; they will be numbered from Episode {}.",
                    existing + 1
                ),
            )
            .await?;
            bot.send_message(chat, "Click 'Done Uploading' when finished.")
                .reply_markup(keyboards::done_uploading_menu())
                .await?;
        }
        (Step::SelectEditAction, CallbackAction::EditActionRemove) => {
            let series_id = session.edit_series_id.clone();
            let season = session.edit_season;
            let count = db::find_series(&app.pool, &series_id)
                .await?
                .and_then(|s| s.seasons.get(&season).map(Vec::len))
                .unwrap_or(0);
            if count == 0 {
                bot.edit_message_text(chat, msg_id, "No episodes to remove.").await?;
                return Ok(Flow::Finished);
            }
            session.step = Step::RemoveEpisodes;
            bot.edit_message_text(chat, msg_id, format!("Season {season} - select episodes to remove:"))
                .reply_markup(keyboards::remove_episode_list(&series_id, season, count))
                .await?;
        }
        (
            Step::RemoveEpisodes,
            CallbackAction::RemoveEpisode {
                series_id,
                season,
                index,
            },
        ) => {
            let Some(series) = db::find_series(&app.pool, series_id).await? else {
                bot.edit_message_text(chat, msg_id, "Season not found.").await?;
                return Ok(Flow::Finished);
            };
            let mut episodes = series.seasons.get(season).cloned().unwrap_or_default();
            if *index >= episodes.len() {
                bot.edit_message_text(chat, msg_id, "Episode not found.").await?;
                return Ok(Flow::Continue);
            }
            episodes.remove(*index);
            let remaining = episodes.len();
            db::set_season_episodes(&app.pool, series_id, *season, episodes).await?;
            if remaining == 0 {
                bot.edit_message_text(
                    chat,
                    msg_id,
                    format!("✅ Episode removed. No episodes left in Season {season}."),
                )
                .await?;
                return Ok(Flow::Finished);
            }
            bot.edit_message_text(
                chat,
                msg_id,
                format!(
                    "✅ Episode removed. Season {season} now has {remaining} episode(s). \
                     Select another to remove or click Done:"
                ),
            )
            .reply_markup(keyboards::remove_episode_list(series_id, *season, remaining))
            .await?;
        }
        _ => return Ok(Flow::Unhandled),
    }
    Ok(Flow::Continue)
}

async fn pick_items(app: &App, movie: bool) -> Result<Vec<(String, String)>> {
    if movie {
        Ok(db::all_movies(&app.pool)
            .await?
            .into_iter()
            .map(|m| (m.id, m.name))
            .collect())
    } else {
        Ok(db::all_series(&app.pool)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_trims_nothing_but_uppercases_first() {
        assert_eq!(capitalize("action"), "Action");
        assert_eq!(capitalize("Sci-fi"), "Sci-fi");
        assert_eq!(capitalize(""), "");
    }

    #[tokio::test]
    async fn checked_out_session_leaves_the_map_unlocked() {
        let sessions = new_sessions();
        put_session(&sessions, UserId(1), Session::default()).await;

        let taken = take_session(&sessions, UserId(1)).await.unwrap();
        assert!(take_session(&sessions, UserId(1)).await.is_none());

        // Another admin can start a flow while the first update is in flight.
        put_session(&sessions, UserId(2), Session::default()).await;
        assert!(sessions.lock().await.contains_key(&UserId(2)));

        put_session(&sessions, UserId(1), taken).await;
        assert!(take_session(&sessions, UserId(1)).await.is_some());
    }
}
