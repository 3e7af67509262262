//! Delivery orchestration: send a catalog item's cover and media to a chat,
//! collect the resulting message ids, and arm the deletion timer.
use crate::model::{ContentRef, DeletionJob, DeliveryResult, Movie, Series};
use crate::scheduler::Scheduler;
use crate::telegram::ChatApi;
use anyhow::Result;
use futures::future::join_all;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};
use tracing::{instrument, warn};

/// Delivery tunables derived from config.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Pause between sequential episode sends.
    pub episode_pacing: Duration,
    /// Sticker posted after each completed delivery, if configured.
    pub thank_you_sticker: Option<String>,
}

/// One deliverable unit: a movie, or a single season of a series.
#[derive(Debug, Clone)]
pub struct Item {
    pub kind: ItemKind,
    pub name: String,
    pub year: i32,
    pub cover_file_id: String,
    pub timer_minutes: u32,
}

#[derive(Debug, Clone)]
pub enum ItemKind {
    Movie {
        id: String,
        videos: Vec<String>,
    },
    SeriesSeason {
        series_id: String,
        season: u32,
        episodes: Vec<String>,
    },
}

impl Item {
    pub fn movie(movie: &Movie) -> Self {
        Self {
            kind: ItemKind::Movie {
                id: movie.id.clone(),
                videos: movie.videos.clone(),
            },
            name: movie.name.clone(),
            year: movie.year,
            cover_file_id: movie.cover_file_id.clone(),
            timer_minutes: movie.timer_minutes,
        }
    }

    /// Returns `None` when the series has no such season.
    pub fn season(series: &Series, season: u32) -> Option<Self> {
        let episodes = series.seasons.get(&season)?.clone();
        Some(Self {
            kind: ItemKind::SeriesSeason {
                series_id: series.id.clone(),
                season,
                episodes,
            },
            name: series.name.clone(),
            year: series.year,
            cover_file_id: series.cover_file_id.clone(),
            timer_minutes: series.timer_minutes,
        })
    }

    pub fn content_ref(&self) -> ContentRef {
        match &self.kind {
            ItemKind::Movie { id, .. } => ContentRef::Movie { id: id.clone() },
            ItemKind::SeriesSeason {
                series_id, season, ..
            } => ContentRef::SeriesSeason {
                series_id: series_id.clone(),
                season: *season,
            },
        }
    }

    pub fn label(&self) -> String {
        match &self.kind {
            ItemKind::Movie { .. } => self.name.clone(),
            ItemKind::SeriesSeason { season, .. } => format!("{} S{}", self.name, season),
        }
    }

    fn cover_caption(&self) -> String {
        match &self.kind {
            ItemKind::Movie { .. } => format!("🎬 {} ({})", self.name, self.year),
            ItemKind::SeriesSeason { season, .. } => {
                format!("📺 {} ({}) - Season {}", self.name, self.year, season)
            }
        }
    }
}

fn deletion_warning(minutes: u32) -> String {
    format!(
        "❗️ IMPORTANT\n\nThese files will be deleted in {minutes} minutes \
         (due to copyright issues).\n\nPlease forward them to your Saved \
         Messages and watch from there."
    )
}

/// Send an item to a chat and arm its deletion timer.
///
/// The cover photo and every media file are sent best-effort: individual
/// failures are logged and reported to the chat without aborting the batch.
/// Only a failure to reach the chat at all (the inline notice sends) makes
/// the call itself return an error.
#[instrument(skip_all, fields(label = %item.label(), chat = chat.0))]
pub async fn deliver(
    api: &dyn ChatApi,
    scheduler: &Scheduler,
    opts: &Options,
    item: &Item,
    chat: ChatId,
) -> Result<DeliveryResult> {
    let photo = match api
        .send_photo(chat, &item.cover_file_id, &item.cover_caption())
        .await
    {
        Ok(id) => Some(id),
        Err(err) => {
            warn!(?err, "failed to send cover photo");
            None
        }
    };

    let media = match &item.kind {
        ItemKind::Movie { videos, .. } => send_movie_files(api, chat, &item.name, videos).await?,
        ItemKind::SeriesSeason {
            season, episodes, ..
        } => {
            send_episodes(api, chat, &item.name, *season, episodes, opts.episode_pacing).await?
        }
    };

    let result = DeliveryResult { photo, media };

    if !result.is_empty() {
        scheduler
            .schedule(DeletionJob {
                chat,
                messages: result.all_message_ids(),
                delay: Duration::from_secs(u64::from(item.timer_minutes) * 60),
                content: item.content_ref(),
                label: item.label(),
            })
            .await;
        if item.timer_minutes > 0 {
            api.send_message(chat, &deletion_warning(item.timer_minutes), None)
                .await?;
        }
    }

    if let Some(sticker) = &opts.thank_you_sticker {
        if let Err(err) = api.send_sticker(chat, sticker).await {
            warn!(?err, "failed to send closing sticker");
        }
    }

    Ok(result)
}

/// Movie files go out concurrently: every send is issued up front, then all
/// outcomes are joined and inspected.
async fn send_movie_files(
    api: &dyn ChatApi,
    chat: ChatId,
    name: &str,
    videos: &[String],
) -> Result<Vec<MessageId>> {
    let caption = format!("🎬 {name}");
    let sends = videos
        .iter()
        .map(|file_id| api.send_video(chat, file_id, &caption));
    let outcomes = join_all(sends).await;

    let mut ids = Vec::new();
    for (idx, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(id) => ids.push(id),
            Err(err) => {
                warn!(?err, file = idx, "failed to send movie video");
                api.send_message(chat, "⚠️ An error occurred while sending a video file.", None)
                    .await?;
            }
        }
    }
    Ok(ids)
}

/// Episodes go out one at a time so caption numbering matches list order,
/// with a pacing pause between sends to stay under rate limits.
async fn send_episodes(
    api: &dyn ChatApi,
    chat: ChatId,
    name: &str,
    season: u32,
    episodes: &[String],
    pacing: Duration,
) -> Result<Vec<MessageId>> {
    let mut ids = Vec::new();
    for (idx, file_id) in episodes.iter().enumerate() {
        let episode = idx + 1;
        let caption = format!("📺 {name} - S{season}E{episode}");
        match api.send_video(chat, file_id, &caption).await {
            Ok(id) => ids.push(id),
            Err(err) => {
                warn!(?err, episode, "failed to send episode");
                api.send_message(
                    chat,
                    &format!("⚠️ An error occurred while sending episode S{season}E{episode}."),
                    None,
                )
                .await?;
            }
        }
        // No pause after the last episode; the deletion warning follows
        // immediately.
        if !pacing.is_zero() && episode < episodes.len() {
            tokio::time::sleep(pacing).await;
        }
    }
    Ok(ids)
}
