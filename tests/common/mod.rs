#![allow(dead_code)]

use async_trait::async_trait;
use cineverse_bot::telegram::{ChatApi, ChatError, ChatResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId};
use tokio::sync::Mutex;

/// One observed call against the fake Telegram API.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Photo {
        chat: i64,
        file: String,
        caption: String,
    },
    Video {
        chat: i64,
        file: String,
        caption: String,
    },
    Message {
        chat: i64,
        text: String,
        has_keyboard: bool,
    },
    Sticker {
        chat: i64,
        file: String,
    },
    Delete {
        chat: i64,
        message: i32,
    },
    Edit {
        chat: i64,
        message: i32,
        text: String,
    },
}

/// Recording double for [`ChatApi`]. Every call is appended to `calls`;
/// per-method failure queues let a test script errors for the next N calls
/// (an empty queue means success). Message ids are handed out from a
/// monotonically increasing counter.
pub struct RecordingApi {
    pub calls: Mutex<Vec<Call>>,
    next_id: AtomicI32,
    photo_failures: Mutex<VecDeque<ChatError>>,
    video_failures: Mutex<VecDeque<ChatError>>,
    message_failures: Mutex<VecDeque<ChatError>>,
    sticker_failures: Mutex<VecDeque<ChatError>>,
    delete_failures: Mutex<VecDeque<ChatError>>,
    edit_failures: Mutex<VecDeque<ChatError>>,
    /// Simulated network latency per video send, for concurrency tests
    /// running under a paused clock.
    pub video_latency: Option<Duration>,
}

impl RecordingApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(1),
            photo_failures: Mutex::new(VecDeque::new()),
            video_failures: Mutex::new(VecDeque::new()),
            message_failures: Mutex::new(VecDeque::new()),
            sticker_failures: Mutex::new(VecDeque::new()),
            delete_failures: Mutex::new(VecDeque::new()),
            edit_failures: Mutex::new(VecDeque::new()),
            video_latency: None,
        })
    }

    pub fn with_video_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            video_latency: Some(latency),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(1),
            photo_failures: Mutex::new(VecDeque::new()),
            video_failures: Mutex::new(VecDeque::new()),
            message_failures: Mutex::new(VecDeque::new()),
            sticker_failures: Mutex::new(VecDeque::new()),
            delete_failures: Mutex::new(VecDeque::new()),
            edit_failures: Mutex::new(VecDeque::new()),
        })
    }

    pub async fn fail_next_photo(&self, err: ChatError) {
        self.photo_failures.lock().await.push_back(err);
    }

    pub async fn fail_next_video(&self, err: ChatError) {
        self.video_failures.lock().await.push_back(err);
    }

    pub async fn fail_next_message(&self, err: ChatError) {
        self.message_failures.lock().await.push_back(err);
    }

    pub async fn fail_next_sticker(&self, err: ChatError) {
        self.sticker_failures.lock().await.push_back(err);
    }

    pub async fn fail_next_delete(&self, err: ChatError) {
        self.delete_failures.lock().await.push_back(err);
    }

    pub async fn fail_next_edit(&self, err: ChatError) {
        self.edit_failures.lock().await.push_back(err);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn deletes(&self) -> Vec<i32> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub async fn messages(&self) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| match c {
                Call::Message { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub async fn video_captions(&self) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| match c {
                Call::Video { caption, .. } => Some(caption),
                _ => None,
            })
            .collect()
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl ChatApi for RecordingApi {
    async fn send_photo(
        &self,
        chat: ChatId,
        file_id: &str,
        caption: &str,
    ) -> ChatResult<MessageId> {
        self.calls.lock().await.push(Call::Photo {
            chat: chat.0,
            file: file_id.to_string(),
            caption: caption.to_string(),
        });
        if let Some(err) = self.photo_failures.lock().await.pop_front() {
            return Err(err);
        }
        Ok(self.next_id())
    }

    async fn send_video(
        &self,
        chat: ChatId,
        file_id: &str,
        caption: &str,
    ) -> ChatResult<MessageId> {
        if let Some(latency) = self.video_latency {
            tokio::time::sleep(latency).await;
        }
        self.calls.lock().await.push(Call::Video {
            chat: chat.0,
            file: file_id.to_string(),
            caption: caption.to_string(),
        });
        if let Some(err) = self.video_failures.lock().await.pop_front() {
            return Err(err);
        }
        Ok(self.next_id())
    }

    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> ChatResult<MessageId> {
        self.calls.lock().await.push(Call::Message {
            chat: chat.0,
            text: text.to_string(),
            has_keyboard: keyboard.is_some(),
        });
        if let Some(err) = self.message_failures.lock().await.pop_front() {
            return Err(err);
        }
        Ok(self.next_id())
    }

    async fn send_sticker(&self, chat: ChatId, file_id: &str) -> ChatResult<MessageId> {
        self.calls.lock().await.push(Call::Sticker {
            chat: chat.0,
            file: file_id.to_string(),
        });
        if let Some(err) = self.sticker_failures.lock().await.pop_front() {
            return Err(err);
        }
        Ok(self.next_id())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> ChatResult<()> {
        self.calls.lock().await.push(Call::Delete {
            chat: chat.0,
            message: message.0,
        });
        if let Some(err) = self.delete_failures.lock().await.pop_front() {
            return Err(err);
        }
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> ChatResult<()> {
        self.calls.lock().await.push(Call::Edit {
            chat: chat.0,
            message: message.0,
            text: text.to_string(),
        });
        if let Some(err) = self.edit_failures.lock().await.pop_front() {
            return Err(err);
        }
        Ok(())
    }
}

pub async fn setup_pool() -> sqlx::SqlitePool {
    // Tests run with tokio's clock paused, where opening a fresh sqlite
    // connection always loses the race against the pool's auto-advanced
    // acquire timeout. Pin the pool to the single connection opened here
    // (which also keeps every query on the same in-memory database) and
    // drop the timers that would discard it.
    let pool = sqlx::pool::PoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .test_before_acquire(false)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

pub fn sample_movie(id: &str, name: &str, timer_minutes: u32) -> cineverse_bot::model::Movie {
    cineverse_bot::model::Movie {
        id: id.to_string(),
        name: name.to_string(),
        year: 2023,
        categories: vec!["Action".to_string()],
        cover_file_id: format!("cover_{id}"),
        timer_minutes,
        videos: vec![format!("video_{id}_1"), format!("video_{id}_2")],
    }
}

pub fn sample_series(id: &str, name: &str, timer_minutes: u32) -> cineverse_bot::model::Series {
    let mut seasons = std::collections::BTreeMap::new();
    seasons.insert(1, vec![format!("ep_{id}_s1e1"), format!("ep_{id}_s1e2")]);
    seasons.insert(2, vec![format!("ep_{id}_s2e1")]);
    cineverse_bot::model::Series {
        id: id.to_string(),
        name: name.to_string(),
        year: 2024,
        categories: vec!["Drama".to_string()],
        cover_file_id: format!("cover_{id}"),
        timer_minutes,
        seasons,
    }
}
