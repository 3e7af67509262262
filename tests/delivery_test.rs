mod common;

use cineverse_bot::delivery::{self, Item, Options};
use cineverse_bot::scheduler::Scheduler;
use cineverse_bot::telegram::ChatError;
use common::{Call, RecordingApi};
use std::time::Duration;
use teloxide::types::ChatId;

fn options() -> Options {
    Options {
        episode_pacing: Duration::from_millis(500),
        thank_you_sticker: None,
    }
}

const CHAT: ChatId = ChatId(42);

#[tokio::test(start_paused = true)]
async fn movie_delivery_sends_cover_then_files_then_warning() {
    let api = RecordingApi::new();
    let scheduler = Scheduler::new(api.clone());
    let movie = common::sample_movie("m1", "Inception", 15);

    let result = delivery::deliver(api.as_ref(), &scheduler, &options(), &Item::movie(&movie), CHAT)
        .await
        .unwrap();

    assert!(result.photo.is_some());
    assert_eq!(result.media.len(), 2);
    // Photo id leads the tracked set so the cover is cleaned up too.
    assert_eq!(result.all_message_ids()[0], result.photo.unwrap());

    let calls = api.calls().await;
    assert!(matches!(&calls[0], Call::Photo { caption, .. } if caption.contains("Inception")));
    let videos: Vec<_> = calls
        .iter()
        .filter(|c| matches!(c, Call::Video { .. }))
        .collect();
    assert_eq!(videos.len(), 2);
    let warnings = api.messages().await;
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("15 minutes"));
    assert_eq!(scheduler.pending().await, 1);
}

#[tokio::test(start_paused = true)]
async fn season_episodes_are_captioned_in_order() {
    let api = RecordingApi::new();
    let scheduler = Scheduler::new(api.clone());
    let series = common::sample_series("s1", "Dark", 0);
    let item = Item::season(&series, 1).unwrap();

    delivery::deliver(api.as_ref(), &scheduler, &options(), &item, CHAT)
        .await
        .unwrap();

    let captions = api.video_captions().await;
    assert_eq!(captions, vec!["📺 Dark - S1E1", "📺 Dark - S1E2"]);
}

#[tokio::test(start_paused = true)]
async fn pacing_pauses_only_between_episodes() {
    let api = RecordingApi::new();
    let scheduler = Scheduler::new(api.clone());
    let series = common::sample_series("s1", "Dark", 0);
    let item = Item::season(&series, 1).unwrap();

    let started = tokio::time::Instant::now();
    delivery::deliver(api.as_ref(), &scheduler, &options(), &item, CHAT)
        .await
        .unwrap();

    // Two episodes, one 500ms gap; a trailing pause would double this.
    assert_eq!(started.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn missing_season_yields_no_item() {
    let series = common::sample_series("s1", "Dark", 0);
    assert!(Item::season(&series, 9).is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_file_is_reported_and_excluded_from_cleanup() {
    let api = RecordingApi::new();
    let scheduler = Scheduler::new(api.clone());
    api.fail_next_video(ChatError::Other(anyhow::anyhow!("flood wait")))
        .await;
    let movie = common::sample_movie("m1", "Heat", 1);

    let result = delivery::deliver(api.as_ref(), &scheduler, &options(), &Item::movie(&movie), CHAT)
        .await
        .unwrap();

    // One of the two files failed; the failure notice went to the chat.
    assert_eq!(result.media.len(), 1);
    assert!(api
        .messages()
        .await
        .iter()
        .any(|m| m.contains("error occurred")));

    // Only the successful ids are deleted when the job fires.
    let tracked = result.all_message_ids();
    tokio::time::sleep(Duration::from_secs(61)).await;
    let deleted = api.deletes().await;
    assert_eq!(deleted.len(), tracked.len());
    for id in tracked {
        assert!(deleted.contains(&id.0));
    }
}

#[tokio::test(start_paused = true)]
async fn movie_files_are_sent_concurrently() {
    let api = RecordingApi::with_video_latency(Duration::from_millis(100));
    let scheduler = Scheduler::new(api.clone());
    let mut movie = common::sample_movie("m1", "Tenet", 0);
    movie.videos = (0..5).map(|i| format!("video_{i}")).collect();

    let started = tokio::time::Instant::now();
    delivery::deliver(
        api.as_ref(),
        &scheduler,
        &options(),
        &Item::movie(&movie),
        CHAT,
    )
    .await
    .unwrap();

    // Five sends at 100ms each overlap; sequential dispatch would need 500ms.
    assert!(started.elapsed() < Duration::from_millis(200));
    assert_eq!(api.video_captions().await.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn zero_timer_skips_warning_and_schedule() {
    let api = RecordingApi::new();
    let scheduler = Scheduler::new(api.clone());
    let movie = common::sample_movie("m1", "Alien", 0);

    delivery::deliver(api.as_ref(), &scheduler, &options(), &Item::movie(&movie), CHAT)
        .await
        .unwrap();

    assert!(api.messages().await.is_empty());
    assert_eq!(scheduler.pending().await, 0);
}

#[tokio::test(start_paused = true)]
async fn fully_failed_delivery_schedules_nothing() {
    let api = RecordingApi::new();
    let scheduler = Scheduler::new(api.clone());
    api.fail_next_photo(ChatError::Other(anyhow::anyhow!("bad file id")))
        .await;
    let mut movie = common::sample_movie("m1", "Ghost", 30);
    movie.videos.clear();

    let result = delivery::deliver(api.as_ref(), &scheduler, &options(), &Item::movie(&movie), CHAT)
        .await
        .unwrap();

    assert!(result.is_empty());
    assert!(api.messages().await.is_empty());
    assert_eq!(scheduler.pending().await, 0);
}

#[tokio::test(start_paused = true)]
async fn thank_you_sticker_failure_is_swallowed() {
    let api = RecordingApi::new();
    let scheduler = Scheduler::new(api.clone());
    api.fail_next_sticker(ChatError::Other(anyhow::anyhow!("nope")))
        .await;
    let opts = Options {
        episode_pacing: Duration::from_millis(0),
        thank_you_sticker: Some("sticker_1".to_string()),
    };
    let movie = common::sample_movie("m1", "Up", 0);

    delivery::deliver(api.as_ref(), &scheduler, &opts, &Item::movie(&movie), CHAT)
        .await
        .unwrap();

    assert!(api
        .calls()
        .await
        .iter()
        .any(|c| matches!(c, Call::Sticker { file, .. } if file == "sticker_1")));
}
