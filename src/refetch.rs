//! Reacts to the "get again" button a cleanup job leaves behind: resolve the
//! content against the live catalog and run a fresh delivery, making the
//! delete-then-refetch loop repeatable.
use crate::db::{self, Pool};
use crate::delivery::{self, Item, Options};
use crate::model::ContentRef;
use crate::scheduler::Scheduler;
use crate::telegram::ChatApi;
use anyhow::Result;
use teloxide::types::{ChatId, MessageId};
use tracing::{instrument, warn};

#[instrument(skip_all, fields(chat = chat.0))]
pub async fn handle(
    api: &dyn ChatApi,
    pool: &Pool,
    scheduler: &Scheduler,
    opts: &Options,
    content: &ContentRef,
    chat: ChatId,
    prompt: MessageId,
) -> Result<()> {
    let Some(item) = resolve(pool, content).await? else {
        // The catalog moved on while the prompt sat in the chat.
        if let Err(err) = api
            .edit_message_text(chat, prompt, "❌ This content is no longer available.")
            .await
        {
            warn!(?err, "failed to edit stale get-again prompt");
        }
        return Ok(());
    };

    let notice = format!("Re-sending files for '{}'...", item.label());
    if let Err(err) = api.edit_message_text(chat, prompt, &notice).await {
        warn!(?err, "failed to edit get-again prompt");
    }

    delivery::deliver(api, scheduler, opts, &item, chat).await?;
    Ok(())
}

async fn resolve(pool: &Pool, content: &ContentRef) -> Result<Option<Item>> {
    match content {
        ContentRef::Movie { id } => Ok(db::find_movie(pool, id).await?.map(|m| Item::movie(&m))),
        ContentRef::SeriesSeason { series_id, season } => {
            let Some(series) = db::find_series(pool, series_id).await? else {
                return Ok(None);
            };
            Ok(Item::season(&series, *season))
        }
    }
}
