//! Body of a fired deletion job.
use crate::keyboards;
use crate::model::DeletionJob;
use crate::telegram::{ChatApi, ChatError};
use tracing::{error, info, warn};

/// Delete every message recorded by the job, then leave a "get again" prompt
/// scoped to the delivered content.
///
/// Messages the user already deleted count as successes. Any other per-message
/// failure is logged and the remaining messages are still attempted.
pub async fn run(api: &dyn ChatApi, job: DeletionJob) {
    let total = job.messages.len();
    let mut deleted = 0usize;
    for message in &job.messages {
        match api.delete_message(job.chat, *message).await {
            Ok(()) => deleted += 1,
            Err(ChatError::NotFound) => {
                // User beat us to it.
                deleted += 1;
            }
            Err(err) => warn!(
                ?err,
                chat = job.chat.0,
                message = message.0,
                "could not delete message"
            ),
        }
    }
    info!(deleted, total, label = %job.label, "cleaned up delivered content");

    if total == 0 {
        return;
    }

    let text = format!(
        "✅ The files for '{}' have been deleted.\n\nClick the button below to get them again.",
        job.label
    );
    match api
        .send_message(job.chat, &text, Some(keyboards::fetch_again(&job.content)))
        .await
    {
        Ok(_) => {}
        Err(ChatError::Blocked) => {
            warn!(chat = job.chat.0, "bot blocked; skipping get-again prompt");
        }
        Err(err) => error!(?err, chat = job.chat.0, "failed to send get-again prompt"),
    }
}
