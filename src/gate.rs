//! Force-join gate: users must be members of the configured channel before
//! the bot serves them. Admins bypass; API failures fail open.
use crate::config::Config;
use crate::keyboards;
use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberStatus, Recipient, User};
use teloxide::{ApiError, RequestError};
use tracing::{info, warn};

/// Check whether a user may proceed. Fail-open: if the membership lookup
/// errors (bot not admin in the channel, network trouble), the user passes
/// and the problem is logged instead of locking everyone out.
pub async fn is_allowed(bot: &Bot, cfg: &Config, user: &User) -> bool {
    if cfg.is_admin(user.id.0) {
        return true;
    }
    let Some(channel) = &cfg.telegram.force_join_channel else {
        return true;
    };

    let recipient = Recipient::ChannelUsername(channel.clone());
    match bot.get_chat_member(recipient, user.id).await {
        Ok(member) => {
            let ok = matches!(
                member.status(),
                ChatMemberStatus::Owner
                    | ChatMemberStatus::Administrator
                    | ChatMemberStatus::Member
                    | ChatMemberStatus::Restricted
            );
            if !ok {
                info!(user = user.id.0, channel = %channel, "denied: not a channel member");
            }
            ok
        }
        Err(err) if deny_on_error(&err) => {
            info!(user = user.id.0, channel = %channel, "denied: unknown to the channel");
            false
        }
        Err(err) => {
            warn!(?err, channel = %channel, "membership check failed; allowing user");
            true
        }
    }
}

/// An unknown user is a definitive "not a member"; every other lookup
/// failure fails open.
fn deny_on_error(err: &RequestError) -> bool {
    matches!(err, RequestError::Api(ApiError::UserNotFound))
}

/// Send the join prompt to a chat that failed the gate.
pub async fn send_join_prompt(bot: &Bot, cfg: &Config, chat: ChatId) -> Result<()> {
    let Some(channel) = &cfg.telegram.force_join_channel else {
        return Ok(());
    };
    let text = format!(
        "👋 Access denied.\n\nTo use this bot, you must first join our official channel: {channel}"
    );
    bot.send_message(chat, text)
        .reply_markup(keyboards::join_gate(channel))
        .await?;
    Ok(())
}

/// Alert text for callback-query denials.
pub fn denied_alert(channel: &str) -> String {
    format!("You have not joined {channel} yet.\n\nPlease join and then press the button again.")
}
