use crate::models::Account;
use crate::provider::ImgurProvider;
use botkit::config::Configuration;
use botkit::transport::{RequestDescriptor, Transport};
use botkit::{Bot, BotError};
use std::sync::Arc;

/// Imgur bot: the generic [`Bot`] wired to [`ImgurProvider`], plus the
/// Imgur API capabilities.
pub struct Imgur {
    bot: Bot,
}

impl Imgur {
    pub fn new(transport: Arc<dyn Transport>, configuration: Configuration) -> Self {
        Self::from_bot(Bot::new(Arc::new(ImgurProvider), transport, configuration))
    }

    /// Wraps an already configured bot (custom defaults, timeout, …).
    pub fn from_bot(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// `GET account/me`: the account owning the current access token.
    pub async fn my_account(&self) -> Result<Account, BotError> {
        self.bot
            .prepare_request(RequestDescriptor::get("account/me"))
            .await
    }
}
