//! `me`: fetch the authenticated account.
//!
//! Endpoint: `GET account/me`. Extra arguments are ignored.

use crate::adapter::Imgur;
use crate::models::Account;
use async_trait::async_trait;
use botkit::{BotError, Job, Model};

pub async fn run(bot: &Imgur, _extra_arguments: &[String]) -> Result<Account, BotError> {
    bot.my_account().await
}

pub struct AccountMe;

#[async_trait]
impl Job<Imgur> for AccountMe {
    fn name(&self) -> &'static str {
        "me"
    }

    fn usage(&self) -> &'static str {
        "imgur-bot job me (-a | --app) <app_name> (-u | --user) <user_name>"
    }

    async fn run(
        &self,
        adapter: &Imgur,
        extra_arguments: &[String],
    ) -> Result<Box<dyn Model>, BotError> {
        let account = run(adapter, extra_arguments).await?;
        Ok(Box::new(account))
    }
}
