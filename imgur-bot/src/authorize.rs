//! Interactive authorization: consent URL, redirect capture, code exchange.

use crate::adapter::Imgur;
use anyhow::{bail, Context, Result};
use botkit::credentials::AccessTokenRecord;
use botkit::oauth::{AuthorizationRedirect, CallbackListener};
use std::time::Duration;
use tracing::info;

/// How long `authorize` waits for the user to finish on the consent screen.
pub const REDIRECT_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs the full flow through a local callback listener bound to the
/// application's `callback_uri`. `present` receives the consent URL once the
/// listener is up. The new token is published on the bot.
pub async fn authorize_with_listener<F>(
    imgur: &Imgur,
    timeout: Duration,
    present: F,
) -> Result<AccessTokenRecord>
where
    F: FnOnce(&str),
{
    let configuration = imgur.bot().configuration();
    if configuration.callback_uri.is_empty() {
        bail!(
            "Application '{}' has no callback_uri; use --manual",
            configuration.name
        );
    }

    let listener = CallbackListener::bind(&configuration.callback_uri).await?;
    present(&imgur.bot().access_token_url(&configuration.scopes));

    let redirect = listener.wait(timeout).await?;
    complete(imgur, &redirect).await
}

/// Completes the flow from a redirect URL pasted by the user.
pub async fn authorize_from_redirect_url(imgur: &Imgur, redirect_url: &str) -> Result<AccessTokenRecord> {
    let mut redirect = AuthorizationRedirect::parse(redirect_url);
    redirect.code = imgur
        .bot()
        .extract_response_data_for_access_token(redirect_url);
    complete(imgur, &redirect).await
}

/// Checks the redirect, exchanges its code and normalizes the token.
pub async fn complete(imgur: &Imgur, redirect: &AuthorizationRedirect) -> Result<AccessTokenRecord> {
    let bot = imgur.bot();

    if let Some(error) = &redirect.error {
        bail!(
            "Authorization denied: {} {}",
            error,
            redirect.error_description.as_deref().unwrap_or_default()
        );
    }

    let state = redirect
        .state
        .as_deref()
        .context("Redirect carries no state parameter")?;
    if !bot.verify_state(state) {
        bail!("Redirect state was not issued by this bot or has expired");
    }

    let code = redirect
        .code
        .as_deref()
        .context("Redirect carries no authorization code")?;

    let raw = bot
        .request_access_token(code)
        .await
        .context("Token exchange failed")?;
    let record = bot.format_new_access_token(&raw, &bot.configuration().scopes);

    info!(
        application = %bot.configuration().name,
        user = %record.user,
        "Application authorized"
    );
    bot.set_access_token(record.clone());
    Ok(record)
}
