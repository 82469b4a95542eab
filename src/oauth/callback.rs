//! Local listener that receives the provider's authorization redirect.

use super::AuthorizationRedirect;
use anyhow::{anyhow, Context, Result};
use axum::{
    extract::RawQuery,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use reqwest::Url;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

type RedirectSender = Arc<Mutex<Option<oneshot::Sender<AuthorizationRedirect>>>>;

/// Serves the callback URI until the first redirect arrives.
pub struct CallbackListener {
    local_addr: SocketAddr,
    path: String,
    receiver: oneshot::Receiver<AuthorizationRedirect>,
    server: JoinHandle<()>,
}

impl CallbackListener {
    /// Binds the host, port and path of `callback_uri`.
    ///
    /// `localhost` binds the IPv4 loopback. Port 0 picks a free port, see
    /// [`CallbackListener::local_addr`].
    pub async fn bind(callback_uri: &str) -> Result<Self> {
        let url = Url::parse(callback_uri)
            .with_context(|| format!("Invalid callback URI '{}'", callback_uri))?;
        let host = match url.host_str() {
            Some("localhost") | None => "127.0.0.1",
            Some(host) => host,
        };
        let port = url
            .port_or_known_default()
            .ok_or_else(|| anyhow!("Callback URI '{}' has no port", callback_uri))?;
        let path = url.path().to_string();

        let (tx, receiver) = oneshot::channel();
        let tx: RedirectSender = Arc::new(Mutex::new(Some(tx)));

        let app = Router::new().route(
            &path,
            get(move |query: RawQuery| handle_redirect(query, tx.clone())),
        );

        let listener = tokio::net::TcpListener::bind((host, port))
            .await
            .with_context(|| format!("Failed to bind callback listener on {}:{}", host, port))?;
        let local_addr = listener
            .local_addr()
            .context("Failed to read callback listener address")?;

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Callback listener error");
            }
        });

        info!(addr = %local_addr, path = %path, "Waiting for authorization redirect");

        Ok(Self {
            local_addr,
            path,
            receiver,
            server,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `http://{addr}{path}` of the bound listener.
    pub fn url(&self) -> String {
        format!("http://{}{}", self.local_addr, self.path)
    }

    /// Waits up to `timeout` for the redirect, then stops the listener.
    pub async fn wait(self, timeout: Duration) -> Result<AuthorizationRedirect> {
        let outcome = tokio::time::timeout(timeout, self.receiver).await;
        self.server.abort();

        match outcome {
            Ok(Ok(redirect)) => Ok(redirect),
            Ok(Err(_)) => Err(anyhow!("Callback listener stopped before a redirect arrived")),
            Err(_) => Err(anyhow!(
                "No authorization redirect received within {}s",
                timeout.as_secs()
            )),
        }
    }
}

async fn handle_redirect(RawQuery(query): RawQuery, tx: RedirectSender) -> impl IntoResponse {
    let redirect = AuthorizationRedirect::from_query(query.as_deref().unwrap_or_default());
    debug!(
        has_code = redirect.code.is_some(),
        error = ?redirect.error,
        "Authorization redirect received"
    );

    let failed = redirect.error.is_some() || redirect.code.is_none();
    if let Some(sender) = tx.lock().await.take() {
        let _ = sender.send(redirect);
    }

    if failed {
        Html(
            "<!DOCTYPE html><html><head><title>Authorization failed</title></head>\
             <body><h1>Authorization failed</h1>\
             <p>Return to the terminal for details.</p></body></html>",
        )
    } else {
        Html(
            "<!DOCTYPE html><html><head><title>Authorization received</title></head>\
             <body><h1>Authorization received</h1>\
             <p>You can close this window and return to the terminal.</p></body></html>",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_first_redirect() {
        let listener = CallbackListener::bind("http://127.0.0.1:0/callback")
            .await
            .unwrap();
        let url = listener.url();

        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}?code=abc123&state=xyz", url))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert!(response.text().await.unwrap().contains("Authorization received"));

        let redirect = listener.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(redirect.code.as_deref(), Some("abc123"));
        assert_eq!(redirect.state.as_deref(), Some("xyz"));
    }

    #[tokio::test]
    async fn test_repeated_parameters_keep_first_value() {
        let listener = CallbackListener::bind("http://127.0.0.1:0/callback")
            .await
            .unwrap();
        let url = listener.url();

        let status = reqwest::get(format!("{}?code=abc123&state=xyz&state=other", url))
            .await
            .unwrap()
            .status();
        assert!(status.is_success());

        let redirect = listener.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(redirect.code.as_deref(), Some("abc123"));
        assert_eq!(redirect.state.as_deref(), Some("xyz"));
    }

    #[tokio::test]
    async fn test_error_redirect_is_reported() {
        let listener = CallbackListener::bind("http://localhost:0/cb").await.unwrap();
        let url = listener.url();

        let body = reqwest::get(format!("{}?error=access_denied", url))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("Authorization failed"));

        let redirect = listener.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(redirect.error.as_deref(), Some("access_denied"));
        assert!(redirect.code.is_none());
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let listener = CallbackListener::bind("http://127.0.0.1:0/callback")
            .await
            .unwrap();
        let err = listener.wait(Duration::from_millis(50)).await.unwrap_err();
        assert!(err.to_string().contains("No authorization redirect"));
    }

    #[tokio::test]
    async fn test_rejects_invalid_uri() {
        assert!(CallbackListener::bind("not a uri").await.is_err());
    }
}
