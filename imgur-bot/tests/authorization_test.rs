//! Consent URL, code exchange and redirect handling against a mock Imgur.

use botkit::config::{BotDefaults, Configuration, HttpModule};
use botkit::oauth::AuthorizationRedirect;
use botkit::transport::HttpTransport;
use botkit::{Bot, BotError};
use imgur_bot::authorize::{self, authorize_from_redirect_url};
use imgur_bot::config::imgur_defaults;
use imgur_bot::{Imgur, ImgurProvider};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn configuration(callback_uri: &str) -> Configuration {
    Configuration {
        name: "main".to_string(),
        app_id: "abc123".to_string(),
        app_secret: "s3cret".to_string(),
        access_token: None,
        callback_uri: callback_uri.to_string(),
        scopes: String::new(),
    }
}

/// Imgur adapter pointed at a local mock server.
fn imgur_at(server: &mockito::Server, callback_uri: &str) -> Imgur {
    let (host, port) = server
        .host_with_port()
        .rsplit_once(':')
        .map(|(host, port)| (host.to_string(), port.parse::<u16>().unwrap()))
        .unwrap();
    let defaults = BotDefaults {
        hostname: host,
        http_module: HttpModule::Http,
        port,
        ..imgur_defaults()
    };
    let bot = Bot::new(
        Arc::new(ImgurProvider),
        Arc::new(HttpTransport::new().unwrap()),
        configuration(callback_uri),
    )
    .with_defaults(defaults)
    .with_request_timeout(Duration::from_secs(5));
    Imgur::from_bot(bot)
}

fn state_of(url: &str) -> String {
    AuthorizationRedirect::parse(url).state.unwrap()
}

#[test]
fn test_consent_url_embeds_nonce_and_client_id() {
    let imgur = Imgur::new(Arc::new(HttpTransport::new().unwrap()), configuration(""));

    let first = imgur.bot().access_token_url("");
    let second = imgur.bot().access_token_url("");

    assert!(first.starts_with("https://api.imgur.com/oauth2/authorize?response_type=code&state="));
    assert!(first.ends_with("&client_id=abc123"));

    let (a, b) = (state_of(&first), state_of(&second));
    assert_eq!(a.len(), 32);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_ne!(a, b);
}

#[test]
fn test_extract_code_from_redirect() {
    let imgur = Imgur::new(Arc::new(HttpTransport::new().unwrap()), configuration(""));
    let bot = imgur.bot();
    assert_eq!(
        bot.extract_response_data_for_access_token("/cb?code=abc&state=x").as_deref(),
        Some("abc")
    );
    assert_eq!(bot.extract_response_data_for_access_token("/cb?state=x"), None);
    assert_eq!(bot.extract_response_data_for_access_token("/cb"), None);
}

#[tokio::test]
async fn test_exchange_success_returns_raw_payload() {
    let mut server = mockito::Server::new_async().await;
    let payload = json!({
        "access_token": "A",
        "token_type": "bearer",
        "account_username": "u",
        "scope": null,
        "refresh_token": "R",
        "expires_in": 315360000
    });
    let mock = server
        .mock("POST", "/oauth2/token")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("client_id".into(), "abc123".into()),
            Matcher::UrlEncoded("client_secret".into(), "s3cret".into()),
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), "the-code".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(payload.to_string())
        .create_async()
        .await;

    let imgur = imgur_at(&server, "");
    let raw = imgur.bot().request_access_token("the-code").await.unwrap();
    assert_eq!(raw, payload);

    let record = imgur.bot().format_new_access_token(&raw, "");
    assert_eq!(record.access_token, "A");
    assert_eq!(record.token_type, "bearer");
    assert_eq!(record.user, "u");
    assert_eq!(record.refresh_token.as_deref(), Some("R"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_exchange_failure_returns_parsed_body() {
    let mut server = mockito::Server::new_async().await;
    let body = json!({"data": {"error": "Invalid grant_type parameter or parameter missing"}, "success": false, "status": 400});
    let mock = server
        .mock("POST", "/oauth2/token")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let imgur = imgur_at(&server, "");
    match imgur.bot().request_access_token("bad").await {
        Err(BotError::Provider { status, body: error_body }) => {
            assert_eq!(status, 400);
            assert_eq!(error_body, body);
        }
        other => panic!("expected provider error, got {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_manual_flow_verifies_state() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/oauth2/token")
        .with_status(200)
        .with_body(json!({"access_token": "A", "token_type": "bearer", "account_username": "u"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let imgur = imgur_at(&server, "");
    let state = state_of(&imgur.bot().access_token_url(""));

    let forged = format!("http://localhost/cb?code=c&state={}", "0".repeat(32));
    assert!(authorize_from_redirect_url(&imgur, &forged).await.is_err());

    let redirect = format!("http://localhost/cb?code=c&state={}", state);
    let record = authorize_from_redirect_url(&imgur, &redirect).await.unwrap();
    assert_eq!(record.user, "u");
    assert_eq!(imgur.bot().access_token().unwrap().access_token, "A");

    // The state is single-use.
    assert!(authorize_from_redirect_url(&imgur, &redirect).await.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_denied_redirect_is_reported() {
    let server = mockito::Server::new_async().await;
    let imgur = imgur_at(&server, "");
    let state = state_of(&imgur.bot().access_token_url(""));

    let redirect = AuthorizationRedirect {
        state: Some(state),
        error: Some("access_denied".to_string()),
        ..Default::default()
    };
    let err = authorize::complete(&imgur, &redirect).await.unwrap_err();
    assert!(err.to_string().contains("access_denied"));
}

async fn run_listener_flow(redirect_query: impl FnOnce(&str) -> String) -> anyhow::Result<String> {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/oauth2/token")
        .with_status(200)
        .with_body(json!({"access_token": "A", "token_type": "bearer", "account_username": "u", "refresh_token": "R"}).to_string())
        .create_async()
        .await;

    // Port 0 cannot be used here: the consent URL must be known before the redirect.
    let listener_port = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };
    let callback = format!("http://127.0.0.1:{}/callback", listener_port);
    let imgur = imgur_at(&server, &callback);

    let (url_tx, url_rx) = tokio::sync::oneshot::channel::<String>();
    let flow = authorize::authorize_with_listener(&imgur, Duration::from_secs(5), |url| {
        let _ = url_tx.send(url.to_string());
    });
    let browser = async move {
        let consent = url_rx.await.unwrap();
        let query = redirect_query(&state_of(&consent));
        reqwest::get(format!("{}?{}", callback, query))
            .await
            .unwrap()
            .status()
    };

    let (record, status) = tokio::join!(flow, browser);
    assert!(status.is_success());
    record.map(|record| record.access_token)
}

#[tokio::test]
async fn test_listener_flow_end_to_end() {
    let token = run_listener_flow(|state| format!("code=c&state={}", state))
        .await
        .unwrap();
    assert_eq!(token, "A");
}

#[tokio::test]
async fn test_listener_flow_rejects_forged_state() {
    let err = run_listener_flow(|_| format!("code=c&state={}", "f".repeat(32)))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("state"));
}
