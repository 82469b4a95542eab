use super::{HttpRequest, RawResponse, Transport};
use crate::error::BotError;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;

/// [`Transport`] over a shared `reqwest` client.
pub struct HttpTransport {
    http_client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, BotError> {
        let http_client = Client::builder()
            .user_agent(concat!("botkit/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, BotError> {
        tracing::debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self.http_client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder.send().await?;
        let status_code = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let data = response.text().await?;

        tracing::debug!(status = status_code, "Response received");

        Ok(RawResponse {
            status_code,
            headers,
            data,
        })
    }
}
