use std::pin::Pin;

use anyhow::Context;
use ask_domain::Message;
use reqwest::{Client, Url};
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

use crate::dto::{Request, Response};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Streamed answer text, one delta per item.
pub type ContentStream = Pin<Box<dyn Stream<Item = anyhow::Result<String>> + Send>>;

/// Client for an OpenAI compatible chat completion endpoint.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    url: Url,
    api_key: String,
}

impl ChatClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, url: join_url(base_url, "chat/completions")?, api_key: api_key.into() })
    }

    /// Sends the conversation and streams the answer as it is generated.
    pub async fn stream(&self, model: &str, messages: Vec<Message>) -> anyhow::Result<ContentStream> {
        let request = Request { model: model.to_string(), messages, stream: true };
        info!(
            url = %self.url,
            model = %model,
            message_count = request.messages.len(),
            "Connecting Upstream"
        );

        let source = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .eventsource()
            .with_context(|| format_http_context("POST (EventSource)", &self.url))?;

        Ok(Box::pin(into_content_stream(self.url.clone(), source)))
    }

    /// Sends the conversation and waits for the complete answer.
    pub async fn complete(&self, model: &str, messages: Vec<Message>) -> anyhow::Result<String> {
        let request = Request { model: model.to_string(), messages, stream: false };
        info!(
            url = %self.url,
            model = %model,
            message_count = request.messages.len(),
            "Connecting Upstream"
        );

        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format_http_context("POST", &self.url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format_http_context("POST", &self.url))?;
        if !status.is_success() {
            return Err(ask_domain::Error::Status { status: status.as_u16(), body }.into());
        }

        let response = serde_json::from_str::<Response>(&body)
            .with_context(|| format!("Failed to parse provider response: {body}"))?
            .into_result()?;
        let content = response
            .message_content()
            .ok_or(ask_domain::Error::NoChoices)?;
        Ok(content.trim().to_string())
    }
}

fn into_content_stream(
    url: Url,
    source: EventSource,
) -> impl Stream<Item = anyhow::Result<String>> + Send {
    source
        .take_while(|event| !matches!(event, Err(reqwest_eventsource::Error::StreamEnded)))
        .then(|event| async move {
            match event {
                Ok(Event::Open) => None,
                Ok(Event::Message(message)) if message.data == "[DONE]" => {
                    debug!("Received completion from Upstream");
                    None
                }
                Ok(Event::Message(message)) => parse_chunk(&message.data).transpose(),
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                    let body = response.text().await.unwrap_or_default();
                    Some(Err(ask_domain::Error::Status { status: status.as_u16(), body }.into()))
                }
                Err(error) => {
                    tracing::error!(error = ?error, "Failed to receive chat completion event");
                    Some(Err(error.into()))
                }
            }
        })
        .filter_map(move |item| item.map(|result| result.with_context(|| format_http_context("POST", &url))))
}

/// Extracts the delta text from one `data:` payload. Chunks without text,
/// such as the leading role announcement, yield `None`.
fn parse_chunk(data: &str) -> anyhow::Result<Option<String>> {
    let response = serde_json::from_str::<Response>(data)
        .with_context(|| format!("Failed to parse provider response: {data}"))?
        .into_result()?;
    Ok(response.delta_content().map(str::to_string))
}

fn format_http_context(method: &str, url: &Url) -> String {
    format!("{method} {url}")
}

pub fn join_url(base_url: &str, path: &str) -> anyhow::Result<Url> {
    // Validate the path doesn't contain certain patterns
    if path.contains("://") || path.contains("..") {
        anyhow::bail!("Invalid path: Contains forbidden patterns");
    }

    let path = path.trim_start_matches('/');
    let base = if base_url.ends_with('/') { base_url.to_string() } else { format!("{base_url}/") };

    let url = Url::parse(&base)
        .with_context(|| format!("Failed to parse base URL: {base_url}"))?
        .join(path)
        .with_context(|| format!("Failed to append {path} to base URL: {base_url}"))?;
    Ok(url)
}
