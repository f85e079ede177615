use ask_domain::Message;
use serde::{Deserialize, Serialize};

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
}

/// A completion response or one streamed chunk of it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub created: Option<u64>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    /// Complete message of a non-streaming response.
    #[serde(default)]
    pub message: Option<ChoiceContent>,
    /// Incremental content of a streamed chunk.
    #[serde(default)]
    pub delta: Option<ChoiceContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message or delta payload; every field may be absent in a chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceContent {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl Response {
    /// Converts an embedded API error into a domain error.
    pub fn into_result(self) -> ask_domain::Result<Self> {
        match self.error {
            Some(error) => Err(ask_domain::Error::Api {
                kind: error.kind.unwrap_or_else(|| "error".to_string()),
                message: error.message,
            }),
            None => Ok(self),
        }
    }

    /// Text carried by the first choice of a streamed chunk.
    pub fn delta_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.as_ref())
            .and_then(|delta| delta.content.as_deref())
    }

    /// Text of the first choice of a complete response.
    pub fn message_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_request_serialization() {
        let fixture = Request {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![Message::user("Hi")],
            stream: true,
        };

        let actual = serde_json::to_string(&fixture).unwrap();

        insta::assert_snapshot!(actual, @r#"{"model":"gpt-3.5-turbo","messages":[{"role":"user","content":"Hi"}],"stream":true}"#);
    }

    #[test]
    fn test_stream_chunk() {
        let fixture = r#"{"id":"c1","object":"chat.completion.chunk","created":1,"choices":[{"index":0,"delta":{"content":"Hel"},"finish_reason":null}]}"#;

        let actual: Response = serde_json::from_str(fixture).unwrap();

        assert_eq!(actual.delta_content(), Some("Hel"));
        assert_eq!(actual.message_content(), None);
    }

    #[test]
    fn test_role_only_chunk_has_no_content() {
        let fixture = r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;

        let actual: Response = serde_json::from_str(fixture).unwrap();

        assert_eq!(actual.delta_content(), None);
    }

    #[test]
    fn test_error_payload() {
        let fixture = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;

        let actual = serde_json::from_str::<Response>(fixture).unwrap().into_result();

        let error = actual.unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"invalid_request_error: Incorrect API key provided");
    }
}
