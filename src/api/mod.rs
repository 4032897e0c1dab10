// Gemini API client

pub mod sse;

use futures::stream::{self, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;

use crate::error::GenerateError;
use crate::media::ImageAttachment;
use crate::models::AppConfig;
use sse::LineBuffer;

pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, GenerateError>> + Send>>;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

/// Request body for `streamGenerateContent`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl GenerationRequest {
    /// One content block: the prompt text, then the image if there is one.
    pub fn new(prompt: String, image: Option<&ImageAttachment>) -> Self {
        let mut parts = vec![Part::Text { text: prompt }];
        if let Some(image) = image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.base64_data.clone(),
                },
            });
        }
        Self {
            contents: vec![Content { parts }],
        }
    }

    pub fn has_inline_data(&self) -> bool {
        self.contents
            .iter()
            .flat_map(|content| &content.parts)
            .any(|part| matches!(part, Part::InlineData { .. }))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Pull the provider's `error.message` out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map_or_else(|_| body.trim().to_string(), |parsed| parsed.error.message)
}

impl GeminiClient {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        request_timeout: u64,
    ) -> Result<Self, GenerateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, GenerateError> {
        Self::new(
            config.api_base_url.clone(),
            config.api_key.clone(),
            config.model.clone(),
            config.request_timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent",
            self.base_url, self.model
        )
    }

    /// POST the request and stream back the text increments in arrival order.
    pub async fn generate_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<TextStream, GenerateError> {
        let response = self
            .client
            .post(self.stream_url())
            .query(&[("key", self.api_key.as_str()), ("alt", "sse")])
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Http {
                status,
                message: error_message(&body),
            });
        }

        Ok(text_increments(response.bytes_stream()))
    }
}

/// Turn a raw SSE byte stream into text increments.
///
/// Malformed events are skipped. The unterminated fragment left when the byte
/// stream ends is processed as a final line.
pub fn text_increments<S, B, E>(byte_stream: S) -> TextStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let stream = stream::unfold(
        (Box::pin(byte_stream), LineBuffer::new(), false),
        |(mut byte_stream, mut buffer, mut finished)| async move {
            if finished {
                return None;
            }
            loop {
                match byte_stream.next().await {
                    Some(Ok(bytes)) => {
                        let texts: Vec<_> = buffer
                            .push(bytes.as_ref())
                            .iter()
                            .filter_map(|line| sse::parse_event_line(line))
                            .map(Ok)
                            .collect();
                        if !texts.is_empty() {
                            return Some((texts, (byte_stream, buffer, finished)));
                        }
                    }
                    Some(Err(e)) => {
                        finished = true;
                        let err = GenerateError::Stream(e.to_string());
                        return Some((vec![Err(err)], (byte_stream, buffer, finished)));
                    }
                    None => {
                        finished = true;
                        let texts: Vec<_> = buffer
                            .finish()
                            .and_then(|line| sse::parse_event_line(&line))
                            .map(Ok)
                            .into_iter()
                            .collect();
                        return Some((texts, (byte_stream, buffer, finished)));
                    }
                }
            }
        },
    );

    Box::pin(stream.flat_map(stream::iter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-2.5-flash";
    const STREAM_PATH: &str = "/v1beta/models/gemini-2.5-flash:streamGenerateContent";

    fn event(text: &str) -> String {
        let payload = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
        });
        format!("data: {payload}\r\n\r\n")
    }

    fn test_client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(server.uri(), "test-key".to_string(), MODEL.to_string(), 30).unwrap()
    }

    async fn collect(stream: TextStream) -> Vec<Result<String, GenerateError>> {
        stream.collect().await
    }

    fn chunked(chunks: Vec<Vec<u8>>) -> TextStream {
        text_increments(stream::iter(
            chunks.into_iter().map(Ok::<_, std::io::Error>),
        ))
    }

    #[test]
    fn test_client_creation() {
        let client = GeminiClient::new(
            "https://generativelanguage.googleapis.com/".to_string(),
            "key".to_string(),
            MODEL.to_string(),
            600,
        );
        assert!(client.is_ok());
        let client = client.unwrap();
        assert_eq!(
            client.stream_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent"
        );
    }

    #[test]
    fn test_request_serialization_text_only() {
        let request = GenerationRequest::new("Hello".to_string(), None);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"contents": [{"parts": [{"text": "Hello"}]}]}));
        assert!(!request.has_inline_data());
    }

    #[test]
    fn test_request_serialization_with_image() {
        let image = ImageAttachment {
            name: "a.png".to_string(),
            mime_type: "image/png".to_string(),
            base64_data: "iVBORw0KGgo=".to_string(),
            size: 8,
        };
        let request = GenerationRequest::new("Describe".to_string(), Some(&image));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"contents": [{"parts": [
                {"text": "Describe"},
                {"inline_data": {"mime_type": "image/png", "data": "iVBORw0KGgo="}}
            ]}]})
        );
        assert!(request.has_inline_data());
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "API key not valid.");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_every_split_point_accumulates_same_text() {
        let body = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"AB\"}]}}]}\n";
        let bytes = body.as_bytes();
        for split in 0..=bytes.len() {
            let stream = chunked(vec![bytes[..split].to_vec(), bytes[split..].to_vec()]);
            let texts: Vec<String> = tokio_test::block_on(collect(stream))
                .into_iter()
                .map(Result::unwrap)
                .collect();
            assert_eq!(texts.concat(), "AB", "split at {split}");
        }
    }

    #[test]
    fn test_multibyte_text_split_anywhere() {
        let body = event("héllo wörld ✓");
        let bytes = body.as_bytes();
        for split in 0..=bytes.len() {
            let stream = chunked(vec![bytes[..split].to_vec(), bytes[split..].to_vec()]);
            let texts: Vec<String> = tokio_test::block_on(collect(stream))
                .into_iter()
                .map(Result::unwrap)
                .collect();
            assert_eq!(texts.concat(), "héllo wörld ✓", "split at {split}");
        }
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped() {
        let body = format!("data: {{not json\n{}", event("ok"));
        let texts: Vec<String> = collect(chunked(vec![body.into_bytes()]))
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(texts, vec!["ok".to_string()]);
    }

    #[tokio::test]
    async fn test_trailing_fragment_is_flushed() {
        let body = format!(
            "{}data: {{\"candidates\":[{{\"content\":{{\"parts\":[{{\"text\":\"end\"}}]}}}}]}}",
            event("start ")
        );
        let texts: Vec<String> = collect(chunked(vec![body.into_bytes()]))
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(texts, vec!["start ".to_string(), "end".to_string()]);
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(event("partial").into_bytes()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(event("never").into_bytes()),
        ];
        let results = collect(text_increments(stream::iter(chunks))).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), "partial");
        assert!(matches!(results[1], Err(GenerateError::Stream(_))));
    }

    #[tokio::test]
    async fn test_generate_stream_against_mock_server() {
        let server = MockServer::start().await;
        let request = GenerationRequest::new("Say hi".to_string(), None);
        let body = format!("{}{}", event("Hello, "), event("**world**"));

        Mock::given(method("POST"))
            .and(path(STREAM_PATH))
            .and(query_param("key", "test-key"))
            .and(query_param("alt", "sse"))
            .and(body_json(&request))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/event-stream"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let stream = client.generate_stream(&request).await.unwrap();
        let texts: Vec<String> = collect(stream).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(texts.concat(), "Hello, **world**");
    }

    #[tokio::test]
    async fn test_generate_stream_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(STREAM_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "message": "Permission denied", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let request = GenerationRequest::new("Say hi".to_string(), None);
        let Err(err) = client.generate_stream(&request).await else {
            panic!("expected an HTTP error");
        };
        match &err {
            GenerateError::Http { status, message } => {
                assert_eq!(*status, 403);
                assert_eq!(message, "Permission denied");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            err.to_string(),
            "API request failed with status 403: Permission denied"
        );
    }
}
