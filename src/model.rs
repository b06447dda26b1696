//! Pretrained summarisation model access.
//!
//! The model itself runs behind a Hugging Face style inference endpoint. This
//! module exposes it through the [`SummaryModel`] trait so the summariser can
//! be driven by a substitute in tests, and keeps one process-wide handle that
//! is loaded on first use.

use crate::config::{Config, ModelConfig};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Short input used to force the endpoint to load weights before real work
const WARM_UP_TEXT: &str = "The model is warming up. This request checks that it can be reached.";

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("inference server returned status {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

impl ModelError {
    /// Reclassify an error seen while loading: anything that means "the
    /// model is not there" becomes [`ModelError::Unavailable`].
    fn into_load_error(self) -> Self {
        match self {
            ModelError::RequestFailed(e) if e.is_connect() || e.is_timeout() => {
                ModelError::Unavailable(e.to_string())
            }
            ModelError::ServerError { status, body }
                if matches!(status, 401 | 403 | 404 | 503) =>
            {
                ModelError::Unavailable(format!("status {status}: {body}"))
            }
            other => other,
        }
    }
}

/// Decoding limits for one generation request, in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationParams {
    pub max_length: usize,
    pub min_length: usize,
    /// Always false: greedy decoding keeps repeated calls stable
    pub do_sample: bool,
}

impl GenerationParams {
    pub fn new(max_length: usize, min_length: usize) -> Self {
        Self {
            max_length,
            min_length: min_length.min(max_length),
            do_sample: false,
        }
    }
}

/// A sequence-to-sequence model that turns text into a shorter text.
///
/// Implementations need not be reentrant; the summariser serialises calls.
pub trait SummaryModel: Send + Sync {
    fn generate(
        &self,
        text: &str,
        params: &GenerationParams,
    ) -> impl Future<Output = Result<String, ModelError>> + Send;
}

impl<M: SummaryModel> SummaryModel for Arc<M> {
    fn generate(
        &self,
        text: &str,
        params: &GenerationParams,
    ) -> impl Future<Output = Result<String, ModelError>> + Send {
        (**self).generate(text, params)
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParams,
    options: RequestOptions,
}

#[derive(Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Outputs(Vec<GeneratedText>),
    Error { error: String },
}

#[derive(Deserialize)]
struct GeneratedText {
    #[serde(alias = "generated_text")]
    summary_text: String,
}

/// HTTP client for a summarisation model on an inference endpoint
pub struct InferenceClient {
    http: Client,
    url: String,
    token: Option<String>,
}

impl InferenceClient {
    pub fn new(config: &ModelConfig, token: Option<&str>) -> Result<Self, ModelError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            url: config.url(),
            token: token.map(str::to_string),
        })
    }

    /// Send a tiny request so weight loading happens now rather than mid-run
    pub async fn warm_up(&self) -> Result<(), ModelError> {
        self.request(WARM_UP_TEXT, &GenerationParams::new(16, 1))
            .await
            .map(|_| ())
            .map_err(ModelError::into_load_error)
    }

    async fn request(&self, text: &str, params: &GenerationParams) -> Result<String, ModelError> {
        let body = InferenceRequest {
            inputs: text,
            parameters: params,
            options: RequestOptions {
                wait_for_model: true,
            },
        };

        let mut request = self.http.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        let text = response.text().await?;
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(ModelError::Unavailable(text));
        }
        if !status.is_success() {
            return Err(ModelError::ServerError {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_response(&text)
    }
}

impl SummaryModel for InferenceClient {
    async fn generate(&self, text: &str, params: &GenerationParams) -> Result<String, ModelError> {
        debug!(
            input_chars = text.chars().count(),
            max_length = params.max_length,
            min_length = params.min_length,
            "model request"
        );
        self.request(text, params).await
    }
}

fn parse_response(body: &str) -> Result<String, ModelError> {
    let parsed: InferenceResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::MalformedResponse(format!("{}: {}", e, body)))?;

    match parsed {
        InferenceResponse::Outputs(outputs) => outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text.trim().to_string())
            .ok_or_else(|| ModelError::MalformedResponse("empty output list".to_string())),
        InferenceResponse::Error { error } => Err(ModelError::MalformedResponse(error)),
    }
}

/// Build the client and confirm the model can be reached.
pub async fn load(config: &ModelConfig, token: Option<&str>) -> Result<InferenceClient, ModelError> {
    info!(model = %config.name, endpoint = %config.endpoint, "loading summarisation model");
    let client = InferenceClient::new(config, token)?;
    client.warm_up().await?;
    info!(model = %config.name, "model ready");
    Ok(client)
}

static SHARED: OnceCell<Arc<InferenceClient>> = OnceCell::const_new();

/// Process-wide model handle, loaded on the first call.
///
/// Later calls return the same handle whatever config they pass. A failed
/// load leaves the slot empty so a later call can try again. Summarise through
/// [`crate::summariser::shared`], which owns the one gate for this handle.
pub async fn shared(config: &Config) -> Result<Arc<InferenceClient>, ModelError> {
    SHARED
        .get_or_try_init(|| async {
            load(&config.model, config.api.hf_token.as_deref())
                .await
                .map(Arc::new)
        })
        .await
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn parses_summary_text() {
        let out = parse_response(r#"[{"summary_text": " Paris is the capital. "}]"#).unwrap();
        assert_eq!(out, "Paris is the capital.");
    }

    #[test]
    fn accepts_generated_text_alias() {
        let out = parse_response(r#"[{"generated_text": "Short."}]"#).unwrap();
        assert_eq!(out, "Short.");
    }

    #[test]
    fn error_payload_is_reported() {
        let err = parse_response(r#"{"error": "input too long"}"#).unwrap_err();
        assert!(matches!(err, ModelError::MalformedResponse(msg) if msg == "input too long"));
    }

    #[test]
    fn empty_output_list_is_malformed() {
        assert!(matches!(
            parse_response("[]"),
            Err(ModelError::MalformedResponse(_))
        ));
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            parse_response("<html>gateway</html>"),
            Err(ModelError::MalformedResponse(_))
        ));
    }

    #[test]
    fn request_body_shape() {
        let params = GenerationParams::new(50, 12);
        let body = InferenceRequest {
            inputs: "text",
            parameters: &params,
            options: RequestOptions {
                wait_for_model: true,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["inputs"], "text");
        assert_eq!(json["parameters"]["max_length"], 50);
        assert_eq!(json["parameters"]["min_length"], 12);
        assert_eq!(json["parameters"]["do_sample"], false);
        assert_eq!(json["options"]["wait_for_model"], true);
    }

    #[test]
    fn min_length_never_exceeds_max_length() {
        let params = GenerationParams::new(10, 40);
        assert_eq!(params.min_length, 10);
    }

    #[test]
    fn missing_model_statuses_mean_unavailable() {
        for status in [401, 403, 404, 503] {
            let err = ModelError::ServerError {
                status,
                body: "nope".to_string(),
            }
            .into_load_error();
            assert!(matches!(err, ModelError::Unavailable(_)), "status {status}");
        }
        let err = ModelError::ServerError {
            status: 500,
            body: "boom".to_string(),
        }
        .into_load_error();
        assert!(matches!(err, ModelError::ServerError { status: 500, .. }));
    }

    /// Local inference endpoint answering the n-th request with `replies[n]`;
    /// the last reply repeats.
    struct StubEndpoint {
        base: String,
        hits: Arc<AtomicUsize>,
        requests: Arc<std::sync::Mutex<Vec<String>>>,
    }

    async fn stub_endpoint(replies: Vec<(u16, &'static str)>) -> StubEndpoint {
        // Keep loopback requests off any proxy configured in the environment
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/models", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(std::sync::Mutex::new(Vec::new()));

        let (served, seen) = (Arc::clone(&hits), Arc::clone(&requests));
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let request = read_request(&mut stream).await;
                seen.lock().unwrap().push(request);
                let n = served.fetch_add(1, Ordering::SeqCst);
                let (status, body) = replies[n.min(replies.len() - 1)];
                let response = format!(
                    "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        StubEndpoint {
            base,
            hits,
            requests,
        }
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_lowercase();
            if let Some(end) = text.find("\r\n\r\n") {
                let body_len = text[..end]
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn stub_model(base: &str) -> ModelConfig {
        ModelConfig {
            name: "stub-model".to_string(),
            endpoint: base.to_string(),
            timeout_secs: 5,
        }
    }

    const OK_REPLY: &str = r#"[{"summary_text": "Ready."}]"#;

    #[tokio::test]
    async fn load_warms_up_once_with_bearer_token() {
        let stub = stub_endpoint(vec![(200, OK_REPLY)]).await;
        let client = load(&stub_model(&stub.base), Some("secret")).await.unwrap();
        assert_eq!(stub.hits.load(Ordering::SeqCst), 1);

        let request = stub.requests.lock().unwrap()[0].to_lowercase();
        assert!(request.starts_with("post /models/stub-model "), "{request}");
        assert!(request.contains("authorization: bearer secret"));
        assert!(request.contains(r#""wait_for_model":true"#));

        let params = GenerationParams::new(40, 10);
        assert_eq!(client.generate("Some text.", &params).await.unwrap(), "Ready.");
        assert_eq!(stub.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn load_without_token_sends_no_authorization() {
        let stub = stub_endpoint(vec![(200, OK_REPLY)]).await;
        load(&stub_model(&stub.base), None).await.unwrap();
        let request = stub.requests.lock().unwrap()[0].to_lowercase();
        assert!(!request.contains("authorization:"));
    }

    #[tokio::test]
    async fn missing_or_loading_model_fails_to_load_as_unavailable() {
        for status in [401, 404, 503] {
            let stub = stub_endpoint(vec![(status, r#"{"error": "not here"}"#)]).await;
            let err = load(&stub_model(&stub.base), None).await.err().unwrap();
            assert!(matches!(err, ModelError::Unavailable(_)), "status {status}: {err}");
        }
    }

    #[tokio::test]
    async fn server_error_during_generation_is_not_unavailable() {
        let stub = stub_endpoint(vec![(200, OK_REPLY), (500, "boom")]).await;
        let client = load(&stub_model(&stub.base), None).await.unwrap();
        let err = client
            .generate("Some text.", &GenerationParams::new(40, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::ServerError { status: 500, ref body } if body == "boom"));
    }

    // The only test that touches the process-wide handles
    #[tokio::test]
    async fn shared_handle_is_memoized_and_failures_are_retried() {
        let stub = stub_endpoint(vec![(503, r#"{"error": "loading"}"#), (200, OK_REPLY)]).await;
        let config = Config {
            model: stub_model(&stub.base),
            ..Config::default()
        };

        let err = shared(&config).await.err().unwrap();
        assert!(matches!(err, ModelError::Unavailable(_)));

        let first = shared(&config).await.unwrap();
        let second = shared(&config).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(stub.hits.load(Ordering::SeqCst), 2);

        let a = crate::summariser::shared(&config).await.unwrap();
        let b = crate::summariser::shared(&config).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(stub.hits.load(Ordering::SeqCst), 2);
    }
}
