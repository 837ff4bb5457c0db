use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, InvalidHeaderValue},
    Client, ClientBuilder, Response,
};
use snafu::{ResultExt, Snafu};
use std::{sync::Arc, time::Duration};
use tracing::{debug, instrument};
use url::Url;

use crate::models::{GenerateContentRequest, GenerationResponse};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to parse API key"))]
    InvalidApiKey { source: InvalidHeaderValue },

    #[snafu(display("failed to build HTTP client"))]
    BuildClient { source: reqwest::Error },

    #[snafu(display("failed to construct URL (probably incorrect model name): {suffix}"))]
    ConstructUrl {
        source: url::ParseError,
        suffix: String,
    },

    #[snafu(display("failed to perform request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    #[snafu(display(
        "bad response from server; code {code}; description: {}",
        description.as_deref().unwrap_or("none")
    ))]
    BadResponse {
        /// HTTP status code
        code: u16,
        /// HTTP error description
        description: Option<String>,
    },

    #[snafu(display("failed to obtain response body"))]
    ReadBody { source: reqwest::Error },

    #[snafu(display("failed to deserialize response envelope"))]
    Decode { source: serde_json::Error },

    #[snafu(display("prompt was blocked: {reason}"))]
    PromptBlocked { reason: String },
}

/// The single outbound operation the analysis needs.
///
/// [`Gemini`] is the network implementation; tests provide their own.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error>;
}

/// Internal HTTP client for the `generateContent` endpoint
pub(crate) struct GeminiClient {
    http_client: Client,
    model: String,
    base_url: Url,
}

impl GeminiClient {
    fn new(
        api_key: &str,
        model: String,
        base_url: Url,
        timeout: Option<Duration>,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key).context(InvalidApiKeySnafu)?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let mut builder = ClientBuilder::new().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().context(BuildClientSnafu)?;

        Ok(Self {
            http_client,
            model,
            base_url,
        })
    }

    #[instrument(skip_all, fields(
        model = %self.model,
        contents.count = request.contents.len(),
        system.instruction.present = request.system_instruction.is_some(),
    ))]
    async fn generate_content_raw(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        let url = self.build_url("generateContent")?;
        debug!(%url, "sending generateContent request");

        let response = self
            .http_client
            .post(url.clone())
            .json(request)
            .send()
            .await
            .context(PerformRequestSnafu { url })?;
        let response = Self::check_response(response).await?;

        let body = response.bytes().await.context(ReadBodySnafu)?;
        let response: GenerationResponse = serde_json::from_slice(&body).context(DecodeSnafu)?;

        if let Some(reason) = response.block_reason() {
            return PromptBlockedSnafu { reason }.fail();
        }
        debug!(
            candidates = response.candidates.len(),
            model.version = response.model_version.as_deref().unwrap_or("unknown"),
            "generateContent response received"
        );
        Ok(response)
    }

    async fn check_response(response: Response) -> Result<Response, Error> {
        let status = response.status();
        if !status.is_success() {
            let description = response.text().await.ok();
            BadResponseSnafu {
                code: status.as_u16(),
                description,
            }
            .fail()
        } else {
            Ok(response)
        }
    }

    /// `{base}{model}:{endpoint}`, e.g. `.../v1beta/models/gemini-2.5-flash:generateContent`
    fn build_url(&self, endpoint: &str) -> Result<Url, Error> {
        let suffix = format!("{}:{endpoint}", self.model);
        self.base_url
            .join(&suffix)
            .context(ConstructUrlSnafu { suffix })
    }
}

/// Client for the Gemini API
#[derive(Clone)]
pub struct Gemini {
    client: Arc<GeminiClient>,
}

impl Gemini {
    /// Create a client for the default model and endpoint
    pub fn new(api_key: impl AsRef<str>) -> Result<Self, Error> {
        Self::with_model(api_key, DEFAULT_MODEL)
    }

    /// Create a client for the given model on the default endpoint
    pub fn with_model(api_key: impl AsRef<str>, model: impl Into<String>) -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_BASE_URL).context(ConstructUrlSnafu {
            suffix: DEFAULT_BASE_URL.to_string(),
        })?;
        Self::with_options(api_key, model, base_url, None)
    }

    /// Create a client with every knob exposed
    pub fn with_options(
        api_key: impl AsRef<str>,
        model: impl Into<String>,
        base_url: Url,
        timeout: Option<Duration>,
    ) -> Result<Self, Error> {
        let model = normalize_model(model.into());
        let client = GeminiClient::new(api_key.as_ref(), model, base_url, timeout)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Model resource name requests are sent to
    pub fn model(&self) -> &str {
        &self.client.model
    }
}

#[async_trait]
impl GenerativeModel for Gemini {
    async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        self.client.generate_content_raw(&request).await
    }
}

/// Accept both `gemini-2.5-flash` and `models/gemini-2.5-flash`.
fn normalize_model(model: String) -> String {
    if model.starts_with("models/") {
        model
    } else {
        format!("models/{model}")
    }
}
