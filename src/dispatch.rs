//! The request dispatcher: one request in, one parsed analysis (or one
//! classified error) out.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Value};
use snafu::{ensure, OptionExt, ResultExt, Snafu};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::{
    client::{Error as ClientError, GenerativeModel},
    collector::Request,
    models::{Blob, Content, GenerateContentRequest, GenerationConfig, Part, Role, ThinkingConfig},
    profile::Profile,
};

/// 20 MiB
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 20 * 1024 * 1024;

pub const JSON_MIME_TYPE: &str = "application/json";

/// Why a successful call still produced no analysis.
#[derive(Debug, Snafu)]
pub enum MalformedError {
    #[snafu(display("model returned an empty response"))]
    EmptyResponse,

    #[snafu(display("response is not valid JSON"))]
    InvalidJson { source: serde_json::Error },

    #[snafu(display("response is JSON but not an object (found {found})"))]
    NotAnObject { found: &'static str },
}

#[derive(Debug, Snafu)]
pub enum AnalyzeError {
    #[snafu(display("no API credential is configured"))]
    MissingCredential,

    #[snafu(display("nothing to analyze: attach a video/image or write a note"))]
    EmptyRequest,

    #[snafu(display("attachment is {size} bytes; the limit is {limit} bytes"))]
    AttachmentTooLarge { size: usize, limit: usize },

    #[snafu(display("generative API call failed"))]
    Transport { source: ClientError },

    #[snafu(display("malformed model response"))]
    MalformedResponse { source: MalformedError },
}

/// The four failure classes a caller needs to tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Transport,
    MalformedResponse,
}

impl AnalyzeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalyzeError::MissingCredential => ErrorKind::Configuration,
            AnalyzeError::EmptyRequest | AnalyzeError::AttachmentTooLarge { .. } => {
                ErrorKind::Validation
            }
            AnalyzeError::Transport { .. } => ErrorKind::Transport,
            AnalyzeError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
        }
    }

    /// Banner text for the error in the profile's language.
    pub fn user_message(&self, profile: &Profile) -> String {
        let messages = &profile.messages;
        match self {
            AnalyzeError::MissingCredential => messages.missing_credential.to_string(),
            AnalyzeError::EmptyRequest => messages.empty_request.to_string(),
            AnalyzeError::AttachmentTooLarge { .. } => messages.attachment_too_large.to_string(),
            AnalyzeError::MalformedResponse {
                source: MalformedError::EmptyResponse,
            } => messages.empty_response.to_string(),
            AnalyzeError::MalformedResponse { .. } => messages.malformed_response.to_string(),
            AnalyzeError::Transport { source } => format!("{}\n{source}", messages.transport),
        }
    }
}

/// Parsed model output: role key to formatted text, in response order.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    sections: Vec<(String, String)>,
    raw: Value,
}

impl AnalysisResult {
    /// Parse the response envelope text.
    pub fn parse(text: &str) -> Result<Self, MalformedError> {
        ensure!(!text.trim().is_empty(), EmptyResponseSnafu);

        let raw: Value = serde_json::from_str(text).context(InvalidJsonSnafu)?;
        let object = raw.as_object().context(NotAnObjectSnafu {
            found: json_type_name(&raw),
        })?;
        let sections = Self::sections_of(object);
        Ok(Self { sections, raw })
    }

    fn sections_of(object: &Map<String, Value>) -> Vec<(String, String)> {
        object
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::Null => return None,
                    Value::String(s) => s.clone(),
                    Value::Bool(_) | Value::Number(_) => value.to_string(),
                    Value::Array(_) | Value::Object(_) => {
                        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
                    }
                };
                Some((key.clone(), text))
            })
            .collect()
    }

    /// Text for a role, if present and not blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.raw).unwrap_or_else(|_| self.raw.to_string())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Turns a [`Request`] into one `generateContent` call.
#[derive(Clone)]
pub struct Dispatcher {
    model: Option<Arc<dyn GenerativeModel>>,
    profile: &'static Profile,
    max_attachment_bytes: usize,
}

impl Dispatcher {
    /// `model` is `None` when no credential is configured; every
    /// [`analyze`](Self::analyze) then fails with `MissingCredential`.
    pub fn new(model: Option<Arc<dyn GenerativeModel>>, profile: &'static Profile) -> Self {
        Self {
            model,
            profile,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }

    pub fn with_max_attachment_bytes(mut self, limit: usize) -> Self {
        self.max_attachment_bytes = limit;
        self
    }

    pub fn profile(&self) -> &'static Profile {
        self.profile
    }

    pub fn max_attachment_bytes(&self) -> usize {
        self.max_attachment_bytes
    }

    /// Validate the request without performing any I/O.
    pub fn validate(&self, request: &Request) -> Result<(), AnalyzeError> {
        ensure!(self.model.is_some(), MissingCredentialSnafu);
        ensure!(!request.is_empty(), EmptyRequestSnafu);
        if let Some(attachment) = &request.attachment {
            ensure!(
                attachment.len() <= self.max_attachment_bytes,
                AttachmentTooLargeSnafu {
                    size: attachment.len(),
                    limit: self.max_attachment_bytes,
                }
            );
        }
        Ok(())
    }

    /// Build the wire request: inline media first, then the text part.
    pub fn build_request(&self, request: &Request) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(2);
        if let Some(attachment) = &request.attachment {
            parts.push(Part::InlineData {
                inline_data: Blob::new(attachment.mime.clone(), STANDARD.encode(&attachment.bytes)),
            });
        }
        let note = request.note().unwrap_or(self.profile.default_note);
        parts.push(Part::text(note));

        GenerateContentRequest {
            contents: vec![Content::from_parts(parts).with_role(Role::User)],
            system_instruction: Some(Content::text(self.profile.system_instruction)),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some(JSON_MIME_TYPE.to_string()),
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: Some(0),
                }),
                ..Default::default()
            }),
        }
    }

    #[instrument(skip_all, fields(
        profile = %self.profile.id,
        attachment.present = request.attachment.is_some(),
        attachment.size = request.attachment.as_ref().map(|a| a.len()).unwrap_or(0),
        note.present = request.note().is_some(),
    ))]
    pub async fn analyze(&self, request: &Request) -> Result<AnalysisResult, AnalyzeError> {
        if let Err(e) = self.validate(request) {
            warn!(error = %e, "request rejected before dispatch");
            return Err(e);
        }
        let model = self.model.as_ref().context(MissingCredentialSnafu)?;

        let body = self.build_request(request);
        let response = match model.generate_content(body).await {
            Ok(response) => response,
            Err(source) => {
                error!(error = %source, "generative API call failed");
                return Err(AnalyzeError::Transport { source });
            }
        };

        let text = response.text();
        match AnalysisResult::parse(&text) {
            Ok(result) => {
                info!(sections = result.sections.len(), "analysis parsed");
                Ok(result)
            }
            Err(source) => {
                error!(error = %source, response.len = text.len(), "failed to parse model response");
                Err(AnalyzeError::MalformedResponse { source })
            }
        }
    }
}
