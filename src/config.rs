//! Runtime configuration.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file by the binary) and may be overridden by command-line flags. A blank
//! value counts as unset.

use snafu::{ResultExt, Snafu};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use url::Url;

use crate::{
    client::{self, Gemini, GenerativeModel, DEFAULT_BASE_URL, DEFAULT_MODEL},
    dispatch::{Dispatcher, DEFAULT_MAX_ATTACHMENT_BYTES},
    profile::{Profile, ProfileId},
};

pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "VITE_GEMINI_API_KEY"];
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
pub const PROFILE_VAR: &str = "VIRAL_DIRECTOR_PROFILE";
pub const MAX_UPLOAD_VAR: &str = "VIRAL_DIRECTOR_MAX_UPLOAD_BYTES";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("invalid base URL '{url}'"))]
    InvalidBaseUrl { source: url::ParseError, url: String },

    #[snafu(display("invalid {var} value '{value}': {reason}"))]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[snafu(display("failed to create Gemini client"))]
    Client { source: client::Error },
}

#[derive(Clone, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Url,
    pub profile: ProfileId,
    pub max_attachment_bytes: usize,
    pub timeout: Option<Duration>,
}

// Keep the credential out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url.as_str())
            .field("profile", &self.profile)
            .field("max_attachment_bytes", &self.max_attachment_bytes)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            profile: ProfileId::Pro,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            timeout: None,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        config.api_key = API_KEY_VARS.iter().find_map(|name| get(*name));
        if let Some(model) = get(MODEL_VAR) {
            config.model = model;
        }
        if let Some(base_url) = get(BASE_URL_VAR) {
            config.base_url = parse_base_url(&base_url)?;
        }
        if let Some(profile) = get(PROFILE_VAR) {
            config.profile = profile
                .parse()
                .map_err(|reason| Error::InvalidValue {
                    var: PROFILE_VAR,
                    value: profile.clone(),
                    reason,
                })?;
        }
        if let Some(limit) = get(MAX_UPLOAD_VAR) {
            config.max_attachment_bytes =
                limit
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| Error::InvalidValue {
                        var: MAX_UPLOAD_VAR,
                        value: limit.clone(),
                        reason: e.to_string(),
                    })?;
        }
        Ok(config)
    }

    pub fn profile(&self) -> &'static Profile {
        Profile::get(self.profile)
    }

    /// Build the network client, or `None` when no credential is configured.
    pub fn model_client(&self) -> Result<Option<Arc<dyn GenerativeModel>>, Error> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("no API key configured; analysis requests will be rejected");
            return Ok(None);
        };
        let gemini = Gemini::with_options(api_key, &self.model, self.base_url.clone(), self.timeout)
            .context(ClientSnafu)?;
        info!(model = gemini.model(), base_url = %self.base_url, "Gemini client ready");
        Ok(Some(Arc::new(gemini)))
    }

    pub fn dispatcher(&self) -> Result<Dispatcher, Error> {
        let model = self.model_client()?;
        Ok(Dispatcher::new(model, self.profile()).with_max_attachment_bytes(self.max_attachment_bytes))
    }
}

/// Parse a base URL, adding the trailing slash `Url::join` needs.
pub fn parse_base_url(raw: &str) -> Result<Url, Error> {
    let raw = raw.trim();
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).context(InvalidBaseUrlSnafu { url: raw })
}
