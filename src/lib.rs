//! # viral-director
//!
//! Production-team feedback on a short video, image or script. One request
//! (an optional video/image attachment plus an optional note) is sent to
//! Google Gemini together with a fixed system instruction; the JSON answer is
//! rendered as one card per team member (director, casting, scriptwriter, ...)
//! or as a raw JSON block.
//!
//! The pieces, in the order a request flows through them:
//!
//! - [`collector`]: attachment and note while the user edits them
//! - [`dispatch`]: validation, request assembly, the single API call, parsing
//! - [`session`]: the `Idle -> Submitting -> Success | Failed` state machine
//! - [`render`]: a pure view of the session, and a terminal writer for it
//!
//! ```rust,ignore
//! use viral_director::{Config, Session};
//!
//! let config = Config::from_env()?;
//! let dispatcher = config.dispatcher()?;
//! let mut session = Session::new();
//! session.set_note("Audition for a villain in a thriller");
//! session.submit(&dispatcher).await;
//! ```

pub mod client;
pub mod collector;
mod common;
pub mod config;
pub mod dispatch;
pub mod models;
pub mod profile;
pub mod render;
pub mod session;

#[cfg(test)]
mod tests;

pub use client::{Error as ClientError, Gemini, GenerativeModel};
pub use collector::{Attachment, InputCollector, Request};
pub use config::Config;
pub use dispatch::{AnalysisResult, AnalyzeError, Dispatcher, ErrorKind, MalformedError};
pub use profile::{Profile, ProfileId, RenderMode, Role};
pub use render::{format_rich_text, render, Segment, TerminalRenderer, View};
pub use session::{Phase, Session, SubmitOutcome};
