//! The interaction state machine.
//!
//! `Idle -> Submitting -> {Success | Failed}`, back to `Idle` on the next
//! edit or an explicit reset. While `Submitting` a second submission is a
//! no-op, so at most one call is ever in flight.

use std::path::Path;
use tracing::debug;

use crate::{
    collector::{Attachment, Error as CollectorError, InputCollector, Request},
    dispatch::{AnalysisResult, AnalyzeError, Dispatcher},
};

#[derive(Debug, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Success(AnalysisResult),
    Failed(AnalyzeError),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Submitting => "submitting",
            Phase::Success(_) => "success",
            Phase::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A submission was already in flight; nothing happened.
    Ignored,
    /// The call finished; inspect [`Session::phase`].
    Settled,
}

#[derive(Debug, Default)]
pub struct Session {
    collector: InputCollector,
    phase: Phase,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn collector(&self) -> &InputCollector {
        &self.collector
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, Phase::Submitting)
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.phase {
            Phase::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AnalyzeError> {
        match &self.phase {
            Phase::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.collector.set_note(note);
        self.on_edit();
    }

    pub fn set_attachment(&mut self, attachment: Attachment) {
        self.collector.set_attachment(attachment);
        self.on_edit();
    }

    /// A file that cannot be loaded leaves the previous attachment and phase untouched.
    pub async fn load_attachment(&mut self, path: impl AsRef<Path>) -> Result<(), CollectorError> {
        self.collector.load_attachment(path).await?;
        self.on_edit();
        Ok(())
    }

    pub async fn load_attachment_within(
        &mut self,
        path: impl AsRef<Path>,
        limit: usize,
    ) -> Result<(), CollectorError> {
        self.collector.load_attachment_within(path, limit).await?;
        self.on_edit();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.collector.clear();
        self.on_edit();
    }

    // An in-flight call keeps running; only a settled outcome is dropped.
    fn on_edit(&mut self) {
        if matches!(self.phase, Phase::Success(_) | Phase::Failed(_)) {
            debug!(from = self.phase.name(), "edit clears previous outcome");
            self.phase = Phase::Idle;
        }
    }

    /// Enter `Submitting` and hand out the request to dispatch, or `None`
    /// when a submission is already in flight.
    pub fn begin_submission(&mut self) -> Option<Request> {
        if self.is_submitting() {
            debug!("submission ignored while another is in flight");
            return None;
        }
        self.phase = Phase::Submitting;
        Some(self.collector.snapshot())
    }

    /// Record the outcome of the in-flight call. Ignored unless `Submitting`.
    pub fn settle(&mut self, outcome: Result<AnalysisResult, AnalyzeError>) {
        if !self.is_submitting() {
            debug!(phase = self.phase.name(), "settle ignored outside submission");
            return;
        }
        self.phase = match outcome {
            Ok(result) => Phase::Success(result),
            Err(error) => Phase::Failed(error),
        };
        debug!(to = self.phase.name(), "submission settled");
    }

    pub async fn submit(&mut self, dispatcher: &Dispatcher) -> SubmitOutcome {
        let Some(request) = self.begin_submission() else {
            return SubmitOutcome::Ignored;
        };
        let outcome = dispatcher.analyze(&request).await;
        self.settle(outcome);
        SubmitOutcome::Settled
    }
}
