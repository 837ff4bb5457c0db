use async_trait::async_trait;
use serde_json::json;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use crate::{
    client::{Error as ClientError, GenerativeModel},
    models::{GenerateContentRequest, GenerationResponse, Part},
    profile::{COMPACT, PRO},
    render::{render, Body, Segment},
    AnalyzeError, Attachment, Dispatcher, ErrorKind, MalformedError, Phase, RenderMode, Request,
    Session, SubmitOutcome,
};

enum Reply {
    Text(&'static str),
    Status(u16),
    Blocked,
}

/// Records every call and answers with a canned reply.
struct FakeModel {
    reply: Reply,
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerateContentRequest>>,
}

impl FakeModel {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn envelope(text: &str) -> GenerationResponse {
    serde_json::from_value(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP",
            "index": 0
        }],
        "modelVersion": "gemini-2.5-flash"
    }))
    .unwrap()
}

#[async_trait]
impl GenerativeModel for FakeModel {
    async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        match self.reply {
            Reply::Text(text) => Ok(envelope(text)),
            Reply::Status(code) => Err(ClientError::BadResponse {
                code,
                description: Some("quota exceeded".to_string()),
            }),
            Reply::Blocked => Err(ClientError::PromptBlocked {
                reason: "SAFETY".to_string(),
            }),
        }
    }
}

fn dispatcher(model: &Arc<FakeModel>) -> Dispatcher {
    Dispatcher::new(Some(model.clone() as Arc<dyn GenerativeModel>), &PRO)
}

fn video(len: usize) -> Attachment {
    Attachment::new(vec![7u8; len], "video/mp4".parse().unwrap())
}

#[tokio::test]
async fn empty_request_never_reaches_the_model() {
    let model = FakeModel::new(Reply::Text("{}"));
    let err = dispatcher(&model)
        .analyze(&Request::new().with_note("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzeError::EmptyRequest));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn oversize_attachment_never_reaches_the_model() {
    let model = FakeModel::new(Reply::Text("{}"));
    let dispatcher = dispatcher(&model).with_max_attachment_bytes(1024);

    let err = dispatcher
        .analyze(&Request::new().with_attachment(video(1025)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AnalyzeError::AttachmentTooLarge {
            size: 1025,
            limit: 1024
        }
    ));
    assert_eq!(model.calls(), 0);

    // exactly at the limit is accepted
    dispatcher
        .analyze(&Request::new().with_attachment(video(1024)))
        .await
        .unwrap();
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn default_limit_is_twenty_mebibytes() {
    let model = FakeModel::new(Reply::Text("{}"));
    let err = dispatcher(&model)
        .analyze(&Request::new().with_attachment(video(20 * 1024 * 1024 + 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzeError::AttachmentTooLarge { .. }));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn missing_credential_wins_over_everything() {
    let dispatcher = Dispatcher::new(None, &PRO);
    for request in [
        Request::new(),
        Request::new().with_note("hello"),
        Request::new().with_attachment(video(30 * 1024 * 1024)),
    ] {
        let err = dispatcher.analyze(&request).await.unwrap_err();
        assert!(matches!(err, AnalyzeError::MissingCredential));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}

#[tokio::test]
async fn director_only_response_renders_one_card() {
    let model = FakeModel::new(Reply::Text(r#"{"director":"X"}"#));
    let dispatcher = dispatcher(&model);
    let mut session = Session::new();
    session.set_note("audition tape");

    assert_eq!(session.submit(&dispatcher).await, SubmitOutcome::Settled);
    let view = render(&session, &PRO, RenderMode::Cards);
    let Body::Cards { cards, .. } = &view.body else {
        panic!("expected cards, got {:?}", view.body);
    };
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].key, "director");
    assert_eq!(cards[0].body, vec![Segment::Text("X".to_string())]);
}

#[tokio::test]
async fn non_json_reply_is_a_malformed_response() {
    let model = FakeModel::new(Reply::Text("not json"));
    let mut session = Session::new();
    session.set_note("hello");
    session.submit(&dispatcher(&model)).await;

    let Phase::Failed(err) = session.phase() else {
        panic!("expected failure, got {:?}", session.phase());
    };
    assert!(matches!(
        err,
        AnalyzeError::MalformedResponse {
            source: MalformedError::InvalidJson { .. }
        }
    ));
    assert!(session.result().is_none());

    let view = render(&session, &PRO, RenderMode::Cards);
    assert_eq!(view.body, Body::Error(PRO.messages.malformed_response.into()));
    assert!(view.submit_enabled);
}

#[tokio::test]
async fn empty_reply_gets_its_own_message() {
    let model = FakeModel::new(Reply::Text(""));
    let err = dispatcher(&model)
        .analyze(&Request::new().with_note("x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    assert_eq!(err.user_message(&PRO), PRO.messages.empty_response);
}

#[tokio::test]
async fn transport_failures_are_classified_and_described() {
    let model = FakeModel::new(Reply::Status(429));
    let err = dispatcher(&model)
        .analyze(&Request::new().with_note("x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    let message = err.user_message(&PRO);
    assert!(message.starts_with(PRO.messages.transport));
    assert!(message.contains("429"));
    assert_eq!(model.calls(), 1, "no retry after a failure");

    let blocked = FakeModel::new(Reply::Blocked);
    let err = dispatcher(&blocked)
        .analyze(&Request::new().with_note("x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn second_submit_while_in_flight_is_ignored() {
    let model = FakeModel::new(Reply::Text(r#"{"producer":"ship it"}"#));
    let dispatcher = dispatcher(&model);
    let mut session = Session::new();
    session.set_note("hello");

    let request = session.begin_submission().unwrap();
    assert_eq!(session.submit(&dispatcher).await, SubmitOutcome::Ignored);
    assert_eq!(model.calls(), 0);

    let outcome = dispatcher.analyze(&request).await;
    session.settle(outcome);
    assert_eq!(model.calls(), 1);
    assert_eq!(session.result().unwrap().get("producer"), Some("ship it"));
}

#[tokio::test]
async fn edits_after_outcome_clear_it_before_next_submission() {
    let model = FakeModel::new(Reply::Text(r#"{"director":"X"}"#));
    let dispatcher = dispatcher(&model);
    let mut session = Session::new();

    session.submit(&dispatcher).await;
    assert!(matches!(session.error(), Some(AnalyzeError::EmptyRequest)));

    session.set_note("now with a note");
    assert!(session.error().is_none());
    assert!(matches!(session.phase(), Phase::Idle));

    session.submit(&dispatcher).await;
    assert!(session.result().is_some());

    session.set_attachment(video(16));
    assert!(session.result().is_none());
    assert_eq!(
        render(&session, &PRO, RenderMode::Cards).body,
        Body::Empty
    );
}

#[tokio::test]
async fn attachment_without_note_sends_default_prompt() {
    let model = FakeModel::new(Reply::Text("{}"));
    let compact = Dispatcher::new(Some(model.clone() as Arc<dyn GenerativeModel>), &COMPACT);
    compact
        .analyze(&Request::new().with_attachment(video(3)))
        .await
        .unwrap();

    let request = model.last_request.lock().unwrap().take().unwrap();
    let parts = request.contents[0].parts.clone().unwrap();
    assert_eq!(parts.len(), 2);
    assert!(matches!(&parts[0], Part::InlineData { inline_data } if inline_data.data == "BwcH"));
    assert_eq!(parts[1], Part::text(COMPACT.default_note));
    assert_eq!(
        request.generation_config.unwrap().response_mime_type.as_deref(),
        Some("application/json")
    );
}

#[test]
fn response_text_skips_thoughts_and_joins_parts() {
    let response: GenerationResponse = serde_json::from_value(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [
                {"text": "thinking...", "thought": true},
                {"text": "{\"director\":"},
                {"text": "\"X\"}"}
            ]},
            "finishReason": "STOP"
        }]
    }))
    .unwrap();
    assert_eq!(response.text(), r#"{"director":"X"}"#);
}

#[test]
fn response_without_candidates_has_empty_text() {
    let response: GenerationResponse = serde_json::from_value(json!({
        "promptFeedback": {"blockReason": "SAFETY"}
    }))
    .unwrap();
    assert_eq!(response.text(), "");
    assert_eq!(response.block_reason(), Some("SAFETY"));
}
