//! The Anthropic Messages API-compatible endpoint.

use std::{collections::VecDeque, sync::Arc};

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, Sse},
    },
};
use futures_util::{Stream, StreamExt};
use serde_json::json;
use session::RequestBuilder;
use streaming::{Interceptor, Outcome, StreamingEvent, UnknownEventPolicy};
use uuid::Uuid;

use crate::{request::MessagesRequest, state::AppState};

const SESSION_ID_HEADER: &str = "x-clove-session-id";

/// `POST /v1/messages`.
pub async fn messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<MessagesRequest>,
) -> Response {
    let mut session_id = headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| format!("session_{}", Uuid::new_v4()));

    if let Some(tool_use_id) = request.pending_tool_result_id() {
        match state.tool_calls.lookup(&tool_use_id) {
            Some(origin) => {
                log::debug!("Resuming session {} for tool result {tool_use_id}", origin.session_id);
                session_id = origin.session_id;
                state.tool_calls.remove(&tool_use_id);
            }
            None => log::debug!("No parked tool call found for tool result {tool_use_id}"),
        }
    }

    let account = match state.pool.get_account_for_session(&session_id, None, None).await {
        Ok(account) => account,
        Err(err) => return error_response(StatusCode::SERVICE_UNAVAILABLE, &err.to_string()),
    };

    let Some(cookie) = account.cookie_value.clone() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "selected account has no usable cookie");
    };

    let session = (state.session_factory)(&cookie);
    let builder = RequestBuilder::new(&state.request_config);

    let output = match builder.build_and_send(session, request.into_build_input()).await {
        Ok(output) => output,
        Err(err) => return error_response(StatusCode::BAD_GATEWAY, &err.to_string()),
    };

    let parsed: std::pin::Pin<Box<dyn Stream<Item = Result<StreamingEvent, streaming::ParseError>> + Send>> =
        Box::pin(streaming::parse(output.stream, UnknownEventPolicy::Skip));
    let interceptor = Interceptor::new(session_id, output.has_web_search, state.tool_calls.clone());

    Sse::new(intercepted_events(parsed, interceptor)).into_response()
}

struct PumpState<S> {
    inner: S,
    interceptor: Interceptor,
    pending: VecDeque<StreamingEvent>,
    finished: bool,
}

fn intercepted_events<S>(
    inner: S,
    interceptor: Interceptor,
) -> impl Stream<Item = Result<Event, std::convert::Infallible>>
where
    S: Stream<Item = Result<StreamingEvent, streaming::ParseError>> + Unpin,
{
    let state = PumpState {
        inner,
        interceptor,
        pending: VecDeque::new(),
        finished: false,
    };

    futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(to_sse_event(&event)), state));
            }

            if state.finished {
                return None;
            }

            match state.inner.next().await {
                None => return None,
                Some(Err(err)) => {
                    log::warn!("Stream parse error: {err}");
                    return None;
                }
                Some(Ok(event)) => match state.interceptor.process(event) {
                    Outcome::Forward(event) => state.pending.push_back(event),
                    Outcome::Suppress => {}
                    Outcome::Terminate(events) => {
                        state.pending.extend(events);
                        state.finished = true;
                    }
                },
            }
        }
    })
}

fn to_sse_event(event: &StreamingEvent) -> Event {
    let (name, payload) = match event {
        StreamingEvent::MessageStart { .. } => ("message_start", serde_json::to_value(event)),
        StreamingEvent::ContentBlockStart { .. } => ("content_block_start", serde_json::to_value(event)),
        StreamingEvent::ContentBlockDelta { .. } => ("content_block_delta", serde_json::to_value(event)),
        StreamingEvent::ContentBlockStop { .. } => ("content_block_stop", serde_json::to_value(event)),
        StreamingEvent::MessageDelta { .. } => ("message_delta", serde_json::to_value(event)),
        StreamingEvent::MessageStop => ("message_stop", serde_json::to_value(event)),
        StreamingEvent::Ping => ("ping", serde_json::to_value(event)),
        StreamingEvent::Error { .. } => ("error", serde_json::to_value(event)),
        StreamingEvent::Unknown(value) => ("unknown", Ok(value.clone())),
    };

    let data = payload.unwrap_or_else(|err| json!({"type": "error", "error": err.to_string()}));
    Event::default().event(name).data(data.to_string())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "type": "error",
            "error": {"type": "proxy_error", "message": message},
        })),
    )
        .into_response()
}
