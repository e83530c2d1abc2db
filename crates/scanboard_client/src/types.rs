use serde::Deserialize;
use thiserror::Error;

use crate::validate::ValidationError;

pub type JobId = String;

/// A decoded push event from the subscription stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEvent {
    pub task: TaskKind,
    pub uuid: JobId,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Create,
    Update,
    Delete,
}

impl TaskKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "create" => Some(TaskKind::Create),
            "update" => Some(TaskKind::Update),
            "delete" => Some(TaskKind::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTaskEvent {
    task: String,
    uuid: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Error)]
pub(crate) enum EventDecodeError {
    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown task '{0}'")]
    UnknownTask(String),
}

/// Decodes one SSE data payload into a [`TaskEvent`].
pub(crate) fn decode_event(payload: &str) -> Result<TaskEvent, EventDecodeError> {
    let raw: RawTaskEvent = serde_json::from_str(payload)?;
    let task = TaskKind::parse(&raw.task).ok_or(EventDecodeError::UnknownTask(raw.task))?;
    Ok(TaskEvent {
        task,
        uuid: raw.uuid,
        status: raw.status,
    })
}

/// One entry of the server-side job list. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobSummary {
    pub uuid: JobId,
    pub status: String,
}

/// Whether a raw wire status label means the job is finished.
///
/// Must agree with the status vocabulary of the state machine: a poll loop
/// stops itself on exactly the labels the registry treats as terminal.
pub fn is_terminal_label(status: &str) -> bool {
    let folded = status.trim().to_ascii_lowercase();
    matches!(folded.as_str(), "completed" | "failed" | "errored" | "error")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Arguments rejected before any network call was made.
    #[error("{0}")]
    InvalidArgument(#[from] ValidationError),
    /// The service denied access.
    #[error("access forbidden")]
    Forbidden,
    /// The service answered with a non-success status.
    #[error("request rejected (http {status}): {body}")]
    Rejected { status: u16, body: String },
    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered with something we could not decode.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Everything the client backend reports to its owner.
///
/// Poll observations and push events both end up here; the consumer applies
/// them through one serialized queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Submission accepted; the service returned a job id.
    Submitted { job_id: JobId },
    /// Submission failed before or during the network call.
    SubmitFailed { error: ApiError },
    /// A status observation from a per-job poll loop.
    PollStatus { job_id: JobId, status: String },
    /// A decoded push event.
    Push(TaskEvent),
    /// The push connection opened.
    PushOpened,
    /// The push connection errored or ended.
    PushErrored { detail: String },
    /// The server-side job list arrived.
    JobList(Vec<JobSummary>),
    /// The job list fetch failed.
    JobListFailed { error: ApiError },
    /// The server confirmed deletion of all jobs.
    JobsCleared,
    /// The delete-all request failed.
    ClearFailed { error: ApiError },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: ClientEvent);
}

/// Sink backed by a std mpsc channel; the consumer drains on its own thread.
pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<ClientEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<ClientEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: ClientEvent) {
        let _ = self.tx.send(event);
    }
}
