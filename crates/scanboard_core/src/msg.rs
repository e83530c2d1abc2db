use std::fmt;

use crate::{JobId, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User submitted scan arguments.
    ScanSubmitted(String),
    /// The service accepted a submission and returned a job id.
    JobAccepted {
        job_id: JobId,
        created_at: Option<String>,
    },
    /// A submission did not produce a job.
    SubmissionRejected { failure: SubmitFailure },
    /// Push channel announced a new job.
    JobCreated {
        job_id: JobId,
        status: JobStatus,
        created_at: Option<String>,
    },
    /// Status observed for a job, on either channel (push update or poll
    /// result — the two are interchangeable producers).
    StatusObserved { job_id: JobId, status: JobStatus },
    /// Push channel announced a job removal.
    JobDeleted { job_id: JobId },
    /// Startup seed from the server-side job list.
    JobsSeeded(Vec<(JobId, JobStatus)>),
    /// User asked to delete all jobs.
    ClearAllRequested,
    /// The service confirmed the delete-all; mirror it locally.
    AllJobsCleared,
    /// Push connection established.
    PushOpened,
    /// Push connection failed or ended.
    PushFailed { detail: String },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

/// Why a submission produced no job. Carried into state for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitFailure {
    /// Arguments were rejected before any network call.
    InvalidArgument(String),
    /// The service denied access.
    Forbidden,
    /// The service rejected the submission.
    Rejected { status: u16, detail: String },
    /// The request never completed.
    Transport(String),
}

impl fmt::Display for SubmitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitFailure::InvalidArgument(reason) => write!(f, "{reason}"),
            SubmitFailure::Forbidden => write!(f, "Access Forbidden"),
            SubmitFailure::Rejected { status, detail } => {
                write!(f, "submission rejected (http {status}): {detail}")
            }
            SubmitFailure::Transport(detail) => write!(f, "submission failed: {detail}"),
        }
    }
}
