use crate::{JobId, JobStatus};

/// Commands the reconciler hands back to the platform layer.
///
/// The first group is I/O for the client backend; `JobChanged`/`JobRemoved`
/// are incremental notifications for the rendering adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Submit scan arguments to the job service.
    Submit { args: String },
    /// Start the fallback status poller for a job.
    StartPoll { job_id: JobId },
    /// Cancel the status poller for a job, if one is active.
    StopPoll { job_id: JobId },
    /// Cancel every active status poller.
    StopAllPolls,
    /// Fetch the server-side job list to seed the registry.
    FetchJobList,
    /// Ask the service to delete all jobs.
    ClearJobs,
    /// Tear down and re-establish the push connection.
    ReconnectPush,
    /// A job card changed.
    JobChanged { job_id: JobId, status: JobStatus },
    /// A job card disappeared.
    JobRemoved { job_id: JobId },
}
