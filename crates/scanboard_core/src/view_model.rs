use crate::JobId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub jobs: Vec<JobCardView>,
    pub job_count: usize,
    pub last_error: Option<String>,
    pub push_connected: bool,
    pub dirty: bool,
}

/// One rendered job card. The id is the rendering key; the registry stays the
/// single source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCardView {
    pub job_id: JobId,
    pub status_label: String,
    pub download_available: bool,
    pub created_at: Option<String>,
}
