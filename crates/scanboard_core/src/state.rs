use crate::view_model::{AppViewModel, JobCardView};
use crate::{JobRegistry, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    registry: JobRegistry,
    last_error: Option<String>,
    push_connected: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut JobRegistry {
        &mut self.registry
    }

    pub fn view(&self) -> AppViewModel {
        let jobs: Vec<JobCardView> = self
            .registry
            .snapshot()
            .map(|(job_id, job)| JobCardView {
                job_id: job_id.clone(),
                status_label: job.status.to_string(),
                download_available: job.status == JobStatus::Completed,
                created_at: job.created_at.clone(),
            })
            .collect();
        AppViewModel {
            job_count: jobs.len(),
            jobs,
            last_error: self.last_error.clone(),
            push_connected: self.push_connected,
            dirty: self.dirty,
        }
    }

    /// Returns whether a render is due and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        let was_dirty = self.dirty;
        self.dirty = false;
        was_dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_last_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    pub(crate) fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    pub(crate) fn set_push_connected(&mut self, connected: bool) {
        self.push_connected = connected;
    }
}
