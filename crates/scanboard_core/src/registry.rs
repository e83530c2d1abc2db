use std::collections::{HashMap, HashSet};

use crate::{JobId, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub status: JobStatus,
    pub created_at: Option<String>,
}

/// Authoritative map of known jobs, in first-observed order.
///
/// Removal leaves a tombstone for the session, so late signals for a deleted
/// id cannot resurrect it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobRegistry {
    order: Vec<JobId>,
    jobs: HashMap<JobId, Job>,
    removed: HashSet<JobId>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a job if absent. Returns `true` when a new entry was created.
    ///
    /// A duplicate creation signal is a no-op: it never overwrites an
    /// already-advanced status. Creation of a previously removed id is
    /// rejected.
    pub fn upsert_create(
        &mut self,
        job_id: &str,
        status: JobStatus,
        created_at: Option<String>,
    ) -> bool {
        if self.removed.contains(job_id) || self.jobs.contains_key(job_id) {
            return false;
        }
        self.order.push(job_id.to_string());
        self.jobs
            .insert(job_id.to_string(), Job { status, created_at });
        true
    }

    /// Applies an observed status. Returns the new status only when the entry
    /// actually changed; duplicate values and post-terminal updates yield
    /// `None`.
    ///
    /// An unknown id is an implicit create at the observed status, unless the
    /// id was removed earlier this session.
    pub fn apply_status(&mut self, job_id: &str, status: JobStatus) -> Option<JobStatus> {
        if self.removed.contains(job_id) {
            return None;
        }
        match self.jobs.get_mut(job_id) {
            Some(job) => {
                if job.status.is_terminal() || job.status == status {
                    return None;
                }
                job.status = status.clone();
                Some(status)
            }
            None => {
                self.order.push(job_id.to_string());
                self.jobs.insert(
                    job_id.to_string(),
                    Job {
                        status: status.clone(),
                        created_at: None,
                    },
                );
                Some(status)
            }
        }
    }

    /// Removes a job. Returns `true` when an entry existed.
    ///
    /// Unknown ids are a silent no-op, but still tombstoned: a deletion can
    /// race ahead of the creation signal for the same id.
    pub fn remove(&mut self, job_id: &str) -> bool {
        self.removed.insert(job_id.to_string());
        if self.jobs.remove(job_id).is_none() {
            return false;
        }
        self.order.retain(|id| id != job_id);
        true
    }

    /// Empties the registry, tombstoning every removed id.
    /// Returns the removed ids in insertion order.
    pub fn clear(&mut self) -> Vec<JobId> {
        let removed: Vec<JobId> = self.order.drain(..).collect();
        self.jobs.clear();
        self.removed.extend(removed.iter().cloned());
        removed
    }

    pub fn get(&self, job_id: &str) -> Option<&Job> {
        self.jobs.get(job_id)
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.jobs.contains_key(job_id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Restartable iteration over `(id, job)` in first-observed order.
    pub fn snapshot(&self) -> impl Iterator<Item = (&JobId, &Job)> {
        self.order
            .iter()
            .filter_map(|id| self.jobs.get(id).map(|job| (id, job)))
    }
}
