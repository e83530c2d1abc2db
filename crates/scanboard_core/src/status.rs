use std::fmt;

pub type JobId = String;

/// Status of a tracked scan job.
///
/// `Other` preserves a status label the client does not recognize; it is
/// displayed verbatim and never treated as terminal. A label that compares
/// case-insensitively equal to a terminal label parses to that terminal
/// variant instead, so `Other` can never shadow one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Other(String),
}

impl JobStatus {
    /// Parses a wire status string, case-insensitively.
    ///
    /// The job service historically reported "Queued" and "Started" for the
    /// first two phases; both aliases are accepted.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "pending" | "queued" => JobStatus::Pending,
            "in progress" | "inprogress" | "started" => JobStatus::InProgress,
            "completed" => JobStatus::Completed,
            "failed" | "errored" | "error" => JobStatus::Failed,
            _ => JobStatus::Other(trimmed.to_string()),
        }
    }

    /// Terminal statuses are absorbing: no further transitions except removal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "Pending"),
            JobStatus::InProgress => write!(f, "In Progress"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed => write!(f, "Failed"),
            JobStatus::Other(label) => write!(f, "{label}"),
        }
    }
}
