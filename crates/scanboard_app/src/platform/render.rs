use scanboard_core::{AppViewModel, JobStatus};

/// Terminal card rendering keyed by job id. A completed job renders its
/// download link exactly once, on the transition.
pub(crate) fn card_changed(job_id: &str, status: &JobStatus, base_url: &str) {
    if *status == JobStatus::Completed {
        println!("[{job_id}] Download {}", download_url(base_url, job_id));
    } else {
        println!("[{job_id}] {status}");
    }
}

pub(crate) fn card_removed(job_id: &str) {
    println!("[{job_id}] removed");
}

pub(crate) fn print_error(message: &str) {
    println!("error: {message}");
}

pub(crate) fn print_snapshot(view: &AppViewModel, base_url: &str) {
    if !view.push_connected {
        println!("(push channel down, relying on polling)");
    }
    if view.jobs.is_empty() {
        println!("no jobs");
        return;
    }
    for job in &view.jobs {
        if job.download_available {
            println!("[{}] Download {}", job.job_id, download_url(base_url, &job.job_id));
        } else {
            println!("[{}] {}", job.job_id, job.status_label);
        }
    }
}

fn download_url(base_url: &str, job_id: &str) -> String {
    format!("{}/job/download?uuid={job_id}", base_url.trim_end_matches('/'))
}
