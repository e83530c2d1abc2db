use crate::{AppState, Effect, JobStatus, Msg};

/// Pure update function: applies a message to state and returns any effects.
///
/// This is the only writer of the job registry. Both status channels feed it
/// through the same message queue, so every mutation is serialized and the
/// terminality invariant holds under racing producers: once a job reaches
/// Completed or Failed, later non-terminal observations are discarded.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ScanSubmitted(args) => {
            state.clear_last_error();
            state.mark_dirty();
            vec![Effect::Submit { args }]
        }
        Msg::JobAccepted { job_id, created_at } => {
            let mut effects = Vec::new();
            if state
                .registry_mut()
                .upsert_create(&job_id, JobStatus::Pending, created_at)
            {
                state.mark_dirty();
                effects.push(Effect::JobChanged {
                    job_id: job_id.clone(),
                    status: JobStatus::Pending,
                });
            }
            // The poller is the fallback in case the push channel is down or
            // misses the event. Started even when the push create arrived
            // first; the poll set guards against duplicates. A job the
            // registry refuses to track (deleted meanwhile) gets no poller.
            if state.registry().contains(&job_id) {
                effects.push(Effect::StartPoll { job_id });
            }
            effects
        }
        Msg::SubmissionRejected { failure } => {
            state.set_last_error(failure.to_string());
            state.mark_dirty();
            Vec::new()
        }
        Msg::JobCreated {
            job_id,
            status,
            created_at,
        } => {
            let status_for_card = status.clone();
            if state
                .registry_mut()
                .upsert_create(&job_id, status, created_at)
            {
                state.mark_dirty();
                vec![Effect::JobChanged {
                    job_id,
                    status: status_for_card,
                }]
            } else {
                Vec::new()
            }
        }
        Msg::StatusObserved { job_id, status } => {
            match state.registry_mut().apply_status(&job_id, status) {
                Some(applied) => {
                    state.mark_dirty();
                    let mut effects = vec![Effect::JobChanged {
                        job_id: job_id.clone(),
                        status: applied.clone(),
                    }];
                    if applied.is_terminal() {
                        effects.push(Effect::StopPoll { job_id });
                    }
                    effects
                }
                None => Vec::new(),
            }
        }
        Msg::JobDeleted { job_id } => {
            let mut effects = vec![Effect::StopPoll {
                job_id: job_id.clone(),
            }];
            if state.registry_mut().remove(&job_id) {
                state.mark_dirty();
                effects.push(Effect::JobRemoved { job_id });
            }
            effects
        }
        Msg::JobsSeeded(jobs) => {
            let mut effects = Vec::new();
            for (job_id, status) in jobs {
                let status_for_card = status.clone();
                if state.registry_mut().upsert_create(&job_id, status, None) {
                    effects.push(Effect::JobChanged {
                        job_id,
                        status: status_for_card,
                    });
                }
            }
            if !effects.is_empty() {
                state.mark_dirty();
            }
            effects
        }
        Msg::ClearAllRequested => vec![Effect::ClearJobs],
        Msg::AllJobsCleared => {
            let removed = state.registry_mut().clear();
            let mut effects = vec![Effect::StopAllPolls];
            if !removed.is_empty() {
                state.mark_dirty();
            }
            for job_id in removed {
                effects.push(Effect::JobRemoved { job_id });
            }
            effects
        }
        Msg::PushOpened => {
            state.set_push_connected(true);
            state.mark_dirty();
            Vec::new()
        }
        Msg::PushFailed { detail: _ } => {
            state.set_push_connected(false);
            state.mark_dirty();
            // The channel owner restarts the connection; disconnect then
            // connect is a single idempotent operation on the client side.
            vec![Effect::ReconnectPush]
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
