use std::sync::Once;

use scanboard_core::{update, AppState, Effect, JobStatus, Msg};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(client_logging::initialize_for_tests);
}

fn accept_job(state: AppState, job_id: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::JobAccepted {
            job_id: job_id.to_string(),
            created_at: None,
        },
    )
}

fn observe(state: AppState, job_id: &str, status: JobStatus) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StatusObserved {
            job_id: job_id.to_string(),
            status,
        },
    )
}

#[test]
fn duplicate_create_leaves_single_entry_with_original_status() {
    init_logging();
    let (state, _effects) = accept_job(AppState::new(), "job-1");
    let (state, _effects) = observe(state, "job-1", JobStatus::InProgress);

    // A late duplicate "create" must not regress the advanced status.
    let (state, effects) = update(
        state,
        Msg::JobCreated {
            job_id: "job-1".to_string(),
            status: JobStatus::Pending,
            created_at: None,
        },
    );

    assert_eq!(state.registry().len(), 1);
    assert_eq!(
        state.registry().get("job-1").unwrap().status,
        JobStatus::InProgress
    );
    assert!(effects.is_empty());
}

#[test]
fn accepted_submission_registers_pending_and_starts_poller() {
    init_logging();
    let (mut state, effects) = accept_job(AppState::new(), "job-1");

    assert_eq!(
        state.registry().get("job-1").unwrap().status,
        JobStatus::Pending
    );
    assert_eq!(
        effects,
        vec![
            Effect::JobChanged {
                job_id: "job-1".to_string(),
                status: JobStatus::Pending,
            },
            Effect::StartPoll {
                job_id: "job-1".to_string(),
            },
        ]
    );
    assert!(state.consume_dirty());
}

#[test]
fn terminal_status_is_absorbing() {
    init_logging();
    let (state, _effects) = accept_job(AppState::new(), "job-1");
    let (state, _effects) = observe(state, "job-1", JobStatus::Completed);
    let (state, effects) = observe(state, "job-1", JobStatus::InProgress);

    assert_eq!(
        state.registry().get("job-1").unwrap().status,
        JobStatus::Completed
    );
    assert!(effects.is_empty());
}

#[test]
fn repeated_status_is_suppressed() {
    init_logging();
    let (state, _effects) = accept_job(AppState::new(), "job-1");
    let (mut state, effects) = observe(state, "job-1", JobStatus::InProgress);
    assert_eq!(effects.len(), 1);
    assert!(state.consume_dirty());

    let (mut state, effects) = observe(state, "job-1", JobStatus::InProgress);
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
}

#[test]
fn status_for_unknown_id_is_an_implicit_create() {
    init_logging();
    let (state, effects) = observe(AppState::new(), "job-9", JobStatus::InProgress);

    assert_eq!(
        state.registry().get("job-9").unwrap().status,
        JobStatus::InProgress
    );
    assert_eq!(
        effects,
        vec![Effect::JobChanged {
            job_id: "job-9".to_string(),
            status: JobStatus::InProgress,
        }]
    );
}

#[test]
fn unknown_status_label_is_kept_verbatim_and_not_terminal() {
    init_logging();
    let status = JobStatus::parse("Unhandled container exception: boom");
    assert!(!status.is_terminal());

    let (state, _effects) = observe(AppState::new(), "job-1", status);
    let view = state.view();
    assert_eq!(
        view.jobs[0].status_label,
        "Unhandled container exception: boom"
    );
    assert!(!view.jobs[0].download_available);
}

#[test]
fn terminal_labels_parse_case_insensitively() {
    init_logging();
    assert_eq!(JobStatus::parse("completed"), JobStatus::Completed);
    assert_eq!(JobStatus::parse("COMPLETED"), JobStatus::Completed);
    assert_eq!(JobStatus::parse("Errored"), JobStatus::Failed);
    assert_eq!(JobStatus::parse("Queued"), JobStatus::Pending);
    assert_eq!(JobStatus::parse("Started"), JobStatus::InProgress);
}

#[test]
fn delete_removes_entry_and_blocks_resurrection() {
    init_logging();
    let (state, _effects) = accept_job(AppState::new(), "job-1");
    let (state, effects) = update(
        state,
        Msg::JobDeleted {
            job_id: "job-1".to_string(),
        },
    );

    assert!(state.registry().is_empty());
    assert_eq!(
        effects,
        vec![
            Effect::StopPoll {
                job_id: "job-1".to_string(),
            },
            Effect::JobRemoved {
                job_id: "job-1".to_string(),
            },
        ]
    );

    // Stray late signals for the deleted id stay dead.
    let (state, effects) = observe(state, "job-1", JobStatus::InProgress);
    assert!(state.registry().is_empty());
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::JobCreated {
            job_id: "job-1".to_string(),
            status: JobStatus::Pending,
            created_at: None,
        },
    );
    assert!(state.registry().is_empty());
    assert!(effects.is_empty());
}

#[test]
fn acceptance_after_delete_starts_no_poller() {
    init_logging();
    let (state, _effects) = accept_job(AppState::new(), "job-1");
    let (state, _effects) = update(
        state,
        Msg::JobDeleted {
            job_id: "job-1".to_string(),
        },
    );

    // A submission response racing behind the delete must not revive the job
    // or leave a poller running for it.
    let (state, effects) = accept_job(state, "job-1");
    assert!(state.registry().is_empty());
    assert!(effects.is_empty());
}

#[test]
fn delete_of_unknown_id_is_silent() {
    init_logging();
    let (mut state, effects) = update(
        AppState::new(),
        Msg::JobDeleted {
            job_id: "never-seen".to_string(),
        },
    );

    assert!(state.registry().is_empty());
    // Stop is issued regardless; the poll set treats it as a no-op.
    assert_eq!(
        effects,
        vec![Effect::StopPoll {
            job_id: "never-seen".to_string(),
        }]
    );
    assert!(!state.consume_dirty());
}

#[test]
fn snapshot_preserves_first_observed_order() {
    init_logging();
    let (state, _effects) = accept_job(AppState::new(), "job-b");
    let (state, _effects) = accept_job(state, "job-a");
    let (state, _effects) = accept_job(state, "job-c");

    let ids: Vec<_> = state.view().jobs.iter().map(|j| j.job_id.clone()).collect();
    assert_eq!(ids, vec!["job-b", "job-a", "job-c"]);

    // Status changes must not reorder the cards.
    let (state, _effects) = observe(state, "job-a", JobStatus::Completed);
    let ids: Vec<_> = state.view().jobs.iter().map(|j| j.job_id.clone()).collect();
    assert_eq!(ids, vec!["job-b", "job-a", "job-c"]);
}

#[test]
fn clear_all_flow_empties_registry_and_stops_pollers() {
    init_logging();
    let (state, _effects) = accept_job(AppState::new(), "job-1");
    let (state, _effects) = accept_job(state, "job-2");

    let (state, effects) = update(state, Msg::ClearAllRequested);
    assert_eq!(effects, vec![Effect::ClearJobs]);
    assert_eq!(state.registry().len(), 2);

    let (state, effects) = update(state, Msg::AllJobsCleared);
    assert!(state.registry().is_empty());
    assert_eq!(
        effects,
        vec![
            Effect::StopAllPolls,
            Effect::JobRemoved {
                job_id: "job-1".to_string(),
            },
            Effect::JobRemoved {
                job_id: "job-2".to_string(),
            },
        ]
    );

    // Cleared ids are tombstoned like individually deleted ones.
    let (state, effects) = observe(state, "job-1", JobStatus::InProgress);
    assert!(state.registry().is_empty());
    assert!(effects.is_empty());
}
