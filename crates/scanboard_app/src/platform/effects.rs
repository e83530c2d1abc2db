use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use client_logging::{client_info, client_warn};
use scanboard_client::{
    ApiError, ClientCommand, ClientConfig, ClientEvent, ClientHandle, TaskKind,
};
use scanboard_core::{Effect, JobStatus, Msg, SubmitFailure};

use super::app::AppMsg;

// Grace period before redialing a failed push connection.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

pub struct EffectRunner {
    client: ClientHandle,
}

impl EffectRunner {
    pub fn new(config: ClientConfig, msg_tx: mpsc::Sender<AppMsg>) -> Result<Self, ApiError> {
        let client = ClientHandle::new(config)?;
        let runner = Self { client };
        runner.spawn_event_loop(msg_tx);
        Ok(runner)
    }

    pub fn connect_push(&self) {
        self.client.send(ClientCommand::ConnectPush);
    }

    pub fn fetch_job_list(&self) {
        self.client.send(ClientCommand::FetchJobList);
    }

    pub fn run(&self, effect: Effect) {
        match effect {
            Effect::Submit { args } => {
                client_info!("Submit args_len={}", args.len());
                self.client.send(ClientCommand::Submit { args });
            }
            Effect::StartPoll { job_id } => {
                self.client.send(ClientCommand::StartPoll { job_id });
            }
            Effect::StopPoll { job_id } => {
                self.client.send(ClientCommand::StopPoll { job_id });
            }
            Effect::StopAllPolls => self.client.send(ClientCommand::StopAllPolls),
            Effect::FetchJobList => self.client.send(ClientCommand::FetchJobList),
            Effect::ClearJobs => self.client.send(ClientCommand::ClearJobs),
            Effect::ReconnectPush => {
                let cmd_tx = self.client.sender();
                thread::spawn(move || {
                    thread::sleep(RECONNECT_DELAY);
                    let _ = cmd_tx.send(ClientCommand::ReconnectPush);
                });
            }
            Effect::JobChanged { .. } | Effect::JobRemoved { .. } => {
                // Rendering notifications are consumed by the dispatch loop.
            }
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<AppMsg>) {
        let client = self.client.clone();
        thread::spawn(move || loop {
            if let Some(event) = client.try_recv() {
                if msg_tx.send(AppMsg::Core(map_event(event))).is_err() {
                    break;
                }
            } else {
                thread::sleep(Duration::from_millis(20));
            }
        });
    }
}

/// Translates backend events into core messages, including the wire-status
/// to core-status mapping.
fn map_event(event: ClientEvent) -> Msg {
    match event {
        ClientEvent::Submitted { job_id } => {
            client_info!("job {job_id} accepted");
            Msg::JobAccepted {
                job_id,
                created_at: Some(now()),
            }
        }
        ClientEvent::SubmitFailed { error } => {
            client_warn!("submission failed: {error}");
            Msg::SubmissionRejected {
                failure: map_failure(error),
            }
        }
        ClientEvent::PollStatus { job_id, status } => Msg::StatusObserved {
            job_id,
            status: JobStatus::parse(&status),
        },
        ClientEvent::Push(event) => match event.task {
            TaskKind::Create => Msg::JobCreated {
                job_id: event.uuid,
                status: event
                    .status
                    .as_deref()
                    .map(JobStatus::parse)
                    .unwrap_or(JobStatus::Pending),
                created_at: Some(now()),
            },
            TaskKind::Update => match event.status {
                Some(status) => Msg::StatusObserved {
                    job_id: event.uuid,
                    status: JobStatus::parse(&status),
                },
                None => {
                    client_warn!("update event without status for job {}", event.uuid);
                    Msg::NoOp
                }
            },
            TaskKind::Delete => Msg::JobDeleted { job_id: event.uuid },
        },
        ClientEvent::PushOpened => Msg::PushOpened,
        ClientEvent::PushErrored { detail } => {
            client_warn!("push channel error: {detail}");
            Msg::PushFailed { detail }
        }
        ClientEvent::JobList(jobs) => Msg::JobsSeeded(
            jobs.into_iter()
                .map(|job| (job.uuid, JobStatus::parse(&job.status)))
                .collect(),
        ),
        ClientEvent::JobListFailed { error } => {
            client_warn!("job list fetch failed: {error}");
            Msg::NoOp
        }
        ClientEvent::JobsCleared => Msg::AllJobsCleared,
        ClientEvent::ClearFailed { error } => {
            client_warn!("delete all failed: {error}");
            Msg::NoOp
        }
    }
}

fn map_failure(error: ApiError) -> SubmitFailure {
    match error {
        ApiError::InvalidArgument(err) => SubmitFailure::InvalidArgument(err.to_string()),
        ApiError::Forbidden => SubmitFailure::Forbidden,
        ApiError::Rejected { status, body } => SubmitFailure::Rejected {
            status,
            detail: body,
        },
        ApiError::Transport(detail) | ApiError::MalformedResponse(detail) => {
            SubmitFailure::Transport(detail)
        }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}
