use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use crate::api::{ApiClient, ClientConfig};
use crate::poll::PollSet;
use crate::push::PushChannel;
use crate::types::{ApiError, ChannelEventSink, ClientEvent, EventSink, JobId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Submit { args: String },
    StartPoll { job_id: JobId },
    StopPoll { job_id: JobId },
    StopAllPolls,
    FetchJobList,
    ClearJobs,
    ConnectPush,
    DisconnectPush,
    ReconnectPush,
}

/// Handle to the client backend: a dedicated thread owning a tokio runtime,
/// fed commands over a channel and reporting [`ClientEvent`]s back.
///
/// Commands are processed in order on the backend thread; spawned work (a
/// submission, a poll loop, the push stream) runs on the runtime's workers
/// and reports through the same event channel.
#[derive(Clone)]
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<ClientEvent>>>,
}

impl ClientHandle {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        // Built eagerly so a bad configuration fails construction instead of
        // the backend thread.
        let api = Arc::new(ApiClient::new(config.clone())?);
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
            let polls = PollSet::new(
                runtime.handle().clone(),
                api.clone(),
                sink.clone(),
                config.poll_interval,
            );
            let push = PushChannel::new(
                runtime.handle().clone(),
                config.connect_timeout,
                api.subscribe_url(),
                sink.clone(),
            );

            while let Ok(command) = cmd_rx.recv() {
                handle_command(&runtime, &api, &sink, &polls, &push, command);
            }
            // Owner dropped the handle; tear everything down.
            push.disconnect();
            polls.stop_all();
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn send(&self, command: ClientCommand) {
        let _ = self.cmd_tx.send(command);
    }

    /// Clone of the command sender, for owners that schedule commands from
    /// other threads (e.g. a delayed reconnect).
    pub fn sender(&self) -> mpsc::Sender<ClientCommand> {
        self.cmd_tx.clone()
    }

    pub fn try_recv(&self) -> Option<ClientEvent> {
        self.event_rx
            .lock()
            .expect("client events lock")
            .try_recv()
            .ok()
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    api: &Arc<ApiClient>,
    sink: &Arc<dyn EventSink>,
    polls: &PollSet,
    push: &PushChannel,
    command: ClientCommand,
) {
    match command {
        ClientCommand::Submit { args } => {
            let api = api.clone();
            let sink = sink.clone();
            runtime.spawn(async move {
                match api.create_job(&args).await {
                    Ok(job_id) => sink.emit(ClientEvent::Submitted { job_id }),
                    Err(error) => sink.emit(ClientEvent::SubmitFailed { error }),
                }
            });
        }
        ClientCommand::StartPoll { job_id } => polls.start(&job_id),
        ClientCommand::StopPoll { job_id } => polls.stop(&job_id),
        ClientCommand::StopAllPolls => polls.stop_all(),
        ClientCommand::FetchJobList => {
            let api = api.clone();
            let sink = sink.clone();
            runtime.spawn(async move {
                match api.list_jobs().await {
                    Ok(jobs) => sink.emit(ClientEvent::JobList(jobs)),
                    Err(error) => sink.emit(ClientEvent::JobListFailed { error }),
                }
            });
        }
        ClientCommand::ClearJobs => {
            let api = api.clone();
            let sink = sink.clone();
            runtime.spawn(async move {
                match api.delete_all_jobs().await {
                    Ok(()) => sink.emit(ClientEvent::JobsCleared),
                    Err(error) => sink.emit(ClientEvent::ClearFailed { error }),
                }
            });
        }
        ClientCommand::ConnectPush => push.connect(),
        ClientCommand::DisconnectPush => push.disconnect(),
        ClientCommand::ReconnectPush => {
            push.disconnect();
            push.connect();
        }
    }
}
