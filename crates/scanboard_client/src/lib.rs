//! Scanboard client: job service I/O and status channels.
mod api;
mod handle;
mod poll;
mod push;
mod types;
mod validate;

pub use api::{ApiClient, ClientConfig, StatusSource};
pub use handle::{ClientCommand, ClientHandle};
pub use poll::PollSet;
pub use push::PushChannel;
pub use types::{
    is_terminal_label, ApiError, ChannelEventSink, ClientEvent, EventSink, JobId, JobSummary,
    TaskEvent, TaskKind,
};
pub use validate::{validate_args, ValidationError, MAX_ARG_LENGTH};
