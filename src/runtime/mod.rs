mod channel;
mod command;
mod context;
mod effects;
mod listeners;
mod session;
mod state;

pub use channel::{Channel, ChannelEvent, ChannelOptions};
pub use command::RuntimeCommand;
pub use context::Context;
pub use effects::{Effects, FetchOptions, HttpEffects};
pub use listeners::{ListenerRegistry, ResumeToken};
pub use session::{PendingConfirmation, Session};
pub use state::{ConfirmationChoice, ConfirmationModal, ItemState, MemoryStateHost, PreviewState, StateHost};
