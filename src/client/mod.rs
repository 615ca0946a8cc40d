pub mod chat;
pub mod error_sink;
pub mod heartbeat;
pub mod session;

pub use chat::{ChatClient, DEFAULT_HEARTBEAT_INTERVAL};
pub use error_sink::{ErrorRecord, ErrorSink};
pub use heartbeat::HeartbeatHandle;
pub use session::Session;
