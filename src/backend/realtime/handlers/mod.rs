//! Envelope Handlers
//!
//! One handler per message type, registered with the
//! [`MessageRouter`](crate::backend::realtime::router::MessageRouter):
//!
//! - **`chat`** - `CHAT`: broadcast to every other open connection
//! - **`notification`** - `NOTIFICATION`: targeted delivery by identity
//!
//! Both build a `ServerFrame` attributed to the source connection's identity
//! and hand it to [`fan_out`](crate::backend::realtime::delivery::fan_out)
//! with their own recipient policy.

pub mod chat;
pub mod notification;

pub use chat::ChatHandler;
pub use notification::NotificationHandler;
