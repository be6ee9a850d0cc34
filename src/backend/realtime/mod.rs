//! Real-time Messaging Module
//!
//! This module is the messaging core: it accepts authenticated WebSocket
//! connections, decodes inbound envelopes, routes them by type and fans
//! frames out to the right subset of connected peers.
//!
//! # Architecture
//!
//! - **`connection`** - `ConnectionHandle`: id, identity, state, outbound queue
//! - **`registry`** - Single-owner registry of open connections
//! - **`lifecycle`** - Every state transition and registry mutation
//! - **`router`** - Type-to-handler dispatch table
//! - **`handlers`** - Chat broadcast and targeted notification handlers
//! - **`delivery`** - The fan-out primitive and recipient policies
//! - **`session`** - Upgrade handler, reader loop and writer task
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── connection.rs   - Connection handle and outbound queue
//! ├── registry.rs     - Connection registry actor
//! ├── lifecycle.rs    - Connection lifecycle manager
//! ├── router.rs       - Message router
//! ├── delivery.rs     - Fan-out and recipient policies
//! ├── session.rs      - Per-connection tasks
//! └── handlers/       - Envelope handlers
//!     ├── chat.rs
//!     └── notification.rs
//! ```
//!
//! # Control Flow
//!
//! ```text
//! upgrade ─► verify credential ─► accept ─► open (register)
//!                                             │
//!            ┌────────────────────────────────┘
//!            ▼
//!   frame ─► decode ─► route ─► handler ─► fan_out ─► recipients' queues
//!            │
//!   close / error / timeout / shutdown ─► close (unregister once)
//! ```
//!
//! # Delivery Guarantees
//!
//! At most once, best effort. Frames to one recipient arrive in the order
//! they were queued. A slow recipient loses frames rather than slowing
//! anyone else down.

pub mod connection;
pub mod delivery;
pub mod handlers;
pub mod lifecycle;
pub mod registry;
pub mod router;
pub mod session;

pub use connection::{ConnectionHandle, ConnectionId, ConnectionState, Outbound, SendFailure};
pub use delivery::{
    fan_out, DeliveryFailure, DeliveryReport, EveryoneElse, RecipientPolicy, ToIdentities,
};
pub use lifecycle::{CloseCause, LifecycleManager};
pub use registry::{ConnectionRegistry, RegistryError};
pub use router::{EnvelopeHandler, MessageRouter};
pub use session::{run_connection, ws_upgrade};
