//! Push channel
//!
//! # 架构
//!
//! ```text
//! API handler (create / update / delete)
//!       │ PushEvent
//!       ▼
//! PushHub::broadcast ── serialize once ──┐
//!       │                                │ try_send (never blocks)
//!       ├── connection 1: mpsc queue ◄───┤
//!       ├── connection 2: mpsc queue ◄───┤
//!       └── connection N: mpsc queue ◄───┘
//!               │
//!               ▼
//!       push session task ── WebSocket text frame ──▶ client
//! ```
//!
//! Membership is in-memory only; a client that is offline during a
//! broadcast misses the event and refetches after reconnecting.

mod hub;
mod session;

pub use hub::{BroadcastReport, ConnectionId, PushConnection, PushFrame, PushHub};
pub use session::ws_handler;
