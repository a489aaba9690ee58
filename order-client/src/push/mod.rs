//! Push channel subscriber
//!
//! ```text
//!            connect ok                 close / error (not ours)
//! Disconnected ───► Connecting ───► Connected ───────────────► Disconnected
//!      ▲                │                                         │
//!      │                └── connect failed ──────────────────────►│
//!      └──────────────── wait policy delay (3s) ◄─────────────────┘
//!
//! shutdown(): cancel pending wait, close with 1000, stop the loop
//! ```

mod policy;
mod subscriber;
mod transport;

pub use policy::ReconnectPolicy;
pub use subscriber::{ConnectionState, PushSubscriber, SubscriberEvent, SubscriptionHandle};
pub use transport::{Frame, PushConnection, PushConnector, WsConnector};

/// Close code sent by the subscriber on teardown
pub const DELIBERATE_CLOSE_CODE: u16 = 1000;
