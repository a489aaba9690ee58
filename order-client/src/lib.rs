//! Order Client - HTTP and push client for the order server
//!
//! - [`OrderApi`]: REST calls (`/api/orders`, `/api/upload`, `/api/export`)
//! - [`PushSubscriber`]: `/ws` subscription with automatic reconnect
//! - [`OrderCache`] / [`OrderSync`]: cached order list refetched on every push

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod push;
pub mod sync;

pub use cache::{OrderCache, OrderSource};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::{ExportDownload, ExportFormat, HealthStatus, OrderApi};
pub use push::{
    ConnectionState, PushSubscriber, ReconnectPolicy, SubscriberEvent, SubscriptionHandle,
};
pub use sync::OrderSync;

// Re-export shared types for convenience
pub use shared::{Order, OrderCreate, OrderStatus, OrderUpdate, PushEvent};
