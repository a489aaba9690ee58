//! Shared types for the order tracker
//!
//! Types used by both `order-server` and `order-client`: the order model,
//! push channel wire messages, the unified error system and small utilities.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use message::{DeletedOrder, EventType, PushEvent};
pub use models::{Order, OrderCreate, OrderStatus, OrderUpdate};
