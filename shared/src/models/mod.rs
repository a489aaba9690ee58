//! Data models shared by server and client

pub mod order;

pub use order::{Order, OrderCreate, OrderStatus, OrderUpdate};
