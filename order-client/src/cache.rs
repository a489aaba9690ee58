//! Cached order list
//!
//! Push events never patch the cache: they only invalidate it, and the next
//! read refetches the full list from the server.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::{ClientResult, OrderApi};
use shared::models::Order;

/// Where the cache fetches orders from
#[async_trait]
pub trait OrderSource: Send + Sync + 'static {
    async fn fetch_orders(&self) -> ClientResult<Vec<Order>>;
}

#[async_trait]
impl OrderSource for OrderApi {
    async fn fetch_orders(&self) -> ClientResult<Vec<Order>> {
        self.list_orders().await
    }
}

#[derive(Default)]
struct CacheState {
    orders: Option<Arc<Vec<Order>>>,
    generation: u64,
}

pub struct OrderCache<S> {
    source: S,
    state: Mutex<CacheState>,
}

impl<S: OrderSource> OrderCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Drop the cached list; the next read refetches
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.orders = None;
        state.generation += 1;
    }

    /// Bumped by every invalidation
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Cached list without fetching
    pub fn cached(&self) -> Option<Arc<Vec<Order>>> {
        self.state.lock().orders.clone()
    }

    /// Cached list, fetched first if missing
    ///
    /// A fetch that races with `invalidate` is returned but not stored.
    pub async fn orders(&self) -> ClientResult<Arc<Vec<Order>>> {
        let generation = {
            let state = self.state.lock();
            if let Some(orders) = &state.orders {
                return Ok(orders.clone());
            }
            state.generation
        };

        let orders = Arc::new(self.source.fetch_orders().await?);

        let mut state = self.state.lock();
        if state.generation == generation {
            state.orders = Some(orders.clone());
        }
        Ok(orders)
    }

    /// Invalidate and fetch again
    pub async fn refresh(&self) -> ClientResult<Arc<Vec<Order>>> {
        self.invalidate();
        self.orders().await
    }
}
