//! Keeps an [`OrderCache`] in step with the push channel

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::{OrderCache, OrderSource};
use crate::push::{
    PushConnector, PushSubscriber, ReconnectPolicy, SubscriberEvent, SubscriptionHandle,
};
use crate::ClientConfig;

/// Refetches the order list on every push event and on every (re)connect
pub struct OrderSync<S> {
    cache: Arc<OrderCache<S>>,
    subscription: SubscriptionHandle,
    refreshes: watch::Receiver<u64>,
    token: CancellationToken,
    worker: JoinHandle<()>,
}

impl<S: OrderSource> OrderSync<S> {
    /// Subscribe to the server configured in `config`
    pub fn connect(cache: Arc<OrderCache<S>>, config: &ClientConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = PushSubscriber::connect(config, notifier(tx));
        Self::with_subscription(cache, subscription, rx)
    }

    pub fn spawn<C: PushConnector>(
        cache: Arc<OrderCache<S>>,
        connector: C,
        policy: ReconnectPolicy,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = PushSubscriber::spawn(connector, policy, notifier(tx));
        Self::with_subscription(cache, subscription, rx)
    }

    fn with_subscription(
        cache: Arc<OrderCache<S>>,
        subscription: SubscriptionHandle,
        rx: mpsc::UnboundedReceiver<SubscriberEvent>,
    ) -> Self {
        let (refresh_tx, refreshes) = watch::channel(0);
        let token = CancellationToken::new();
        let worker = tokio::spawn(refresh_loop(cache.clone(), rx, refresh_tx, token.clone()));
        Self {
            cache,
            subscription,
            refreshes,
            token,
            worker,
        }
    }

    pub fn cache(&self) -> &Arc<OrderCache<S>> {
        &self.cache
    }

    pub fn subscription(&self) -> &SubscriptionHandle {
        &self.subscription
    }

    /// Counts completed refetches
    pub fn refreshes(&self) -> watch::Receiver<u64> {
        self.refreshes.clone()
    }

    pub async fn shutdown(self) {
        self.subscription.shutdown().await;
        self.token.cancel();
        if let Err(e) = self.worker.await {
            tracing::warn!("Order sync worker failed: {e}");
        }
    }
}

fn notifier(tx: mpsc::UnboundedSender<SubscriberEvent>) -> impl Fn(SubscriberEvent) + Send + Sync + 'static {
    move |event| {
        let _ = tx.send(event);
    }
}

async fn refresh_loop<S: OrderSource>(
    cache: Arc<OrderCache<S>>,
    mut rx: mpsc::UnboundedReceiver<SubscriberEvent>,
    refreshes: watch::Sender<u64>,
    token: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = token.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match &event {
            SubscriberEvent::Connected => tracing::debug!("Push connected, refetching orders"),
            SubscriberEvent::Push(push) => tracing::debug!(
                event = %push.event_type(),
                order_id = %push.order_id(),
                "Push event, refetching orders"
            ),
        }
        // Coalesce a burst into one refetch
        while rx.try_recv().is_ok() {}

        match cache.refresh().await {
            Ok(orders) => tracing::debug!(count = orders.len(), "Order cache refreshed"),
            // Cache stays empty, the next read retries
            Err(e) => tracing::warn!("Order refetch failed: {e}"),
        }
        refreshes.send_modify(|n| *n += 1);
    }
}
