//! Reconnecting push subscriber

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::transport::{Frame, PushConnection, PushConnector, WsConnector};
use super::{DELIBERATE_CLOSE_CODE, ReconnectPolicy};
use crate::ClientConfig;
use shared::message::PushEvent;

/// Connection state, observable through [`SubscriptionHandle::state`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// What the handler is told about
#[derive(Debug, Clone)]
pub enum SubscriberEvent {
    /// A connection was (re)established; state may have been missed
    Connected,
    Push(PushEvent),
}

type Handler = Arc<dyn Fn(SubscriberEvent) + Send + Sync>;

/// Handler slot read at every dispatch, so replacing it takes effect at once
#[derive(Clone)]
struct HandlerCell(Arc<RwLock<Handler>>);

impl HandlerCell {
    fn new(handler: Handler) -> Self {
        Self(Arc::new(RwLock::new(handler)))
    }

    fn set(&self, handler: Handler) {
        *self.0.write() = handler;
    }

    fn dispatch(&self, event: SubscriberEvent) {
        // Clone out so the handler runs without the lock held
        let handler = self.0.read().clone();
        handler(event);
    }
}

/// How a session ended
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// Torn down locally with the deliberate close code
    Deliberate,
    /// Peer closed or the transport failed
    Lost,
}

/// Spawns the subscription loop
pub struct PushSubscriber;

impl PushSubscriber {
    /// Subscribe to `{base_url}/ws` using the config's reconnect policy
    pub fn connect<F>(config: &ClientConfig, handler: F) -> SubscriptionHandle
    where
        F: Fn(SubscriberEvent) + Send + Sync + 'static,
    {
        let connector =
            WsConnector::new(config.ws_url()).with_connect_timeout(config.connect_timeout);
        Self::spawn(connector, config.reconnect_policy.clone(), handler)
    }

    /// Start the loop on the current runtime with any connector
    pub fn spawn<C, F>(connector: C, policy: ReconnectPolicy, handler: F) -> SubscriptionHandle
    where
        C: PushConnector,
        F: Fn(SubscriberEvent) + Send + Sync + 'static,
    {
        let handler = HandlerCell::new(Arc::new(handler));
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let token = CancellationToken::new();

        let task = tokio::spawn(run_loop(
            connector,
            policy,
            handler.clone(),
            state_tx,
            token.clone(),
        ));

        SubscriptionHandle {
            token,
            state: state_rx,
            handler,
            task: Some(task),
        }
    }
}

/// Owner of a running subscription
///
/// Dropping the handle cancels the loop without waiting for it.
pub struct SubscriptionHandle {
    token: CancellationToken,
    state: watch::Receiver<ConnectionState>,
    handler: HandlerCell,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    /// Replace the handler; the next dispatched event uses it
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(SubscriberEvent) + Send + Sync + 'static,
    {
        self.handler.set(Arc::new(handler));
    }

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn current_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Cancel any pending reconnect, close with 1000 and wait for the loop
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!("Push subscriber task failed: {e}");
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_loop<C: PushConnector>(
    connector: C,
    policy: ReconnectPolicy,
    handler: HandlerCell,
    state: watch::Sender<ConnectionState>,
    token: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        if token.is_cancelled() {
            break;
        }

        state.send_replace(ConnectionState::Connecting);
        let connected = tokio::select! {
            _ = token.cancelled() => break,
            result = connector.connect() => result,
        };

        let end = match connected {
            Ok(mut conn) => {
                attempt = 0;
                state.send_replace(ConnectionState::Connected);
                tracing::info!("Push channel connected");
                handler.dispatch(SubscriberEvent::Connected);
                run_session(conn.as_mut(), &handler, &token).await
            }
            Err(e) => {
                tracing::warn!("Push channel connect failed: {e}");
                SessionEnd::Lost
            }
        };
        state.send_replace(ConnectionState::Disconnected);

        if end == SessionEnd::Deliberate {
            break;
        }

        attempt = attempt.saturating_add(1);
        let Some(delay) = policy.delay_for(attempt) else {
            tracing::warn!(attempt, "Push channel reconnect attempts exhausted");
            break;
        };
        tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "Scheduling push reconnect");

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    state.send_replace(ConnectionState::Disconnected);
    tracing::debug!("Push subscriber stopped");
}

async fn run_session(
    conn: &mut dyn PushConnection,
    handler: &HandlerCell,
    token: &CancellationToken,
) -> SessionEnd {
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                if let Err(e) = conn.close(DELIBERATE_CLOSE_CODE).await {
                    tracing::debug!("Push channel close failed: {e}");
                }
                return SessionEnd::Deliberate;
            }
            frame = conn.recv() => match frame {
                Some(Ok(Frame::Text(text))) => match PushEvent::from_json(&text) {
                    Ok(event) => handler.dispatch(SubscriberEvent::Push(event)),
                    Err(e) => tracing::warn!(len = text.len(), "Dropping malformed push frame: {e}"),
                },
                Some(Ok(Frame::Close(code))) => {
                    tracing::info!(?code, "Push channel closed by server");
                    return SessionEnd::Lost;
                }
                Some(Err(e)) => {
                    tracing::warn!("Push channel error: {e}");
                    return SessionEnd::Lost;
                }
                None => {
                    tracing::info!("Push channel ended");
                    return SessionEnd::Lost;
                }
            },
        }
    }
}
