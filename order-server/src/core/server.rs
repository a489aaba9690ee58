//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::backup::BackupScheduler;
use crate::core::{BackgroundTasks, Config, Result, ServerError, ServerState, TaskKind};

/// 后台任务关闭等待时间
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (shared with oneshot tests)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    /// Bind `{http_host}:{http_port}` and serve until Ctrl+C
    pub async fn run(&self) -> Result<()> {
        let addr = format!("{}:{}", self.config.http_host, self.config.http_port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                return;
            }
            tracing::info!("Shutting down...");
            signal.cancel();
        });

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` is cancelled
    ///
    /// On shutdown every push session is closed with 1001 (going away),
    /// in-flight requests drain, then background tasks are stopped.
    pub async fn serve(&self, listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let mut tasks = BackgroundTasks::with_token(shutdown.child_token());
        if self.config.auto_backup {
            let scheduler = BackupScheduler::new(
                state.pool.clone(),
                state.backup_dir(),
                self.config.backup_retention,
                self.config.backup_interval(),
                tasks.shutdown_token(),
            );
            tasks.spawn("auto_backup", TaskKind::Periodic, scheduler.run());
        }

        let app = crate::api::build_app(state.clone());
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            environment = %self.config.environment,
            "Order server listening"
        );

        let hub = state.push.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                hub.close_all();
            })
            .await?;

        tasks.shutdown(SHUTDOWN_GRACE).await;
        tracing::info!("Order server stopped");
        Ok(())
    }
}
