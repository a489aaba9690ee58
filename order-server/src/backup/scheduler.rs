//! 定时备份调度器
//!
//! 启动时立即备份一次，之后按 `backup_interval` 周期执行，直到关闭。

use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// 注册为 `TaskKind::Periodic`
pub struct BackupScheduler {
    pool: SqlitePool,
    dir: PathBuf,
    keep: usize,
    interval: Duration,
    shutdown: CancellationToken,
}

impl BackupScheduler {
    pub fn new(
        pool: SqlitePool,
        dir: PathBuf,
        keep: usize,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            dir,
            keep,
            interval,
            shutdown,
        }
    }

    /// 主循环
    pub async fn run(self) {
        tracing::info!(
            dir = %self.dir.display(),
            interval_secs = self.interval.as_secs(),
            keep = self.keep,
            "Backup scheduler started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => self.run_once().await,
            }
        }

        tracing::info!("Backup scheduler stopped");
    }

    async fn run_once(&self) {
        // 失败只记录日志，下个周期继续
        if let Err(e) = super::create_backup(&self.pool, &self.dir, self.keep).await {
            tracing::error!(error = %e, "Scheduled backup failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn backs_up_on_start_and_stops_on_cancel() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();

        let scheduler = BackupScheduler::new(
            pool,
            dir.path().to_path_buf(),
            30,
            Duration::from_secs(3600),
            token.clone(),
        );
        let handle = tokio::spawn(scheduler.run());

        let mut backups = Vec::new();
        for _ in 0..100 {
            backups = crate::backup::list_backups(dir.path()).await.unwrap();
            if !backups.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(backups.len(), 1);

        token.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
