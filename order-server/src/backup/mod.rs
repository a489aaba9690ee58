//! 备份与恢复
//!
//! 备份文件为 JSON: `{version, timestamp, orders}`，文件名
//! `backup-<时间戳>.json` 按字典序即为时间顺序。

mod scheduler;

pub use scheduler::BackupScheduler;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::db::repository::{RepoError, order};
use crate::utils::{AppError, ErrorCode};
use shared::models::Order;

pub const BACKUP_VERSION: &str = "1.0";
const PREFIX: &str = "backup-";
const EXTENSION: &str = ".json";
/// Same-millisecond collisions move the name stamp forward, at most this far
const MAX_NAME_ATTEMPTS: i64 = 16;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Backup I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid backup file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported backup version {0}")]
    UnsupportedVersion(String),

    #[error("No backup found in {0}")]
    NoBackups(PathBuf),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl BackupError {
    fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

impl From<BackupError> for AppError {
    fn from(err: BackupError) -> Self {
        match err {
            BackupError::NoBackups(_) => AppError::new(ErrorCode::BackupNotFound),
            BackupError::Io { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                AppError::new(ErrorCode::BackupNotFound)
            }
            BackupError::Repo(e) => e.into(),
            other => {
                tracing::error!(error = %other, "Backup failed");
                AppError::with_message(ErrorCode::BackupInvalid, other.to_string())
            }
        }
    }
}

/// On-disk backup document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupFile {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub path: PathBuf,
    pub orders: usize,
}

pub fn backup_file_name(at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{PREFIX}{stamp}{EXTENSION}")
}

fn is_backup_name(name: &str) -> bool {
    name.starts_with(PREFIX) && name.ends_with(EXTENSION)
}

/// Dump every order to a new backup file, then prune to `keep`
pub async fn create_backup(
    pool: &SqlitePool,
    dir: &Path,
    keep: usize,
) -> Result<BackupOutcome, BackupError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(BackupError::io(dir))?;

    let orders = order::find_all(pool).await?;
    let now = Utc::now();
    let document = BackupFile {
        version: BACKUP_VERSION.to_string(),
        timestamp: now,
        orders,
    };
    let body = serde_json::to_vec_pretty(&document).map_err(|source| BackupError::Json {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = write_new_backup(dir, now, &body).await?;

    tracing::info!(path = %path.display(), orders = document.orders.len(), "Backup created");

    let removed = prune_backups(dir, keep).await?;
    if removed > 0 {
        tracing::info!(removed, keep, "Old backups pruned");
    }

    Ok(BackupOutcome {
        path,
        orders: document.orders.len(),
    })
}

/// Write `body` under a backup name no other file uses yet
///
/// Existing backups are never overwritten. A partially written file is removed.
async fn write_new_backup(dir: &Path, at: DateTime<Utc>, body: &[u8]) -> Result<PathBuf, BackupError> {
    for offset in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(backup_file_name(at + TimeDelta::milliseconds(offset)));
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(BackupError::Io { path, source }),
        };

        let written = async {
            file.write_all(body).await?;
            file.sync_all().await
        }
        .await;
        if let Err(source) = written {
            drop(file);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), "Failed to remove partial backup: {e}");
            }
            return Err(BackupError::Io { path, source });
        }
        return Ok(path);
    }

    Err(BackupError::Io {
        path: dir.join(backup_file_name(at)),
        source: std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "no free backup file name",
        ),
    })
}

/// Backup files in `dir`, newest first
pub async fn list_backups(dir: &Path) -> Result<Vec<PathBuf>, BackupError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BackupError::io(dir)(e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(BackupError::io(dir))?
    {
        if let Some(name) = entry.file_name().to_str()
            && is_backup_name(name)
        {
            names.push(name.to_string());
        }
    }
    names.sort_unstable_by(|a, b| b.cmp(a));
    Ok(names.into_iter().map(|name| dir.join(name)).collect())
}

/// Delete all but the `keep` newest backups. Returns how many were removed.
pub async fn prune_backups(dir: &Path, keep: usize) -> Result<usize, BackupError> {
    let backups = list_backups(dir).await?;
    let mut removed = 0;
    for path in backups.iter().skip(keep) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove old backup"),
        }
    }
    Ok(removed)
}

pub async fn latest_backup(dir: &Path) -> Result<PathBuf, BackupError> {
    list_backups(dir)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BackupError::NoBackups(dir.to_path_buf()))
}

pub async fn read_backup(path: &Path) -> Result<BackupFile, BackupError> {
    let bytes = tokio::fs::read(path).await.map_err(BackupError::io(path))?;
    let document: BackupFile =
        serde_json::from_slice(&bytes).map_err(|source| BackupError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    if document.version != BACKUP_VERSION {
        return Err(BackupError::UnsupportedVersion(document.version));
    }
    Ok(document)
}

/// Replace every stored order with the contents of `path`.
///
/// Runs in one transaction; returns the restored count.
pub async fn restore_backup(pool: &SqlitePool, path: &Path) -> Result<usize, BackupError> {
    let document = read_backup(path).await?;
    let restored = order::replace_all(pool, &document.orders).await?;
    tracing::warn!(
        path = %path.display(),
        backup_time = %document.timestamp,
        restored,
        "Orders restored from backup"
    );
    Ok(restored)
}
