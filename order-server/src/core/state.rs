use sqlx::SqlitePool;
use std::path::PathBuf;

use crate::core::{Config, Result};
use crate::db::DbService;
use crate::push::{BroadcastReport, PushHub};
use shared::message::PushEvent;

/// 服务器状态 - 持有所有服务的共享引用
///
/// ServerState 是订单服务的核心状态容器，使用 Clone 语义共享：
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 服务器配置 |
/// | pool | SQLite 连接池 |
/// | push | 推送连接管理器 |
///
/// # 使用示例
///
/// ```ignore
/// let state = ServerState::initialize(&config).await?;
/// state.broadcast(&PushEvent::deleted(id));
/// ```
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 数据库连接池
    pub pool: SqlitePool,
    /// 推送连接管理器
    pub push: PushHub,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    pub fn new(config: Config, pool: SqlitePool, push: PushHub) -> Self {
        Self { config, pool, push }
    }

    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录结构 (uploads / backups)
    /// 2. 打开数据库并执行迁移
    /// 3. 创建推送连接管理器
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db = DbService::new(&config.database_path()).await?;

        Ok(Self::new(
            config.clone(),
            db.pool,
            PushHub::new(config.push_queue_capacity),
        ))
    }

    /// Announce a successful mutation to every push client
    pub fn broadcast(&self, event: &PushEvent) -> BroadcastReport {
        self.push.broadcast(event)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.config.uploads_path()
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.config.backup_path()
    }
}
