use std::path::PathBuf;
use std::time::Duration;

/// 服务器配置 - 订单服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 |
/// | HTTP_HOST | 0.0.0.0 | 监听地址 |
/// | HTTP_PORT | 5000 | HTTP 服务端口 |
/// | DATABASE_FILE | {WORK_DIR}/orders.db | SQLite 数据库文件 |
/// | UPLOADS_DIR | {WORK_DIR}/uploads | 上传图片目录 |
/// | BACKUP_DIR | {WORK_DIR}/backups | 备份目录 |
/// | BACKUP_RETENTION | 30 | 保留的备份数量 |
/// | AUTO_BACKUP | true | 是否启用定时备份 |
/// | BACKUP_INTERVAL_HOURS | 24 | 定时备份间隔(小时) |
/// | WS_PING_INTERVAL_SECS | 30 | 推送连接 Ping 间隔(秒) |
/// | PUSH_QUEUE_CAPACITY | 64 | 每个推送连接的发送队列长度 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志输出 |
/// | LOG_FILE | false | 写入 {WORK_DIR}/logs |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/srv/orders HTTP_PORT=8080 cargo run --bin order-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、上传文件、备份、日志
    pub work_dir: String,
    pub http_host: String,
    pub http_port: u16,
    pub database_file: Option<String>,
    pub uploads_dir: Option<String>,
    pub backup_dir: Option<String>,
    pub backup_retention: usize,
    pub auto_backup: bool,
    pub backup_interval_hours: u64,
    pub ws_ping_interval_secs: u64,
    pub push_queue_capacity: usize,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_file: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_host: std::env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            http_port: env_or("HTTP_PORT", 5000),
            database_file: std::env::var("DATABASE_FILE").ok(),
            uploads_dir: std::env::var("UPLOADS_DIR").ok(),
            backup_dir: std::env::var("BACKUP_DIR").ok(),
            backup_retention: env_or("BACKUP_RETENTION", 30),
            auto_backup: env_or("AUTO_BACKUP", true),
            backup_interval_hours: env_or("BACKUP_INTERVAL_HOURS", 24),
            ws_ping_interval_secs: env_or("WS_PING_INTERVAL_SECS", 30),
            push_queue_capacity: env_or("PUSH_QUEUE_CAPACITY", 64),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            log_file: env_or("LOG_FILE", false),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Self-contained config rooted at `work_dir`, ignoring the environment.
    ///
    /// Background backups are off.
    pub fn for_work_dir(work_dir: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            http_host: "127.0.0.1".into(),
            http_port: 0,
            database_file: None,
            uploads_dir: None,
            backup_dir: None,
            backup_retention: 30,
            auto_backup: false,
            backup_interval_hours: 24,
            ws_ping_interval_secs: 30,
            push_queue_capacity: 64,
            environment: "test".into(),
            log_level: "info".into(),
            log_json: false,
            log_file: false,
        }
    }

    pub fn work_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_file
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.work_dir_path().join("orders.db"))
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.uploads_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.work_dir_path().join("uploads"))
    }

    pub fn backup_path(&self) -> PathBuf {
        self.backup_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.work_dir_path().join("backups"))
    }

    pub fn logs_path(&self) -> PathBuf {
        self.work_dir_path().join("logs")
    }

    pub fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval_hours.max(1) * 3600)
    }

    pub fn ws_ping_interval(&self) -> Duration {
        Duration::from_secs(self.ws_ping_interval_secs.max(1))
    }

    /// 创建工作目录结构
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.work_dir_path())?;
        std::fs::create_dir_all(self.uploads_path())?;
        std::fs::create_dir_all(self.backup_path())?;
        if let Some(parent) = self.database_path().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
