//! Order Server - 订单跟踪服务
//!
//! # 架构概述
//!
//! - **HTTP API** (`api`): 订单增删改查、图片上传、导出
//! - **推送通道** (`push`): `/ws` WebSocket 广播 `{type, data}`
//! - **数据库** (`db`): SQLite (sqlx) 存储与迁移
//! - **备份** (`backup`): JSON 备份、恢复、定时备份
//! - **导出** (`export`): CSV / JSON / SQL
//!
//! # 模块结构
//!
//! ```text
//! order-server/src/
//! ├── core/          # 配置、状态、错误、服务器、后台任务
//! ├── api/           # HTTP 路由和处理器
//! ├── push/          # 推送连接管理与会话
//! ├── db/            # 连接池与仓储
//! ├── export/        # 导出格式
//! ├── backup/        # 备份与恢复
//! └── utils/         # 日志、校验
//! ```

pub mod api;
pub mod backup;
pub mod core;
pub mod db;
pub mod export;
pub mod push;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerError, ServerState};
pub use push::{BroadcastReport, PushHub};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::init_logger;

use tracing_appender::non_blocking::WorkerGuard;

/// 设置运行环境: `.env`、配置、工作目录、日志
///
/// The returned guard keeps the file logger alive; hold it until exit.
pub fn setup_environment() -> anyhow::Result<(Config, Option<WorkerGuard>)> {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let log_dir = config.log_file.then(|| config.logs_path());
    let guard = init_logger(&config.log_level, config.log_json, log_dir.as_deref())?;

    Ok((config, guard))
}

pub fn print_banner() {
    println!(
        r#"
  ___         _
 / _ \ _ _ __| |___ _ _ ___
| (_) | '_/ _` / -_) '_(_-<
 \___/|_| \__,_\___|_| /__/
    "#
    );
}
