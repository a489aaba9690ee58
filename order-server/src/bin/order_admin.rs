//! Order admin CLI: backups, restore and exports against the local database.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use order_server::backup;
use order_server::db::DbService;
use order_server::export::{self, ExportFormat, ExportPeriod, SqlDialect};
use order_server::setup_environment;

/// Grace period before a destructive restore on an interactive terminal
const RESTORE_WARNING_DELAY: Duration = Duration::from_secs(5);

/// Order server administration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a JSON backup of every order and prune old ones
    Backup,
    /// Replace every order with the contents of a backup
    Restore {
        /// Backup file (defaults to the newest one)
        file: Option<PathBuf>,
        /// Skip the confirmation delay
        #[arg(long)]
        yes: bool,
    },
    /// List available backups, newest first
    ListBackups,
    /// Export orders to CSV, JSON or SQL
    Export {
        #[arg(long, value_enum)]
        format: ExportFormat,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long, value_enum, default_value_t = SqlDialect::Sqlite)]
        dialect: SqlDialect,
        /// Output file (defaults to the generated file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, _log_guard) = setup_environment()?;

    let db = DbService::new(&config.database_path())
        .await
        .context("failed to open database")?;
    let pool = db.pool;
    let backup_dir = config.backup_path();

    match cli.command {
        Commands::Backup => {
            let outcome =
                backup::create_backup(&pool, &backup_dir, config.backup_retention).await?;
            println!(
                "Backup written: {} ({} orders)",
                outcome.path.display(),
                outcome.orders
            );
        }
        Commands::Restore { file, yes } => {
            let path = match file {
                Some(path) => path,
                None => backup::latest_backup(&backup_dir).await?,
            };
            let document = backup::read_backup(&path).await?;

            if !yes && std::io::stdin().is_terminal() {
                println!(
                    "WARNING: every order will be replaced by {} orders from {} ({}).",
                    document.orders.len(),
                    path.display(),
                    document.timestamp
                );
                println!(
                    "Press Ctrl+C within {} seconds to abort...",
                    RESTORE_WARNING_DELAY.as_secs()
                );
                tokio::time::sleep(RESTORE_WARNING_DELAY).await;
            }

            let restored = backup::restore_backup(&pool, &path).await?;
            println!("Restored {restored} orders from {}", path.display());
        }
        Commands::ListBackups => {
            let backups = backup::list_backups(&backup_dir).await?;
            if backups.is_empty() {
                println!("No backups in {}", backup_dir.display());
            }
            for path in backups {
                let size = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
                println!("{}\t{} bytes", path.display(), size);
            }
        }
        Commands::Export {
            format,
            year,
            month,
            dialect,
            output,
        } => {
            let period = ExportPeriod { year, month };
            let artifact = export::export(&pool, format, period, dialect).await?;
            let output = output.unwrap_or_else(|| match format {
                ExportFormat::Sql => backup_dir.join(&artifact.file_name),
                _ => PathBuf::from(&artifact.file_name),
            });
            tokio::fs::write(&output, artifact.body.as_bytes())
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Exported {} orders to {}", artifact.orders, output.display());
        }
    }

    Ok(())
}
