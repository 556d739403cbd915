// ==========================================
// 业务记录迁移系统 - CLI 主入口
// ==========================================
// 子命令:
// - load: 装载 CSV 到目标实例(自动重写引用 Id)
// - dump: 从源实例导出传递闭包 CSV
// ==========================================

use anyhow::Context;
use clap::{Parser, Subcommand};
use record_migrate::api::MigrationApi;
use record_migrate::client::SqliteServiceClient;
use record_migrate::config::{DumpTask, LoadTask};
use record_migrate::domain::CsvInput;
use record_migrate::engine::{ProgressEvent, ProgressPublisher};
use record_migrate::logging;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

// ==========================================
// 命令行定义
// ==========================================

#[derive(Parser)]
#[command(name = "record-migrate", version, about = "业务记录迁移系统")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 装载 CSV 数据到目标实例
    Load {
        /// 目标实例(本地 SQLite 文件)
        #[arg(long)]
        instance: PathBuf,
        /// 装载任务档案(JSON)
        #[arg(long)]
        task: PathBuf,
        /// 运行结束后把最终 IdMap 写入此文件(往返导出用)
        #[arg(long)]
        id_map_out: Option<PathBuf>,
    },
    /// 从源实例导出传递闭包 CSV
    Dump {
        /// 源实例(本地 SQLite 文件)
        #[arg(long)]
        instance: PathBuf,
        /// 导出任务档案(JSON)
        #[arg(long)]
        task: PathBuf,
        /// 输出目录
        #[arg(long, default_value = "dump-out")]
        out: PathBuf,
    },
}

// ==========================================
// 进度发布: 打到日志
// ==========================================

struct LogProgressPublisher;

impl ProgressPublisher for LogProgressPublisher {
    fn publish(&self, event: ProgressEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        match event {
            ProgressEvent::Load(p) => info!(
                total = p.total_count,
                success = p.success_count,
                failure = p.failure_count,
                "装载进度"
            ),
            ProgressEvent::Dump(p) => info!(
                fetched = p.fetched_count,
                per_object = ?p.fetched_count_per_object,
                "导出进度"
            ),
        }
        Ok(())
    }
}

// ==========================================
// 主流程
// ==========================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    info!("==================================================");
    info!("{} v{}", record_migrate::APP_NAME, record_migrate::VERSION);
    info!("==================================================");

    let cli = Cli::parse();
    match cli.command {
        Command::Load {
            instance,
            task,
            id_map_out,
        } => run_load(instance, task, id_map_out).await,
        Command::Dump {
            instance,
            task,
            out,
        } => run_dump(instance, task, out).await,
    }
}

async fn run_load(
    instance: PathBuf,
    task_path: PathBuf,
    id_map_out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let task = LoadTask::from_path(&task_path)
        .map_err(|e| anyhow::anyhow!("读取装载任务失败: {}", e))?;

    // 读入逐对象 CSV
    let mut inputs = Vec::with_capacity(task.inputs.len());
    for input in &task.inputs {
        let csv = fs::read_to_string(&input.path)
            .with_context(|| format!("读取 CSV 失败: {}", input.path.display()))?;
        inputs.push(CsvInput::new(input.object.clone(), csv));
    }

    let client = Arc::new(
        SqliteServiceClient::open(
            instance
                .to_str()
                .context("实例路径不是合法 UTF-8")?,
        )
        .map_err(|e| anyhow::anyhow!("打开目标实例失败: {}", e))?,
    );
    let api = MigrationApi::new(client.clone(), client)
        .with_publisher(Arc::new(LogProgressPublisher));

    let report = api
        .load_csv_data_report(&inputs, &task.mappings, &task.options)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let status = &report.status;
    info!(
        total = status.total_count,
        success = status.success_count(),
        failure = status.failure_count(),
        blocked = status.blocked.len(),
        already_mapped = status.already_mapped.len(),
        id_map_size = status.id_map.len(),
        elapsed_ms = report.elapsed_ms,
        "装载完成"
    );
    for blocked in &status.blocked {
        info!(
            object = %blocked.object,
            orig_id = %blocked.orig_id,
            blocking_field = blocked.blocking_field.as_deref().unwrap_or("-"),
            blocking_id = blocked.blocking_id.as_deref().unwrap_or("-"),
            "阻塞记录"
        );
    }

    if let Some(path) = id_map_out {
        fs::write(&path, serde_json::to_string_pretty(&status.id_map)?)
            .with_context(|| format!("写出 IdMap 失败: {}", path.display()))?;
        info!(path = %path.display(), "IdMap 已写出");
    }
    Ok(())
}

async fn run_dump(instance: PathBuf, task_path: PathBuf, out: PathBuf) -> anyhow::Result<()> {
    let task = DumpTask::from_path(&task_path)
        .map_err(|e| anyhow::anyhow!("读取导出任务失败: {}", e))?;

    let client = Arc::new(
        SqliteServiceClient::open(
            instance
                .to_str()
                .context("实例路径不是合法 UTF-8")?,
        )
        .map_err(|e| anyhow::anyhow!("打开源实例失败: {}", e))?,
    );
    let api = MigrationApi::new(client.clone(), client)
        .with_publisher(Arc::new(LogProgressPublisher));

    let outputs = api
        .dump_as_csv(&task.queries, &task.options)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    fs::create_dir_all(&out)?;
    for (index, (query, csv)) in task.queries.iter().zip(&outputs).enumerate() {
        let path = out.join(format!("{:02}_{}.csv", index + 1, query.object));
        fs::write(&path, csv)
            .with_context(|| format!("写出 CSV 失败: {}", path.display()))?;
        info!(path = %path.display(), bytes = csv.len(), "导出文件已写出");
    }
    info!(query_count = task.queries.len(), "导出完成");
    Ok(())
}
