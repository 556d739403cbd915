// ==========================================
// 业务记录迁移系统 - 本地演示实例种子工具
// ==========================================
// 用途: 创建一个带标准对象与演示数据的本地实例,
//       供 load/dump 子命令演练
// ==========================================

use clap::Parser;
use record_migrate::client::SqliteServiceClient;
use record_migrate::domain::{FieldDescription, FieldType, FieldValue, ObjectDescription, Record};
use record_migrate::logging;
use tracing::info;

#[derive(Parser)]
#[command(name = "seed-local-service", about = "创建本地演示服务实例")]
struct Cli {
    /// 实例文件路径
    #[arg(long, default_value = "demo-instance.db")]
    path: String,

    /// 只建结构,不写入演示记录
    #[arg(long)]
    schema_only: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let cli = Cli::parse();

    let client = SqliteServiceClient::open(&cli.path)?;

    // ===== 标准对象结构 =====
    client.register_object(&ObjectDescription::new(
        "User",
        vec![
            FieldDescription::new("Id", FieldType::Id),
            FieldDescription::new("Name", FieldType::Text),
            FieldDescription::new("Email", FieldType::Text),
        ],
    ))?;
    client.register_object(&ObjectDescription::new(
        "Account",
        vec![
            FieldDescription::new("Id", FieldType::Id),
            FieldDescription::new("Name", FieldType::Text),
            FieldDescription::new("Website", FieldType::Text),
            FieldDescription::new("NumberOfEmployees", FieldType::Int),
            FieldDescription::new("AnnualRevenue", FieldType::Currency),
            FieldDescription::reference("OwnerId", vec!["User".to_string()]),
        ],
    ))?;
    client.register_object(&ObjectDescription::new(
        "Contact",
        vec![
            FieldDescription::new("Id", FieldType::Id),
            FieldDescription::new("FirstName", FieldType::Text),
            FieldDescription::new("LastName", FieldType::Text),
            FieldDescription::new("Birthdate", FieldType::Date),
            FieldDescription::reference("AccountId", vec!["Account".to_string()]),
            FieldDescription::reference("OwnerId", vec!["User".to_string()]),
        ],
    ))?;
    info!(path = %cli.path, "对象结构注册完成: User / Account / Contact");

    if !cli.schema_only {
        insert(&client, "User", &[("Id", "USR-0001"), ("Name", "集成用户"), ("Email", "ops@example.com")])?;
        insert(
            &client,
            "Account",
            &[
                ("Id", "ACC-0001"),
                ("Name", "Existing Account"),
                ("Website", "https://example.com"),
                ("OwnerId", "USR-0001"),
            ],
        )?;
        insert(
            &client,
            "Contact",
            &[
                ("Id", "CON-0001"),
                ("FirstName", "三"),
                ("LastName", "张"),
                ("AccountId", "ACC-0001"),
                ("OwnerId", "USR-0001"),
            ],
        )?;
        info!("演示记录写入完成");
    }

    info!(path = %cli.path, "本地演示实例就绪");
    Ok(())
}

fn insert(
    client: &SqliteServiceClient,
    object: &str,
    pairs: &[(&str, &str)],
) -> Result<(), Box<dyn std::error::Error>> {
    let record: Record = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), FieldValue::Text(v.to_string())))
        .collect();
    client.insert_raw(object, &record)?;
    Ok(())
}
