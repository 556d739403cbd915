// ==========================================
// 业务记录迁移系统 - 装载引擎集成测试
// ==========================================
// 覆盖: 空输入 / 依赖缺失阻塞 / 父记录失败阻塞 /
//       种子 IdMap / 多轮装载 / 分区不变式 / 重跑幂等 / 取消
// ==========================================


use record_migrate::api::{ApiError, MigrationApi};
use record_migrate::client::SqliteServiceClient;
use record_migrate::DataClient;
use record_migrate::domain::{CsvInput, FieldValue, IdMap, UploadStatus};
use record_migrate::config::UploadOptions;
use record_migrate::engine::MigrationError;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn api(client: Arc<SqliteServiceClient>) -> MigrationApi<SqliteServiceClient, SqliteServiceClient> {
    MigrationApi::new(client.clone(), client)
}

/// 分区不变式: 每行恰好落入四类之一
fn assert_partition(status: &UploadStatus) {
    let partitioned = status.successes.len()
        + status.failures.len()
        + status.blocked.len()
        + status.already_mapped.len();
    assert_eq!(partitioned, status.total_count, "分区不变式被破坏");
}

// ==========================================
// 场景: 空输入
// ==========================================
#[tokio::test]
async fn test_empty_input() {
    let client = test_helpers::create_service_instance();
    let status = api(client)
        .load_csv_data(&[], &[], &UploadOptions::default())
        .await
        .expect("装载失败");

    assert_eq!(status.total_count, 0);
    assert!(status.successes.is_empty());
    assert!(status.failures.is_empty());
    assert!(status.blocked.is_empty());
    assert_eq!(status.id_map.len(), 0);
}

// ==========================================
// 场景: 依赖缺失 → 阻塞
// ==========================================
#[tokio::test]
async fn test_blocked_by_missing_dependency() {
    let client = test_helpers::create_service_instance();
    test_helpers::register_standard_schema(&client);

    let inputs = vec![
        CsvInput::new(
            "Account",
            "Id,Name,OwnerId\nA1,Account 01,U1\n",
        ),
        // User 数据集为空: U1 永远无法解析
        CsvInput::new("User", "Id,Name,Email\n"),
    ];

    let status = api(client)
        .load_csv_data(&inputs, &[], &UploadOptions::default())
        .await
        .expect("装载失败");

    assert_eq!(status.total_count, 1);
    assert!(status.successes.is_empty());
    assert!(status.failures.is_empty());
    assert_eq!(status.blocked.len(), 1);
    let blocked = &status.blocked[0];
    assert_eq!(blocked.object, "Account");
    assert_eq!(blocked.orig_id, "A1");
    assert_eq!(blocked.blocking_field.as_deref(), Some("OwnerId"));
    assert_eq!(blocked.blocking_id.as_deref(), Some("U1"));
    assert_partition(&status);

    // 不动点不变式: 阻塞行的阻塞 Id 不在最终 IdMap 中
    assert!(!status.id_map.contains("U1"));
}

// ==========================================
// 场景: 父记录创建失败 → 子记录阻塞
// ==========================================
#[tokio::test]
async fn test_blocked_by_failed_parent() {
    // 预建带 CHECK 约束的 Account 表,令空 Name 创建失败
    let (_guard, path) = test_helpers::create_file_instance().expect("创建实例文件失败");
    {
        let conn = rusqlite::Connection::open(&path).expect("打开连接失败");
        conn.execute_batch(
            r#"
            CREATE TABLE "Account" (
                "Id" TEXT PRIMARY KEY,
                "Name" TEXT CHECK("Name" <> ''),
                "Website" TEXT,
                "NumberOfEmployees" INTEGER,
                "OwnerId" TEXT,
                "CreatedDate" TEXT
            );
            "#,
        )
        .expect("预建表失败");
    }
    let client = Arc::new(SqliteServiceClient::open(&path).expect("打开实例失败"));
    test_helpers::register_standard_schema(&client);

    let inputs = vec![
        // Name 为空 → CHECK 约束拒绝
        CsvInput::new("Account", "Id,Name,OwnerId\nA1,,U1\n"),
        CsvInput::new("Contact", "Id,LastName,AccountId\nC1,赵,A1\n"),
        CsvInput::new("User", "Id,Name\nU1,用户一\n"),
    ];

    let status = api(client)
        .load_csv_data(&inputs, &[], &UploadOptions::default())
        .await
        .expect("装载失败");

    assert_eq!(status.total_count, 3);
    // User 成功;Account 单条失败;Contact 因父失败而阻塞
    assert_eq!(status.successes.len(), 1);
    assert_eq!(status.failures.len(), 1);
    assert_eq!(status.failures[0].object, "Account");
    assert_eq!(status.failures[0].orig_id, "A1");
    assert!(!status.failures[0].errors.is_empty());

    assert_eq!(status.blocked.len(), 1);
    let blocked = &status.blocked[0];
    assert_eq!(blocked.object, "Contact");
    assert_eq!(blocked.orig_id, "C1");
    assert_eq!(blocked.blocking_field.as_deref(), Some("AccountId"));
    assert_eq!(blocked.blocking_id.as_deref(), Some("A1"));
    assert_partition(&status);
}

// ==========================================
// 场景: 种子 IdMap 透传
// ==========================================
#[tokio::test]
async fn test_seeded_id_map_passthrough() {
    let client = test_helpers::create_service_instance();
    test_helpers::register_standard_schema(&client);
    test_helpers::insert(&client, "User", &[("Id", "USR-0001"), ("Name", "既有用户")]);

    let inputs = vec![CsvInput::new(
        "Account",
        "Id,Name,OwnerId\nA1,Account 01,U1\n",
    )];
    let mut options = UploadOptions::default();
    options.id_map = Some(IdMap::from_pairs([("U1", "USR-0001")]));

    let status = api(client.clone())
        .load_csv_data(&inputs, &[], &options)
        .await
        .expect("装载失败");

    assert_eq!(status.successes.len(), 1);
    assert!(status.blocked.is_empty());
    // 种子 + 新建 Account
    assert_eq!(status.id_map.len(), 2);
    assert_eq!(status.id_map.get("U1"), Some("USR-0001"));

    // 引用有效性: 写入的 OwnerId 是映射后的目标 Id
    let rows = client
        .query("SELECT \"OwnerId\" FROM \"Account\"", 10_000)
        .await
        .expect("查询失败");
    assert_eq!(
        rows[0].get("OwnerId"),
        Some(&FieldValue::Text("USR-0001".to_string()))
    );
}

// ==========================================
// 场景: 多轮装载(引用链 User ← Account ← Contact)
// ==========================================
#[tokio::test]
async fn test_multi_pass_graph_load() {
    let client = test_helpers::create_service_instance();
    test_helpers::register_standard_schema(&client);

    let inputs = vec![
        // 逆依赖顺序输入,验证不动点调度
        CsvInput::new("Contact", include_str!("fixtures/contact.csv")),
        CsvInput::new("Account", include_str!("fixtures/account.csv")),
        CsvInput::new("User", include_str!("fixtures/user.csv")),
    ];

    let status = api(client.clone())
        .load_csv_data(&inputs, &[], &UploadOptions::default())
        .await
        .expect("装载失败");

    assert_eq!(status.total_count, 6);
    assert_eq!(status.successes.len(), 6);
    assert!(status.failures.is_empty());
    assert!(status.blocked.is_empty());
    assert_eq!(status.id_map.len(), 6);
    assert_partition(&status);

    // 引用有效性: 目标实例中 Contact.AccountId 指向已创建的 Account
    let accounts = client
        .query("SELECT \"Id\" FROM \"Account\"", 10_000)
        .await
        .expect("查询失败");
    let contact_refs = client
        .query("SELECT \"AccountId\" FROM \"Contact\"", 10_000)
        .await
        .expect("查询失败");
    for row in &contact_refs {
        let target = row.get("AccountId").and_then(|v| v.as_id()).expect("引用为空");
        assert!(
            accounts
                .iter()
                .any(|a| a.get("Id").and_then(|v| v.as_id()) == Some(target)),
            "引用指向不存在的 Account: {}",
            target
        );
    }
}

// ==========================================
// 法则: 重跑幂等
// ==========================================
#[tokio::test]
async fn test_rerun_idempotence() {
    let client = test_helpers::create_service_instance();
    test_helpers::register_standard_schema(&client);

    let inputs = vec![
        CsvInput::new("User", include_str!("fixtures/user.csv")),
        CsvInput::new("Account", include_str!("fixtures/account.csv")),
    ];

    let first = api(client.clone())
        .load_csv_data(&inputs, &[], &UploadOptions::default())
        .await
        .expect("首次装载失败");
    assert_eq!(first.successes.len(), 4);

    // 以首次输出为种子重跑
    let mut options = UploadOptions::default();
    options.id_map = Some(first.id_map.clone());
    let second = api(client)
        .load_csv_data(&inputs, &[], &options)
        .await
        .expect("重跑失败");

    assert!(second.successes.is_empty());
    assert!(second.failures.is_empty());
    assert!(second.blocked.is_empty());
    assert_eq!(second.already_mapped.len(), 4);
    assert_eq!(second.id_map.len(), first.id_map.len());
    for (source, target) in first.id_map.iter() {
        assert_eq!(second.id_map.get(source), Some(target));
    }
}

// ==========================================
// 场景: 目标集筛选与传播
// ==========================================
#[tokio::test]
async fn test_target_ids_scope_load() {
    let client = test_helpers::create_service_instance();
    test_helpers::register_standard_schema(&client);

    // Account 数据集在前: 本轮内把 A1 的父 U1 传播进目标集
    let inputs = vec![
        CsvInput::new("Account", include_str!("fixtures/account.csv")),
        CsvInput::new("User", include_str!("fixtures/user.csv")),
    ];
    // 只选 A1: 其父 U1 经传播被拉入;A2/U2 不装载
    let mut options = UploadOptions::default();
    options.target_ids = Some(vec!["A1".to_string()]);

    let status = api(client)
        .load_csv_data(&inputs, &[], &options)
        .await
        .expect("装载失败");

    let loaded: Vec<&str> = status.successes.iter().map(|s| s.orig_id.as_str()).collect();
    assert!(loaded.contains(&"A1"));
    assert!(loaded.contains(&"U1"));
    assert!(!loaded.contains(&"A2"));
    assert!(!loaded.contains(&"U2"));
    assert_partition(&status);
}

// ==========================================
// 场景: 取消信号 → 返回部分状态
// ==========================================
#[tokio::test]
async fn test_cancelled_run_returns_partial() {
    let client = test_helpers::create_service_instance();
    test_helpers::register_standard_schema(&client);

    let cancel = Arc::new(AtomicBool::new(true));
    let inputs = vec![CsvInput::new("User", include_str!("fixtures/user.csv"))];

    let status = MigrationApi::new(client.clone(), client)
        .with_cancel_flag(cancel)
        .load_csv_data(&inputs, &[], &UploadOptions::default())
        .await
        .expect("装载失败");

    // 取消发生在第一轮之前: 无任何上传
    assert!(status.successes.is_empty());
    assert_eq!(status.total_count, 2);
}

// ==========================================
// 错误: 结构未找到中止运行
// ==========================================
#[tokio::test]
async fn test_schema_not_found_aborts() {
    let client = test_helpers::create_service_instance();
    // 未注册任何对象
    let inputs = vec![CsvInput::new("Account", "Id,Name\nA1,X\n")];

    let err = api(client)
        .load_csv_data(&inputs, &[], &UploadOptions::default())
        .await
        .expect_err("应当报错");
    assert!(matches!(
        err,
        ApiError::Migration(MigrationError::SchemaNotFound { ref object }) if object == "Account"
    ));
}

// ==========================================
// 错误: CSV 解析失败中止运行
// ==========================================
#[tokio::test]
async fn test_csv_parse_error_aborts() {
    let client = test_helpers::create_service_instance();
    test_helpers::register_standard_schema(&client);

    let mut options = UploadOptions::default();
    options.csv_parse_options.flexible = false;
    let inputs = vec![CsvInput::new("Account", "Id,Name\nA1\n")];

    let err = api(client)
        .load_csv_data(&inputs, &[], &options)
        .await
        .expect_err("应当报错");
    assert!(matches!(
        err,
        ApiError::Migration(MigrationError::CsvParse(_))
    ));
}
