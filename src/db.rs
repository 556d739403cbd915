// ==========================================
// 业务记录迁移系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 本地服务实例的元数据表建表入口
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout(毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化本地服务实例的元数据表
///
/// - service_object: 对象清单
/// - service_field: 逐对象字段描述(describe 的数据来源)
pub fn init_service_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS service_object (
            name TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS service_field (
            object_name  TEXT NOT NULL REFERENCES service_object(name) ON DELETE CASCADE,
            seq          INTEGER NOT NULL,
            field_name   TEXT NOT NULL,
            field_type   TEXT NOT NULL,
            createable   INTEGER NOT NULL DEFAULT 1,
            reference_to TEXT,
            PRIMARY KEY (object_name, field_name)
        );
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_service_schema_idempotent() {
        let conn = Connection::open_in_memory().expect("打开内存数据库失败");
        configure_sqlite_connection(&conn).expect("PRAGMA 配置失败");
        init_service_schema(&conn).expect("建表失败");
        // 幂等: 重复初始化不报错
        init_service_schema(&conn).expect("重复建表失败");
    }
}
