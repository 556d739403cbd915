// ==========================================
// 业务记录迁移系统 - 本地 SQLite 服务实例
// ==========================================
// 职责: 以 SQLite 模拟一个记录管理服务实例
// 用途: CLI 本地目标、种子工具、集成测试
// 约束: 查询方言限于 SELECT…FROM…WHERE…IN/OR…ORDER BY…LIMIT…OFFSET,
//       引擎生成的语句可被 SQLite 直接执行
// ==========================================

use crate::client::data_client::DataClient;
use crate::client::error::ClientError;
use crate::client::schema_client::SchemaClient;
use crate::db;
use crate::domain::describe::{FieldDescription, ObjectDescription};
use crate::domain::record::{FieldValue, Record};
use crate::domain::types::{CreateResult, FieldType};
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

// ==========================================
// SqliteServiceClient
// ==========================================
pub struct SqliteServiceClient {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteServiceClient {
    /// 打开(或创建)本地实例文件
    pub fn open(db_path: &str) -> Result<Self, ClientError> {
        let conn = db::open_sqlite_connection(db_path)
            .map_err(|e| ClientError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// 以内存数据库创建实例(测试用)
    pub fn open_in_memory() -> Result<Self, ClientError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ClientError::Database(e.to_string()))?;
        db::configure_sqlite_connection(&conn)
            .map_err(|e| ClientError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// 从既有连接构建(负责元数据表初始化)
    pub fn from_connection(conn: Connection) -> Result<Self, ClientError> {
        db::init_service_schema(&conn).map_err(|e| ClientError::Database(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ClientError> {
        self.conn
            .lock()
            .map_err(|e| ClientError::LockError(e.to_string()))
    }

    /// 注册对象: 写入元数据表并建立数据表
    ///
    /// 数据表列类型按字段类型映射(int/boolean→INTEGER,
    /// double/currency/percent→REAL,其余→TEXT),id 字段为主键
    pub fn register_object(&self, desc: &ObjectDescription) -> Result<(), ClientError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR IGNORE INTO service_object (name) VALUES (?1)",
            [&desc.name],
        )
        .map_err(|e| ClientError::Database(e.to_string()))?;

        let mut columns = Vec::new();
        for (seq, field) in desc.fields.iter().enumerate() {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO service_field
                    (object_name, seq, field_name, field_type, createable, reference_to)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                rusqlite::params![
                    desc.name,
                    seq as i64,
                    field.name,
                    field.field_type.as_str(),
                    field.createable as i64,
                    if field.reference_to.is_empty() {
                        None
                    } else {
                        Some(field.reference_to.join(","))
                    },
                ],
            )
            .map_err(|e| ClientError::Database(e.to_string()))?;

            let sql_type = match field.field_type {
                FieldType::Int | FieldType::Boolean => "INTEGER",
                t if t.is_float_like() => "REAL",
                _ => "TEXT",
            };
            if field.field_type == FieldType::Id {
                columns.push(format!("{} TEXT PRIMARY KEY", quote_ident(&field.name)));
            } else {
                columns.push(format!("{} {}", quote_ident(&field.name), sql_type));
            }
        }

        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&desc.name),
            columns.join(", ")
        );
        conn.execute(&ddl, [])
            .map_err(|e| ClientError::Database(e.to_string()))?;

        debug!(object = %desc.name, field_count = desc.fields.len(), "本地实例注册对象");
        Ok(())
    }

    /// 直接插入一条带显式 Id 的记录(种子工具/测试用)
    pub fn insert_raw(&self, object: &str, record: &Record) -> Result<(), ClientError> {
        let conn = self.lock()?;
        insert_record(&conn, object, record).map_err(|e| ClientError::Database(e.to_string()))?;
        Ok(())
    }

    /// 查找对象的 id 字段名
    fn id_field_name(&self, object: &str) -> Result<String, ClientError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT field_name FROM service_field
             WHERE lower(object_name) = lower(?1) AND field_type = 'id'",
            [object],
            |row| row.get::<_, String>(0),
        )
        .map_err(|e| ClientError::Database(format!("对象 {} 缺少 id 字段: {}", object, e)))
    }
}

// ==========================================
// SchemaClient 实现
// ==========================================
#[async_trait]
impl SchemaClient for SqliteServiceClient {
    async fn describe(&self, object: &str) -> Result<Option<ObjectDescription>, ClientError> {
        let conn = self.lock()?;

        let name: Option<String> = conn
            .query_row(
                "SELECT name FROM service_object WHERE lower(name) = lower(?1)",
                [object],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(ClientError::Database(other.to_string())),
            })?;

        let Some(name) = name else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare(
                "SELECT field_name, field_type, createable, reference_to
                 FROM service_field
                 WHERE lower(object_name) = lower(?1)
                 ORDER BY seq",
            )
            .map_err(|e| ClientError::Database(e.to_string()))?;

        let fields = stmt
            .query_map([&name], |row| {
                let field_name: String = row.get(0)?;
                let field_type: String = row.get(1)?;
                let createable: i64 = row.get(2)?;
                let reference_to: Option<String> = row.get(3)?;
                Ok(FieldDescription {
                    name: field_name,
                    field_type: FieldType::parse(&field_type),
                    createable: createable != 0,
                    reference_to: reference_to
                        .map(|s| {
                            s.split(',')
                                .map(|o| o.trim().to_string())
                                .filter(|o| !o.is_empty())
                                .collect()
                        })
                        .unwrap_or_default(),
                })
            })
            .map_err(|e| ClientError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ClientError::Database(e.to_string()))?;

        Ok(Some(ObjectDescription::new(name, fields)))
    }
}

// ==========================================
// DataClient 实现
// ==========================================
#[async_trait]
impl DataClient for SqliteServiceClient {
    async fn query(&self, soql: &str, max_fetch_size: usize) -> Result<Vec<Record>, ClientError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(soql)
            .map_err(|e| ClientError::QueryFailed(format!("{}: {}", e, soql)))?;
        let column_names: Vec<String> =
            stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt
            .query([])
            .map_err(|e| ClientError::QueryFailed(e.to_string()))?;

        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| ClientError::QueryFailed(e.to_string()))?
        {
            if records.len() >= max_fetch_size {
                break;
            }
            let mut record = Record::new();
            for (idx, column) in column_names.iter().enumerate() {
                let value = match row.get_ref(idx) {
                    Ok(ValueRef::Null) => FieldValue::Null,
                    Ok(ValueRef::Integer(v)) => FieldValue::Int(v),
                    Ok(ValueRef::Real(v)) => FieldValue::Float(v),
                    Ok(ValueRef::Text(bytes)) => {
                        FieldValue::Text(String::from_utf8_lossy(bytes).into_owned())
                    }
                    Ok(ValueRef::Blob(_)) => FieldValue::Null,
                    Err(e) => return Err(ClientError::QueryFailed(e.to_string())),
                };
                record.insert(column.clone(), value);
            }
            records.push(record);
        }

        debug!(count = records.len(), "本地实例查询完成");
        Ok(records)
    }

    async fn create(
        &self,
        object: &str,
        records: &[Record],
    ) -> Result<Vec<CreateResult>, ClientError> {
        let id_field = self.id_field_name(object)?;
        let conn = self.lock()?;

        let mut results = Vec::with_capacity(records.len());
        for record in records {
            let new_id = format!("REC-{}", Uuid::new_v4());
            let mut with_id = record.clone();
            with_id.insert(id_field.clone(), FieldValue::Text(new_id.clone()));

            match insert_record(&conn, object, &with_id) {
                Ok(_) => results.push(CreateResult::ok(new_id)),
                Err(e) => results.push(CreateResult::failed(vec![e.to_string()])),
            }
        }

        debug!(
            object = %object,
            requested = records.len(),
            succeeded = results.iter().filter(|r| r.success).count(),
            "本地实例批量创建完成"
        );
        Ok(results)
    }
}

// ==========================================
// 内部辅助
// ==========================================

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn insert_record(conn: &Connection, object: &str, record: &Record) -> rusqlite::Result<usize> {
    let columns: Vec<&String> = record.keys().collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(object),
        columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", "),
        placeholders.join(", ")
    );

    let params: Vec<rusqlite::types::Value> = record
        .values()
        .map(|v| match v {
            FieldValue::Null => rusqlite::types::Value::Null,
            FieldValue::Int(i) => rusqlite::types::Value::Integer(*i),
            FieldValue::Float(f) => rusqlite::types::Value::Real(*f),
            FieldValue::Bool(b) => rusqlite::types::Value::Integer(*b as i64),
            FieldValue::Text(s) => rusqlite::types::Value::Text(s.clone()),
        })
        .collect();

    conn.execute(&sql, rusqlite::params_from_iter(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::FieldType;

    fn account_desc() -> ObjectDescription {
        ObjectDescription::new(
            "Account",
            vec![
                FieldDescription::new("Id", FieldType::Id),
                FieldDescription::new("Name", FieldType::Text),
                FieldDescription::new("NumberOfEmployees", FieldType::Int),
            ],
        )
    }

    #[tokio::test]
    async fn test_register_and_describe() {
        let client = SqliteServiceClient::open_in_memory().expect("创建本地实例失败");
        client.register_object(&account_desc()).expect("注册失败");

        // 大小写不敏感
        let desc = client.describe("account").await.expect("describe 失败");
        let desc = desc.expect("对象应存在");
        assert_eq!(desc.name, "Account");
        assert_eq!(desc.fields.len(), 3);
        assert_eq!(desc.id_field().unwrap().name, "Id");

        let missing = client.describe("Lead").await.expect("describe 失败");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_create_and_query() {
        let client = SqliteServiceClient::open_in_memory().expect("创建本地实例失败");
        client.register_object(&account_desc()).expect("注册失败");

        let mut record = Record::new();
        record.insert("Name".to_string(), FieldValue::Text("账户01".into()));
        record.insert("NumberOfEmployees".to_string(), FieldValue::Int(12));

        let results = client
            .create("Account", &[record])
            .await
            .expect("创建失败");
        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        let new_id = results[0].id.clone().unwrap();
        assert!(new_id.starts_with("REC-"));

        let rows = client
            .query("SELECT \"Id\", \"Name\" FROM \"Account\"", 10_000)
            .await
            .expect("查询失败");
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get("Id").and_then(|v| v.as_id()),
            Some(new_id.as_str())
        );
    }

    #[tokio::test]
    async fn test_create_partial_failure() {
        let client = SqliteServiceClient::open_in_memory().expect("创建本地实例失败");
        client.register_object(&account_desc()).expect("注册失败");

        let mut ok = Record::new();
        ok.insert("Name".to_string(), FieldValue::Text("A".into()));
        // 未注册字段触发 SQL 错误,对应单条失败而非整体错误
        let mut bad = Record::new();
        bad.insert("NoSuchColumn".to_string(), FieldValue::Text("x".into()));

        let results = client
            .create("Account", &[ok, bad])
            .await
            .expect("创建不应整体失败");
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(!results[1].errors.is_empty());
    }
}
