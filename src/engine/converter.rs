// ==========================================
// 业务记录迁移系统 - 行→记录转换器
// ==========================================
// 职责: 字符串单元格 → 类型化字段值;引用列经 IdMap 重写
// 口径: 不可创建字段一律不写入;id 列只作源主键,不进记录体
// ==========================================

use crate::domain::dataset::RecordIdPair;
use crate::domain::idmap::IdMap;
use crate::domain::record::{FieldValue, Record};
use crate::domain::types::FieldType;
use crate::engine::describer::Describer;
use crate::engine::error::{MigrationError, MigrationResult};

/// 把单行转换为待创建记录
///
/// # 转换口径
/// | 字段类型 | 处理 |
/// |---|---|
/// | id | 记为 orig_id,不写入记录体 |
/// | int | 整数解析成功才写入 |
/// | double/currency/percent | 浮点解析成功才写入 |
/// | date/datetime | 非空才写入,字符串透传 |
/// | boolean | 空/0/n/f/false(不分大小写)为 false,其余为 true |
/// | reference | 经 IdMap 重写;未命中写入空值 |
/// | 其他 | 字符串透传 |
///
/// 未知表头跳过;找不到 id 列时报 MissingIdColumn
pub fn convert_row(
    object: &str,
    headers: &[String],
    row: &[String],
    describer: &Describer,
    id_map: &IdMap,
) -> MigrationResult<RecordIdPair> {
    let mut orig_id: Option<String> = None;
    let mut record = Record::new();

    for (index, header) in headers.iter().enumerate() {
        let cell = row.get(index).map(String::as_str).unwrap_or("");
        let Some(field) = describer.find_field(object, header) else {
            continue;
        };

        match field.field_type {
            FieldType::Id => {
                if orig_id.is_none() {
                    orig_id = Some(cell.to_string());
                }
            }
            FieldType::Int => {
                if field.createable {
                    if let Ok(value) = cell.trim().parse::<i64>() {
                        record.insert(field.name.clone(), FieldValue::Int(value));
                    }
                }
            }
            t if t.is_float_like() => {
                if field.createable {
                    if let Ok(value) = cell.trim().parse::<f64>() {
                        record.insert(field.name.clone(), FieldValue::Float(value));
                    }
                }
            }
            FieldType::Date | FieldType::DateTime => {
                if field.createable && !cell.is_empty() {
                    record.insert(field.name.clone(), FieldValue::Text(cell.to_string()));
                }
            }
            FieldType::Boolean => {
                if field.createable {
                    record.insert(field.name.clone(), FieldValue::Bool(parse_boolean(cell)));
                }
            }
            FieldType::Reference => {
                if field.createable {
                    let value = match id_map.get(cell) {
                        Some(target) => FieldValue::Text(target.to_string()),
                        None => FieldValue::Null,
                    };
                    record.insert(field.name.clone(), value);
                }
            }
            _ => {
                if field.createable {
                    record.insert(field.name.clone(), FieldValue::Text(cell.to_string()));
                }
            }
        }
    }

    let orig_id = orig_id.ok_or_else(|| MigrationError::MissingIdColumn {
        object: object.to_string(),
    })?;
    Ok(RecordIdPair { orig_id, record })
}

/// 布尔单元格解析: 空串/0/n/f/false 为假,其余为真
fn parse_boolean(cell: &str) -> bool {
    !matches!(
        cell.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "n" | "f" | "false"
    )
}
