// ==========================================
// 业务记录迁移系统 - 记录值类型
// ==========================================
// 职责: 异构字段值的带标签表示
// 说明: 日期/日期时间以字符串透传,由传输层按字段类型序列化
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 记录: 字段名 → 字段值
///
/// 使用 BTreeMap 保证批量创建时列顺序稳定
pub type Record = BTreeMap<String, FieldValue>;

// ==========================================
// FieldValue - 字段值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// 空值(未解析的引用、空引用单元格)
    Null,
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 布尔
    Bool(bool),
    /// 字符串(含日期/日期时间透传)
    Text(String),
}

impl FieldValue {
    /// 是否为空值
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// 以字符串视图读取(仅 Text 返回 Some)
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 转换为 CSV 单元格字符串
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Float(v) => v.to_string(),
            FieldValue::Bool(v) => v.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }

    /// 以 Id 字符串视图读取(Text 且非空)
    pub fn as_id(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cell())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_cell() {
        assert_eq!(FieldValue::Null.to_cell(), "");
        assert_eq!(FieldValue::Int(42).to_cell(), "42");
        assert_eq!(FieldValue::Bool(false).to_cell(), "false");
        assert_eq!(FieldValue::Text("A01".into()).to_cell(), "A01");
    }

    #[test]
    fn test_untagged_serialize() {
        let v = serde_json::to_value(FieldValue::Int(3)).unwrap();
        assert_eq!(v, serde_json::json!(3));
        let v = serde_json::to_value(FieldValue::Null).unwrap();
        assert_eq!(v, serde_json::Value::Null);
    }
}
