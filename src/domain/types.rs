// ==========================================
// 业务记录迁移系统 - 基础类型定义
// ==========================================
// 职责: 字段类型、查询目标等基础枚举
// 对齐: 远程服务 describe 返回的字段类型口径
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// FieldType - 字段类型
// ==========================================

/// 对象字段类型
///
/// 远程服务的 describe 结果以字符串形式携带类型名;
/// 未识别的类型一律按 Text 处理(透传字符串)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// 主键字段(每个对象恰好一个)
    Id,
    /// 引用字段(值为其他记录的 Id)
    Reference,
    /// 整数
    Int,
    /// 浮点数
    Double,
    /// 金额(按浮点数处理)
    Currency,
    /// 百分比(按浮点数处理)
    Percent,
    /// 日期(装载时透传字符串)
    Date,
    /// 日期时间(装载时透传字符串)
    #[serde(rename = "datetime")]
    DateTime,
    /// 布尔
    Boolean,
    /// 其他类型(字符串透传)
    #[serde(rename = "string")]
    Text,
}

impl FieldType {
    /// 从类型名解析(大小写不敏感,未识别的类型归入 Text)
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "id" => FieldType::Id,
            "reference" => FieldType::Reference,
            "int" => FieldType::Int,
            "double" => FieldType::Double,
            "currency" => FieldType::Currency,
            "percent" => FieldType::Percent,
            "date" => FieldType::Date,
            "datetime" => FieldType::DateTime,
            "boolean" => FieldType::Boolean,
            _ => FieldType::Text,
        }
    }

    /// 转换为类型名字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Id => "id",
            FieldType::Reference => "reference",
            FieldType::Int => "int",
            FieldType::Double => "double",
            FieldType::Currency => "currency",
            FieldType::Percent => "percent",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Boolean => "boolean",
            FieldType::Text => "string",
        }
    }

    /// 是否为数值类浮点字段
    pub fn is_float_like(&self) -> bool {
        matches!(
            self,
            FieldType::Double | FieldType::Currency | FieldType::Percent
        )
    }
}

// ==========================================
// QueryTarget - 导出查询目标类型
// ==========================================

/// 导出查询的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryTarget {
    /// 种子查询(直接执行,结果作为闭包起点)
    Query,
    /// 关联查询(随引用图扩展被动拉取)
    Related,
}

// ==========================================
// CreateResult - 批量创建单条结果
// ==========================================

/// DataClient::create 的单条返回(与请求按位置对应)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResult {
    /// 是否创建成功
    pub success: bool,
    /// 新记录 Id(成功时存在)
    pub id: Option<String>,
    /// 失败原因列表(失败时非空)
    #[serde(default)]
    pub errors: Vec<String>,
}

impl CreateResult {
    /// 构造成功结果
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            success: true,
            id: Some(id.into()),
            errors: Vec::new(),
        }
    }

    /// 构造失败结果
    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            success: false,
            id: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_parse() {
        assert_eq!(FieldType::parse("Id"), FieldType::Id);
        assert_eq!(FieldType::parse("REFERENCE"), FieldType::Reference);
        assert_eq!(FieldType::parse("datetime"), FieldType::DateTime);
        // 未识别类型归入 Text
        assert_eq!(FieldType::parse("textarea"), FieldType::Text);
        assert_eq!(FieldType::parse("picklist"), FieldType::Text);
    }

    #[test]
    fn test_field_type_roundtrip() {
        for t in [
            FieldType::Id,
            FieldType::Reference,
            FieldType::Int,
            FieldType::Double,
            FieldType::Currency,
            FieldType::Percent,
            FieldType::Date,
            FieldType::DateTime,
            FieldType::Boolean,
        ] {
            assert_eq!(FieldType::parse(t.as_str()), t);
        }
    }
}
