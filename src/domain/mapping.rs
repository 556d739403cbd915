// ==========================================
// 业务记录迁移系统 - 映射策略
// ==========================================
// 职责: 业务键匹配与默认映射的策略描述
// 用途: 装载前据此解析预存在的目标记录,生成 IdMap 种子
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// MappingPolicy - 单对象映射策略
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingPolicy {
    /// 目标对象名
    pub object: String,

    /// 业务键字段(单字段简写,等价于 key_fields: [K])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_field: Option<String>,

    /// 业务键字段列表(复合键按 "\t" 拼接比较)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_fields: Option<Vec<String>>,

    /// 默认映射(业务键未命中的源记录统一落到此目标)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mapping: Option<DefaultMapping>,
}

impl MappingPolicy {
    /// 生效的业务键字段列表
    ///
    /// key_fields 优先;key_field 视为单元素列表;均缺省时为空
    pub fn effective_key_fields(&self) -> Vec<String> {
        if let Some(fields) = &self.key_fields {
            return fields.clone();
        }
        if let Some(field) = &self.key_field {
            return vec![field.clone()];
        }
        Vec::new()
    }
}

// ==========================================
// DefaultMapping - 默认映射
// ==========================================

/// 默认映射: 字面目标 Id 或单条选取查询
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultMapping {
    /// 直接指定目标 Id
    Literal(String),
    /// 以条件查询选取一条既有目标记录
    Picker(DefaultMappingPicker),
}

/// 默认映射的选取查询参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultMappingPicker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>, // WHERE 条件
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orderby: Option<String>,   // ORDER BY 子句
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,       // OFFSET(取第 N+1 条)
}
