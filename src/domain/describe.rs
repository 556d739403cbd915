// ==========================================
// 业务记录迁移系统 - 对象结构描述
// ==========================================
// 职责: 远程服务 describe 结果的领域表示
// 用途: Describer 缓存条目,引擎只读
// ==========================================

use crate::domain::types::FieldType;
use serde::{Deserialize, Serialize};

// ==========================================
// FieldDescription - 字段描述
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescription {
    pub name: String,                // 字段名(保留原始命名空间前缀)
    pub field_type: FieldType,       // 字段类型
    pub createable: bool,            // 创建时是否可写
    #[serde(default)]
    pub reference_to: Vec<String>,   // 引用目标对象列表(仅 reference 类型非空)
}

impl FieldDescription {
    /// 构造一个可创建的普通字段
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            createable: true,
            reference_to: Vec::new(),
        }
    }

    /// 构造一个引用字段
    pub fn reference(name: impl Into<String>, reference_to: Vec<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Reference,
            createable: true,
            reference_to,
        }
    }

    /// 标记为不可创建
    pub fn not_createable(mut self) -> Self {
        self.createable = false;
        self
    }
}

// ==========================================
// ObjectDescription - 对象描述
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDescription {
    pub name: String,                // 对象名(服务端规范形式)
    pub fields: Vec<FieldDescription>, // 字段列表
}

impl ObjectDescription {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescription>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// 主键字段(类型为 id 的第一个字段)
    pub fn id_field(&self) -> Option<&FieldDescription> {
        self.fields.iter().find(|f| f.field_type == FieldType::Id)
    }

    /// 全部字段名(保持 describe 返回顺序)
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}
