// ==========================================
// 业务记录迁移系统 - 装载数据集
// ==========================================
// 职责: CSV 解析产物与装载管道中间结构
// 生命周期: 仅在装载流程内,逐轮破坏性更新
// ==========================================

use crate::domain::record::Record;
use serde::{Deserialize, Serialize};

// ==========================================
// CsvInput - 装载入口的原始输入
// ==========================================
// 用途: 门面层输入(对象名 + CSV 文本)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvInput {
    pub object: String, // 对象名(大小写/命名空间宽容)
    pub csv: String,    // CSV 文本(首行为表头,须含源实例 Id 列)
}

impl CsvInput {
    pub fn new(object: impl Into<String>, csv: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            csv: csv.into(),
        }
    }
}

// ==========================================
// LoadDataset - 单对象装载数据集
// ==========================================
// 不变式: 每行单元格数等于表头数(解析层补齐/截断)
// 不变式: 恰有一个表头映射到 id 类型字段(分类器校验)
#[derive(Debug, Clone)]
pub struct LoadDataset {
    pub object: String,         // 对象名
    pub headers: Vec<String>,   // 表头(保留原始写法)
    pub rows: Vec<Vec<String>>, // 数据行(逐轮收缩: 已上传/已映射行移出)
}

impl LoadDataset {
    pub fn new(object: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            object: object.into(),
            headers,
            rows,
        }
    }
}

// ==========================================
// RecordIdPair - 转换器输出
// ==========================================
// 用途: 源 Id 与待创建记录的配对,create 返回后据此回填 IdMap
#[derive(Debug, Clone)]
pub struct RecordIdPair {
    pub orig_id: String, // 源实例主键单元格
    pub record: Record,  // 已类型化、已重写引用的记录体
}

// ==========================================
// WaitingRow - 等待行
// ==========================================
// 用途: 本轮不可上传的行,携带首个未解析引用作为阻塞说明
#[derive(Debug, Clone)]
pub struct WaitingRow {
    pub orig_id: String,                // 源实例主键
    pub row: Vec<String>,               // 原始行(下一轮重新分类)
    pub blocking_field: Option<String>, // 首个未解析引用的字段名
    pub blocking_id: Option<String>,    // 首个未解析引用的 Id 值
}
