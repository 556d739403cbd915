// ==========================================
// 业务记录迁移系统 - 装载/导出结果与进度
// ==========================================
// 职责: 运行结果汇总与阶段进度结构
// 不变式: 每个输入行至多出现在 successes/failures/blocked/already_mapped 之一
// ==========================================

use crate::domain::idmap::IdMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// 装载结果条目
// ==========================================

/// 成功上传的记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedRecord {
    pub object: String,  // 对象名
    pub orig_id: String, // 源实例 Id
    pub new_id: String,  // 目标实例新 Id
}

/// 上传失败的记录(服务端逐条拒绝,不中止运行)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedRecord {
    pub object: String,
    pub orig_id: String,
    pub errors: Vec<String>, // 服务端返回的失败原因
}

/// 阻塞的记录(不动点时仍有未解析引用,或始终不在目标集内)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedRecord {
    pub object: String,
    pub orig_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking_field: Option<String>, // 首个未解析引用的字段名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking_id: Option<String>,    // 首个未解析引用的 Id
}

/// 已映射而跳过的记录(源 Id 在装载开始前已有目标映射)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedRecord {
    pub object: String,
    pub orig_id: String,
}

// ==========================================
// UploadStatus - 装载运行总结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadStatus {
    pub total_count: usize,               // 输入总行数(运行开始时一次计算)
    pub successes: Vec<UploadedRecord>,   // 成功条目
    pub failures: Vec<FailedRecord>,      // 失败条目
    pub blocked: Vec<BlockedRecord>,      // 不动点时的阻塞条目
    pub already_mapped: Vec<MappedRecord>, // 已映射跳过条目
    pub id_map: IdMap,                    // 最终 ID 翻译映射
}

impl UploadStatus {
    pub fn new(total_count: usize, id_map: IdMap) -> Self {
        Self {
            total_count,
            successes: Vec::new(),
            failures: Vec::new(),
            blocked: Vec::new(),
            already_mapped: Vec::new(),
            id_map,
        }
    }

    /// 成功条数
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// 失败条数
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

// ==========================================
// 进度结构
// ==========================================

/// 装载进度(每轮上传后发布)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadProgress {
    pub total_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
}

/// 导出进度(每个扩展阶段后发布)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpProgress {
    pub fetched_count: usize,                          // 已取回总记录数
    pub fetched_count_per_object: BTreeMap<String, usize>, // 逐对象计数
}

// ==========================================
// LoadReport - 带计时的运行报告(CLI/调用方展示用)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub status: UploadStatus,
    pub started_at: DateTime<Utc>, // 运行开始时间
    pub elapsed_ms: i64,           // 运行耗时(毫秒)
}
