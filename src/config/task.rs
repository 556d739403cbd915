// ==========================================
// 业务记录迁移系统 - CLI 任务档案
// ==========================================
// 职责: load/dump 子命令的 JSON 任务描述
// ==========================================

use crate::config::options::{DumpOptions, UploadOptions};
use crate::domain::mapping::MappingPolicy;
use crate::domain::query::DumpQuery;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

// ==========================================
// LoadTask - 装载任务
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTask {
    /// 输入 CSV 文件(逐对象一个)
    pub inputs: Vec<LoadInput>,
    /// 映射策略
    #[serde(default)]
    pub mappings: Vec<MappingPolicy>,
    /// 装载选项
    #[serde(default)]
    pub options: UploadOptions,
}

/// 单个输入文件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadInput {
    pub object: String, // 对象名
    pub path: PathBuf,  // CSV 文件路径(相对任务文件所在目录解析)
}

impl LoadTask {
    /// 从 JSON 文件读取;inputs 中的相对路径按任务文件目录解析
    pub fn from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        let mut task: LoadTask = serde_json::from_str(&text)?;
        if let Some(dir) = path.parent() {
            for input in &mut task.inputs {
                if input.path.is_relative() {
                    input.path = dir.join(&input.path);
                }
            }
        }
        Ok(task)
    }
}

// ==========================================
// DumpTask - 导出任务
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpTask {
    /// 导出查询(种子 + 关联)
    pub queries: Vec<DumpQuery>,
    /// 导出选项
    #[serde(default)]
    pub options: DumpOptions,
}

impl DumpTask {
    pub fn from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
