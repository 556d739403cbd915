// ==========================================
// 业务记录迁移系统 - API 层错误类型
// ==========================================
// 职责: 把引擎/访问层错误转换为用户可读错误
// ==========================================

use crate::engine::error::MigrationError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 迁移执行错误 =====
    #[error("迁移执行失败: {0}")]
    Migration(#[from] MigrationError),

    // ===== 任务档案错误 =====
    #[error("任务档案错误: {0}")]
    TaskFile(String),

    // ===== 文件读写错误 =====
    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
