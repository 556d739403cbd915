// ==========================================
// 业务记录迁移系统 - 访问层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 访问层错误类型
#[derive(Error, Debug)]
pub enum ClientError {
    // ===== 传输错误 =====
    #[error("传输错误: {0}")]
    Transport(String),

    // ===== 查询错误 =====
    #[error("查询失败: {0}")]
    QueryFailed(String),

    // ===== 创建错误 =====
    #[error("批量创建失败: object={object}, reason={reason}")]
    CreateFailed { object: String, reason: String },

    // ===== 本地实例错误 =====
    #[error("数据库错误: {0}")]
    Database(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),
}

/// Result 类型别名
pub type ClientResult<T> = Result<T, ClientError>;
