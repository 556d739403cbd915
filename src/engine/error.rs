// ==========================================
// 业务记录迁移系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 策略: 下列错误在任何上传发生前中止整个运行;
//       单条创建失败/不动点阻塞不是错误(见 UploadStatus)
// ==========================================

use crate::client::error::ClientError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum MigrationError {
    // ===== 结构发现错误 =====
    #[error("对象结构未找到: {object}")]
    SchemaNotFound { object: String },

    // ===== 数据集错误 =====
    #[error("数据集缺少 id 类型列: {object}")]
    MissingIdColumn { object: String },

    #[error("CSV 解析失败: {0}")]
    CsvParse(String),

    // ===== 映射策略错误 =====
    #[error("映射策略引用了没有数据集的对象: {object}")]
    UnknownMappingObject { object: String },

    // ===== 远程访问错误 =====
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Result 类型别名
pub type MigrationResult<T> = Result<T, MigrationError>;
