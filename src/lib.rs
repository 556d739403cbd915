// ==========================================
// 业务记录迁移系统 - 核心库
// ==========================================
// 技术栈: Rust + tokio + rusqlite
// 系统定位: 跨实例业务记录迁移(装载/导出双向)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 远程服务访问层 - Client trait 与本地实例
pub mod client;

// 引擎层 - 装载/导出不动点引擎
pub mod engine;

// CSV 解析层 - 外部数据
pub mod csvio;

// 配置层 - 运行选项与任务档案
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 迁移门面
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    BlockedRecord, CreateResult, CsvInput, DefaultMapping, DumpProgress, DumpQuery,
    FailedRecord, FieldDescription, FieldList, FieldType, FieldValue, IdMap, LoadDataset,
    LoadProgress, LoadReport, MappedRecord, MappingPolicy, ObjectDescription, QueryTarget,
    Record, RecordIdPair, UploadStatus, UploadedRecord,
};

// 访问层
pub use client::{ClientError, DataClient, SchemaClient, SqliteServiceClient};

// 引擎
pub use engine::{
    Describer, DumpOrchestrator, LoadOrchestrator, MappingResolver, MigrationError,
    NoOpProgressPublisher, OptionalProgressPublisher, ProgressEvent, ProgressPublisher,
};

// 配置
pub use config::{CsvParseOptions, DumpOptions, DumpTask, LoadTask, UploadOptions};

// API
pub use api::{ApiError, MigrationApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "业务记录迁移系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
