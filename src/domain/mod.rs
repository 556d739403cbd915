// ==========================================
// 业务记录迁移系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、值对象
// 红线: 不含远程访问逻辑,不含引擎逻辑
// ==========================================

pub mod dataset;
pub mod describe;
pub mod idmap;
pub mod mapping;
pub mod query;
pub mod record;
pub mod status;
pub mod types;

// 重导出核心类型
pub use dataset::{CsvInput, LoadDataset, RecordIdPair, WaitingRow};
pub use describe::{FieldDescription, ObjectDescription};
pub use idmap::IdMap;
pub use mapping::{DefaultMapping, DefaultMappingPicker, MappingPolicy};
pub use query::{DumpQuery, FieldList};
pub use record::{FieldValue, Record};
pub use status::{
    BlockedRecord, DumpProgress, FailedRecord, LoadProgress, LoadReport, MappedRecord,
    UploadStatus, UploadedRecord,
};
pub use types::{CreateResult, FieldType, QueryTarget};
