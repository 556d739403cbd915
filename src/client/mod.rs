// ==========================================
// 业务记录迁移系统 - 远程服务访问层
// ==========================================
// 职责: 定义记录管理服务的访问接口,屏蔽传输细节
// 红线: Client 不含迁移业务逻辑
// ==========================================

pub mod data_client;
pub mod error;
pub mod schema_client;
pub mod sqlite_client;

// 重导出核心接口
pub use data_client::DataClient;
pub use error::{ClientError, ClientResult};
pub use schema_client::SchemaClient;
pub use sqlite_client::SqliteServiceClient;
