// ==========================================
// 业务记录迁移系统 - 引擎层
// ==========================================
// 职责: 依赖感知的装载/导出不动点引擎
// 红线: 引擎通过 Client trait 访问服务,不触碰传输细节;
//       所有阻塞判定必须输出 blocking_field/blocking_id
// ==========================================

pub mod classifier;
pub mod converter;
pub mod describer;
pub mod dumper;
pub mod error;
pub mod events;
pub mod loader;
pub mod mapping_resolver;
pub mod namespace;
pub mod soql;

// 重导出核心引擎
pub use classifier::{classify_rows, ClassifyOutcome};
pub use converter::convert_row;
pub use describer::Describer;
pub use dumper::DumpOrchestrator;
pub use error::{MigrationError, MigrationResult};
pub use events::{
    NoOpProgressPublisher, OptionalProgressPublisher, ProgressEvent, ProgressPublisher,
};
pub use loader::LoadOrchestrator;
pub use mapping_resolver::MappingResolver;
