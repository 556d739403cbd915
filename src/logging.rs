// ==========================================
// 业务记录迁移系统 - 日志初始化
// ==========================================
// 职责: 迁移运行(批处理 CLI)的 tracing 订阅配置
// 口径: 缺省只看本 crate 的轮次/阶段日志,依赖库压到 warn
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// RUST_LOG 未设置时的默认过滤器
///
/// 装载/导出的轮次与阶段日志在 record_migrate 下以 info 输出;
/// rusqlite/tokio 等依赖噪声压到 warn
pub const DEFAULT_FILTER: &str = "warn,record_migrate=info";

/// 初始化日志系统(CLI 入口调用一次)
///
/// RUST_LOG 优先;例如 RUST_LOG=record_migrate::engine=debug
/// 可单独打开引擎层的逐行分类日志
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // 面向操作员的紧凑单行输出;定位问题靠结构化字段而非源码行号
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// 初始化测试环境的日志系统
///
/// 本 crate 全量 debug,写入测试捕获器;重复调用安全
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("record_migrate=debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
