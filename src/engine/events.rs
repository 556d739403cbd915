// ==========================================
// 业务记录迁移系统 - 引擎层进度发布
// ==========================================
// 职责: 定义进度发布 trait,实现依赖倒置
// 说明: Engine 层定义 trait,调用方(CLI/上层)实现订阅
// ==========================================

use crate::domain::status::{DumpProgress, LoadProgress};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 进度事件
// ==========================================

/// 迁移进度事件
///
/// 装载驱动每轮上传后、导出驱动每个扩展阶段后发布
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEvent {
    /// 装载进度
    Load(LoadProgress),
    /// 导出进度
    Dump(DumpProgress),
}

impl ProgressEvent {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            ProgressEvent::Load(_) => "Load",
            ProgressEvent::Dump(_) => "Dump",
        }
    }
}

// ==========================================
// 进度发布 Trait
// ==========================================

/// 进度发布者 Trait
///
/// Engine 层定义,调用方实现;驱动在阶段间同步调用,
/// 发布失败不影响迁移流程(由包装层记录日志)
pub trait ProgressPublisher: Send + Sync {
    /// 发布进度事件
    fn publish(&self, event: ProgressEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作进度发布者
///
/// 用于不需要进度回调的场景(如单元测试)
#[derive(Debug, Clone, Default)]
pub struct NoOpProgressPublisher;

impl ProgressPublisher for NoOpProgressPublisher {
    fn publish(&self, event: ProgressEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(kind = event.as_str(), "NoOpProgressPublisher: 跳过进度发布");
        Ok(())
    }
}

/// 可选的进度发布者包装
///
/// 简化 Option<Arc<dyn ProgressPublisher>> 的使用
pub struct OptionalProgressPublisher {
    inner: Option<Arc<dyn ProgressPublisher>>,
}

impl OptionalProgressPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn ProgressPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例(不发布进度)
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布进度(如果有发布者);发布失败仅记录日志
    pub fn publish(&self, event: ProgressEvent) {
        if let Some(publisher) = &self.inner {
            if let Err(e) = publisher.publish(event) {
                tracing::warn!(error = %e, "进度发布失败,忽略");
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalProgressPublisher {
    fn default() -> Self {
        Self::none()
    }
}
