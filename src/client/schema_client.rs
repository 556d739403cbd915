// ==========================================
// 业务记录迁移系统 - Schema Client Trait
// ==========================================
// 职责: 对象结构发现接口(describe)
// 实现者: SqliteServiceClient(本地实例)、远程服务适配器
// ==========================================

use crate::client::error::ClientError;
use crate::domain::describe::ObjectDescription;
use async_trait::async_trait;

// ==========================================
// SchemaClient Trait
// ==========================================
#[async_trait]
pub trait SchemaClient: Send + Sync {
    /// 获取对象结构描述
    ///
    /// # 参数
    /// - object: 对象名(按服务端规则匹配)
    ///
    /// # 返回
    /// - Ok(Some(desc)): 对象存在
    /// - Ok(None): 对象不存在(调用方可做命名空间回退重试)
    /// - Err: 传输层错误
    async fn describe(&self, object: &str) -> Result<Option<ObjectDescription>, ClientError>;
}
