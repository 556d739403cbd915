// ==========================================
// 业务记录迁移系统 - Data Client Trait
// ==========================================
// 职责: 记录查询与批量创建接口
// 约束: create 返回与请求按位置一一对应
// ==========================================

use crate::client::error::ClientError;
use crate::domain::record::Record;
use crate::domain::types::CreateResult;
use async_trait::async_trait;

// ==========================================
// DataClient Trait
// ==========================================
#[async_trait]
pub trait DataClient: Send + Sync {
    /// 执行查询,取回记录集
    ///
    /// 流式结果在实现内部被完整缓冲后返回(闭包循环需要整段 Id 集),
    /// max_fetch_size 为取回上限
    ///
    /// # 参数
    /// - soql: 查询语句(SELECT … FROM … [WHERE …][ORDER BY …][LIMIT …][OFFSET …])
    /// - max_fetch_size: 最大取回记录数
    async fn query(
        &self,
        soql: &str,
        max_fetch_size: usize,
    ) -> Result<Vec<Record>, ClientError>;

    /// 批量创建记录
    ///
    /// # 参数
    /// - object: 对象名
    /// - records: 记录体列表(一个对象一轮一批)
    ///
    /// # 返回
    /// - Ok(results): 与 records 按位置对应的逐条结果;
    ///   单条失败不构成错误,由调用方归入 failures
    /// - Err: 传输层错误(整个运行终止)
    async fn create(
        &self,
        object: &str,
        records: &[Record],
    ) -> Result<Vec<CreateResult>, ClientError>;
}
