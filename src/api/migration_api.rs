// ==========================================
// 业务记录迁移系统 - 迁移门面
// ==========================================
// 职责: 两个入口 load_csv_data / dump_as_csv;
//       组装 Describer/解析器/驱动,接线进度与取消
// ==========================================

use crate::api::error::ApiResult;
use crate::client::data_client::DataClient;
use crate::client::schema_client::SchemaClient;
use crate::config::options::{DumpOptions, UploadOptions};
use crate::csvio;
use crate::domain::dataset::{CsvInput, LoadDataset};
use crate::domain::mapping::MappingPolicy;
use crate::domain::query::DumpQuery;
use crate::domain::status::{LoadReport, UploadStatus};
use crate::engine::describer::Describer;
use crate::engine::dumper::DumpOrchestrator;
use crate::engine::events::{OptionalProgressPublisher, ProgressPublisher};
use crate::engine::loader::LoadOrchestrator;
use crate::engine::mapping_resolver::MappingResolver;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

// ==========================================
// MigrationApi
// ==========================================
pub struct MigrationApi<S: ?Sized, D: ?Sized>
where
    S: SchemaClient,
    D: DataClient,
{
    schema_client: Arc<S>,
    data_client: Arc<D>,
    publisher: OptionalProgressPublisher,
    cancel: Option<Arc<AtomicBool>>,
}

impl<S: ?Sized, D: ?Sized> MigrationApi<S, D>
where
    S: SchemaClient,
    D: DataClient,
{
    /// 创建门面实例
    ///
    /// # 参数
    /// - schema_client: 结构发现客户端
    /// - data_client: 数据客户端(查询/批量创建)
    pub fn new(schema_client: Arc<S>, data_client: Arc<D>) -> Self {
        Self {
            schema_client,
            data_client,
            publisher: OptionalProgressPublisher::none(),
            cancel: None,
        }
    }

    /// 配置进度发布者(阶段间同步调用)
    pub fn with_publisher(mut self, publisher: Arc<dyn ProgressPublisher>) -> Self {
        self.publisher = OptionalProgressPublisher::with_publisher(publisher);
        self
    }

    /// 配置取消信号(轮/阶段之间为取消点,取消返回部分状态)
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    // ==========================================
    // 入口1: 装载
    // ==========================================

    /// 装载 CSV 数据到目标实例
    ///
    /// # 流程
    /// 1. 解析 CSV → 逐对象数据集
    /// 2. 构建 Describer(数据集对象全集)
    /// 3. IdMap 种子 + 映射策略解析
    /// 4. 装载不动点驱动
    pub async fn load_csv_data(
        &self,
        inputs: &[CsvInput],
        policies: &[MappingPolicy],
        options: &UploadOptions,
    ) -> ApiResult<UploadStatus> {
        // === 步骤 1: 解析 CSV ===
        let mut datasets: Vec<LoadDataset> = Vec::with_capacity(inputs.len());
        for input in inputs {
            datasets.push(csvio::parse_dataset(
                &input.object,
                &input.csv,
                &options.csv_parse_options,
            )?);
        }
        info!(dataset_count = datasets.len(), "CSV 解析完成");

        // === 步骤 2: 构建 Describer ===
        let object_names: Vec<String> = datasets.iter().map(|d| d.object.clone()).collect();
        let describer = Describer::build(
            self.schema_client.as_ref(),
            &object_names,
            options.default_namespace.as_deref(),
        )
        .await?;

        // === 步骤 3: IdMap 种子与映射策略 ===
        let mut id_map = options.id_map.clone().unwrap_or_default();
        let resolver = MappingResolver::new(self.data_client.as_ref(), &describer);
        resolver.resolve(policies, &datasets, &mut id_map).await?;
        info!(seed_map_size = id_map.len(), "映射策略解析完成");

        // === 步骤 4: 装载驱动 ===
        let target_ids: HashSet<String> = options
            .target_ids
            .clone()
            .unwrap_or_default()
            .into_iter()
            .collect();
        let mut loader =
            LoadOrchestrator::new(self.data_client.as_ref(), &describer, &self.publisher);
        if let Some(cancel) = self.cancel.as_deref() {
            loader = loader.with_cancel(cancel);
        }
        let status = loader.upload(datasets, id_map, target_ids).await?;
        Ok(status)
    }

    /// 装载并产出带计时的运行报告
    pub async fn load_csv_data_report(
        &self,
        inputs: &[CsvInput],
        policies: &[MappingPolicy],
        options: &UploadOptions,
    ) -> ApiResult<LoadReport> {
        let started_at = Utc::now();
        let start = Instant::now();
        let status = self.load_csv_data(inputs, policies, options).await?;
        Ok(LoadReport {
            status,
            started_at,
            elapsed_ms: start.elapsed().as_millis() as i64,
        })
    }

    // ==========================================
    // 入口2: 导出
    // ==========================================

    /// 从源实例导出传递闭包,按输入顺序返回逐查询 CSV
    pub async fn dump_as_csv(
        &self,
        queries: &[DumpQuery],
        options: &DumpOptions,
    ) -> ApiResult<Vec<String>> {
        let object_names: Vec<String> = queries.iter().map(|q| q.object.clone()).collect();
        let describer = Describer::build(
            self.schema_client.as_ref(),
            &object_names,
            options.default_namespace.as_deref(),
        )
        .await?;

        let mut dumper = DumpOrchestrator::new(
            self.data_client.as_ref(),
            &describer,
            &self.publisher,
            options.max_fetch_size,
        );
        if let Some(id_map) = &options.id_map {
            dumper = dumper.with_id_map(id_map);
        }
        if let Some(cancel) = self.cancel.as_deref() {
            dumper = dumper.with_cancel(cancel);
        }
        let outputs = dumper.dump(queries).await?;
        Ok(outputs)
    }
}
