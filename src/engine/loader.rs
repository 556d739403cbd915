// ==========================================
// 业务记录迁移系统 - 装载不动点驱动
// ==========================================
// 职责: 循环 {分类 → 转换 → 批量创建 → 合并新 Id → 进度},
//       直至一轮无可上传行(不动点)
// 不变式: IdMap 单调增长;本轮新 Id 下一轮才可见;
//         create 返回与请求按位置对应
// ==========================================

use crate::client::data_client::DataClient;
use crate::client::error::ClientError;
use crate::domain::dataset::{LoadDataset, RecordIdPair};
use crate::domain::idmap::IdMap;
use crate::domain::record::Record;
use crate::domain::status::{
    BlockedRecord, FailedRecord, LoadProgress, MappedRecord, UploadStatus, UploadedRecord,
};
use crate::engine::classifier::classify_rows;
use crate::engine::converter::convert_row;
use crate::engine::describer::Describer;
use crate::engine::error::MigrationResult;
use crate::engine::events::{OptionalProgressPublisher, ProgressEvent};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

// ==========================================
// LoadOrchestrator - 装载驱动
// ==========================================
pub struct LoadOrchestrator<'a, D: DataClient + ?Sized> {
    data_client: &'a D,
    describer: &'a Describer,
    publisher: &'a OptionalProgressPublisher,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, D: DataClient + ?Sized> LoadOrchestrator<'a, D> {
    pub fn new(
        data_client: &'a D,
        describer: &'a Describer,
        publisher: &'a OptionalProgressPublisher,
    ) -> Self {
        Self {
            data_client,
            describer,
            publisher,
            cancel: None,
        }
    }

    /// 配置取消信号(轮与轮之间为取消点)
    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// 执行装载直至不动点
    ///
    /// # 参数
    /// - datasets: 装载数据集(被破坏性收缩: 行逐轮移入上传/等待)
    /// - id_map: IdMap 种子(调用方种子 + 映射策略解析结果)
    /// - target_ids: 目标集种子(空集表示全量)
    ///
    /// # 流程(每轮)
    /// 1. 按稳定顺序逐数据集分类,收集全部待上传记录
    /// 2. 无任何待上传 → 不动点,等待行定格为 blocked,返回
    /// 3. 逐对象整批 create,按位置合并逐条结果
    /// 4. 成功条目写入 IdMap(下一轮可见),发布进度
    pub async fn upload(
        &self,
        mut datasets: Vec<LoadDataset>,
        id_map: IdMap,
        target_ids: HashSet<String>,
    ) -> MigrationResult<UploadStatus> {
        let total_count: usize = datasets.iter().map(|d| d.rows.len()).sum();
        let mut id_map = id_map;
        let mut target_ids = target_ids;
        let mut status = UploadStatus::new(total_count, IdMap::new());
        let mut last_waitings: Vec<BlockedRecord> = Vec::new();
        let mut pass_no = 0usize;

        info!(
            dataset_count = datasets.len(),
            total_count,
            seed_map_size = id_map.len(),
            "开始装载"
        );

        loop {
            pass_no += 1;

            // ===== 取消点 =====
            if self.is_cancelled() {
                warn!(pass = pass_no, "装载被取消,返回部分状态");
                status.blocked = last_waitings;
                status.id_map = id_map;
                return Ok(status);
            }

            // ==========================================
            // 步骤1: 分类与转换(整轮收集后再发创建)
            // ==========================================
            let mut uploadings: Vec<(String, Vec<RecordIdPair>)> = Vec::new();
            let mut blocked_this_pass: Vec<BlockedRecord> = Vec::new();

            for dataset in datasets.iter_mut() {
                let outcome =
                    classify_rows(dataset, self.describer, &id_map, &mut target_ids)?;

                let mut pairs = Vec::with_capacity(outcome.uploadables.len());
                for row in &outcome.uploadables {
                    pairs.push(convert_row(
                        &dataset.object,
                        &dataset.headers,
                        row,
                        self.describer,
                        &id_map,
                    )?);
                }
                if !pairs.is_empty() {
                    uploadings.push((dataset.object.clone(), pairs));
                }

                for orig_id in outcome.not_loadables {
                    status.already_mapped.push(MappedRecord {
                        object: dataset.object.clone(),
                        orig_id,
                    });
                }

                // 等待行回填为下一轮输入
                dataset.rows = outcome.waitings.iter().map(|w| w.row.clone()).collect();
                blocked_this_pass.extend(outcome.waitings.into_iter().map(|w| BlockedRecord {
                    object: dataset.object.clone(),
                    orig_id: w.orig_id,
                    blocking_field: w.blocking_field,
                    blocking_id: w.blocking_id,
                }));
            }

            // ==========================================
            // 步骤2: 不动点判定(一轮无产出即终止)
            // ==========================================
            if uploadings.is_empty() {
                status.blocked = blocked_this_pass;
                status.id_map = id_map;
                info!(
                    pass = pass_no,
                    success_count = status.successes.len(),
                    failure_count = status.failures.len(),
                    blocked_count = status.blocked.len(),
                    "装载达到不动点"
                );
                return Ok(status);
            }

            // ==========================================
            // 步骤3: 逐对象整批创建,按位置合并结果
            // ==========================================
            for (object, pairs) in uploadings {
                let records: Vec<Record> = pairs.iter().map(|p| p.record.clone()).collect();
                debug!(object = %object, batch_size = records.len(), pass = pass_no, "提交批量创建");

                let results = self.data_client.create(&object, &records).await?;
                if results.len() != pairs.len() {
                    return Err(ClientError::CreateFailed {
                        object: object.clone(),
                        reason: format!(
                            "返回 {} 条与请求 {} 条不一致",
                            results.len(),
                            pairs.len()
                        ),
                    }
                    .into());
                }

                for (pair, result) in pairs.into_iter().zip(results) {
                    if result.success {
                        let new_id = result.id.unwrap_or_default();
                        id_map.insert(pair.orig_id.clone(), new_id.clone());
                        status.successes.push(UploadedRecord {
                            object: object.clone(),
                            orig_id: pair.orig_id,
                            new_id,
                        });
                    } else {
                        status.failures.push(FailedRecord {
                            object: object.clone(),
                            orig_id: pair.orig_id,
                            errors: result.errors,
                        });
                    }
                }
            }

            last_waitings = blocked_this_pass;

            // ==========================================
            // 步骤4: 发布进度
            // ==========================================
            self.publisher.publish(ProgressEvent::Load(LoadProgress {
                total_count,
                success_count: status.successes.len(),
                failure_count: status.failures.len(),
            }));
            info!(
                pass = pass_no,
                success_count = status.successes.len(),
                failure_count = status.failures.len(),
                waiting_count = last_waitings.len(),
                "装载轮完成"
            );
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}
