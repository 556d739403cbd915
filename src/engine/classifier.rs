// ==========================================
// 业务记录迁移系统 - 行分类器
// ==========================================
// 职责: 按当前 IdMap 与目标集把数据行划分为
//       可上传 / 等待 / 已映射 三类
// 红线: 每行只记录"首个"未解析引用作为阻塞说明
// ==========================================

use crate::domain::dataset::{LoadDataset, WaitingRow};
use crate::domain::idmap::IdMap;
use crate::domain::types::FieldType;
use crate::engine::describer::Describer;
use crate::engine::error::{MigrationError, MigrationResult};
use std::collections::HashSet;
use tracing::debug;

// ==========================================
// ClassifyOutcome - 分类结果
// ==========================================
#[derive(Debug, Default)]
pub struct ClassifyOutcome {
    /// 本轮可上传的行
    pub uploadables: Vec<Vec<String>>,
    /// 等待行(存在未解析引用,或尚未进入目标集)
    pub waitings: Vec<WaitingRow>,
    /// 已映射而跳过的源 Id(装载开始前已在 IdMap 中)
    pub not_loadables: Vec<String>,
}

/// 对单个数据集执行行分类
///
/// # 参数
/// - dataset: 装载数据集(本函数不修改,由装载驱动收缩 rows)
/// - describer: 对象结构缓存
/// - id_map: 当前 ID 翻译映射
/// - target_ids: 目标集(空集表示全量装载);沿引用边双向传播,原地扩张
///
/// # 目标集传播
/// - 引用指向目标集内的记录 → 本行被拉入目标集
/// - 本行在目标集内 → 引用目标被拉入目标集
///
/// 已映射行在引用遍历之前移出,不参与传播
pub fn classify_rows(
    dataset: &LoadDataset,
    describer: &Describer,
    id_map: &IdMap,
    target_ids: &mut HashSet<String>,
) -> MigrationResult<ClassifyOutcome> {
    let columns = resolve_columns(dataset, describer)?;
    let mut outcome = ClassifyOutcome::default();

    for row in &dataset.rows {
        let id = row.get(columns.id_index).cloned().unwrap_or_default();

        // 已映射: 直接跳过,不参与目标集传播
        if id_map.contains(&id) {
            outcome.not_loadables.push(id);
            continue;
        }

        let mut uploadable = target_ids.is_empty() || target_ids.contains(&id);
        let mut blocking: Option<(String, String)> = None;

        for (index, field_name) in &columns.reference_columns {
            let ref_id = match row.get(*index) {
                Some(cell) if !cell.is_empty() => cell.as_str(),
                _ => continue,
            };

            // 目标集传播(有意双向: 父拉子,子拉父)
            if target_ids.contains(ref_id) {
                target_ids.insert(id.clone());
            } else if target_ids.contains(&id) {
                target_ids.insert(ref_id.to_string());
            }

            if !id_map.contains(ref_id) {
                uploadable = false;
                if blocking.is_none() {
                    blocking = Some((field_name.clone(), ref_id.to_string()));
                }
            }
        }

        if uploadable {
            outcome.uploadables.push(row.clone());
        } else {
            let (blocking_field, blocking_id) = match blocking {
                Some((f, v)) => (Some(f), Some(v)),
                None => (None, None),
            };
            outcome.waitings.push(WaitingRow {
                orig_id: id,
                row: row.clone(),
                blocking_field,
                blocking_id,
            });
        }
    }

    debug!(
        object = %dataset.object,
        uploadable_count = outcome.uploadables.len(),
        waiting_count = outcome.waitings.len(),
        mapped_count = outcome.not_loadables.len(),
        "行分类完成"
    );
    Ok(outcome)
}

// ==========================================
// 列解析
// ==========================================

struct ResolvedColumns {
    id_index: usize,
    // (列下标, 字段名);仅统计引用目标在 Describer 中可见的引用列
    reference_columns: Vec<(usize, String)>,
}

fn resolve_columns(
    dataset: &LoadDataset,
    describer: &Describer,
) -> MigrationResult<ResolvedColumns> {
    let mut id_index = None;
    let mut reference_columns = Vec::new();

    for (index, header) in dataset.headers.iter().enumerate() {
        let Some(field) = describer.find_field(&dataset.object, header) else {
            continue; // 未知表头: 跳过
        };
        match field.field_type {
            FieldType::Id => {
                if id_index.is_none() {
                    id_index = Some(index);
                }
            }
            FieldType::Reference => {
                if field
                    .reference_to
                    .iter()
                    .any(|target| describer.knows_object(target))
                {
                    reference_columns.push((index, field.name.clone()));
                }
            }
            _ => {}
        }
    }

    let id_index = id_index.ok_or_else(|| MigrationError::MissingIdColumn {
        object: dataset.object.clone(),
    })?;
    Ok(ResolvedColumns {
        id_index,
        reference_columns,
    })
}
