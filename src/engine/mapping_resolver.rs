// ==========================================
// 业务记录迁移系统 - 映射策略解析器
// ==========================================
// 职责: 按业务键与默认映射解析预存在的目标记录,
//       生成 IdMap 初始条目
// 约束: 已有条目(调用方种子)永不覆盖
// ==========================================

use crate::client::data_client::DataClient;
use crate::domain::dataset::LoadDataset;
use crate::domain::idmap::IdMap;
use crate::domain::mapping::{DefaultMapping, MappingPolicy};
use crate::domain::record::Record;
use crate::engine::describer::Describer;
use crate::engine::error::{MigrationError, MigrationResult};
use crate::engine::soql::{in_condition, SelectStatement};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// 解析器内部查询的取回上限
const RESOLVER_FETCH_SIZE: usize = 10_000;

// ==========================================
// MappingResolver
// ==========================================
pub struct MappingResolver<'a, D: DataClient + ?Sized> {
    data_client: &'a D,
    describer: &'a Describer,
}

impl<'a, D: DataClient + ?Sized> MappingResolver<'a, D> {
    pub fn new(data_client: &'a D, describer: &'a Describer) -> Self {
        Self {
            data_client,
            describer,
        }
    }

    /// 解析全部策略,向 id_map 合并条目
    ///
    /// 不同策略作用于不同对象,条目不会冲突;逐个顺序处理
    pub async fn resolve(
        &self,
        policies: &[MappingPolicy],
        datasets: &[LoadDataset],
        id_map: &mut IdMap,
    ) -> MigrationResult<()> {
        for policy in policies {
            self.resolve_policy(policy, datasets, id_map).await?;
        }
        Ok(())
    }

    async fn resolve_policy(
        &self,
        policy: &MappingPolicy,
        datasets: &[LoadDataset],
        id_map: &mut IdMap,
    ) -> MigrationResult<()> {
        let dataset = find_dataset(datasets, self.describer, &policy.object).ok_or_else(|| {
            MigrationError::UnknownMappingObject {
                object: policy.object.clone(),
            }
        })?;
        let description = self.describer.find_object(&policy.object).ok_or_else(|| {
            MigrationError::SchemaNotFound {
                object: policy.object.clone(),
            }
        })?;
        // 无 id 列(schema 无 id 字段,或数据集缺 id 表头): 本策略直接跳过
        let Some(id_field) = description.id_field() else {
            debug!(object = %policy.object, "对象结构无 id 字段,跳过映射策略");
            return Ok(());
        };
        let Some(id_index) = column_of(dataset, self.describer, &id_field.name) else {
            debug!(object = %policy.object, "数据集无 id 列,跳过映射策略");
            return Ok(());
        };

        // ===== 业务键匹配 =====
        let key_fields = policy.effective_key_fields();
        if !key_fields.is_empty() {
            self.resolve_by_keys(
                policy,
                dataset,
                description.name.as_str(),
                &id_field.name,
                &key_fields,
                id_index,
                id_map,
            )
            .await?;
        }

        // ===== 默认映射 =====
        if let Some(default_mapping) = &policy.default_mapping {
            self.resolve_default(
                default_mapping,
                dataset,
                description.name.as_str(),
                &id_field.name,
                id_index,
                id_map,
            )
            .await?;
        }

        Ok(())
    }

    /// 业务键匹配: 本地键元组与目标实例键元组求交
    async fn resolve_by_keys(
        &self,
        policy: &MappingPolicy,
        dataset: &LoadDataset,
        object_name: &str,
        id_field: &str,
        key_fields: &[String],
        id_index: usize,
        id_map: &mut IdMap,
    ) -> MigrationResult<()> {
        // 键字段 → 规范名与列下标(schema 未知/列缺失时记 None,元组分量为空串)
        let mut canonical_names: Vec<Option<String>> = Vec::new();
        let mut key_columns: Vec<Option<usize>> = Vec::new();
        for key in key_fields {
            let canonical = self
                .describer
                .find_field(&policy.object, key)
                .map(|f| f.name.clone());
            let column = canonical
                .as_deref()
                .and_then(|name| column_of(dataset, self.describer, name));
            canonical_names.push(canonical);
            key_columns.push(column);
        }

        // 本地: keyTuple → sourceId;同时收集逐字段候选值
        let mut local_keys: HashMap<String, String> = HashMap::new();
        let mut value_sets: Vec<HashSet<String>> = vec![HashSet::new(); key_fields.len()];
        for row in &dataset.rows {
            let source_id = row.get(id_index).map(String::as_str).unwrap_or("");
            if source_id.is_empty() {
                continue;
            }
            let tuple = key_tuple_from_row(row, &key_columns);
            for (slot, column) in key_columns.iter().enumerate() {
                if let Some(index) = column {
                    if let Some(cell) = row.get(*index) {
                        if !cell.is_empty() {
                            value_sets[slot].insert(cell.clone());
                        }
                    }
                }
            }
            local_keys.insert(tuple, source_id.to_string());
        }

        let queryable: Vec<(&str, Vec<String>)> = canonical_names
            .iter()
            .zip(&value_sets)
            .filter_map(|(name, values)| {
                let name = name.as_deref()?;
                if values.is_empty() {
                    return None;
                }
                let mut sorted: Vec<String> = values.iter().cloned().collect();
                sorted.sort();
                Some((name, sorted))
            })
            .collect();
        if queryable.is_empty() {
            return Ok(());
        }

        // 目标实例: SELECT Id, K1..Kn FROM O WHERE K1 IN (…) AND …
        let mut select_fields = vec![id_field.to_string()];
        select_fields.extend(queryable.iter().map(|(name, _)| name.to_string()));
        let condition = queryable
            .iter()
            .map(|(name, values)| in_condition(name, values))
            .collect::<Vec<_>>()
            .join(" AND ");
        let soql = SelectStatement {
            fields: &select_fields,
            object: object_name,
            condition: Some(&condition),
            ..Default::default()
        }
        .to_soql();

        let remote_records = self
            .data_client
            .query(&soql, RESOLVER_FETCH_SIZE)
            .await?;

        // 目标: keyTuple → targetId(同一元组配方)
        let mut remote_keys: HashMap<String, String> = HashMap::new();
        for record in &remote_records {
            let Some(target_id) = record_cell(record, id_field) else {
                continue;
            };
            let tuple = key_tuple_from_record(record, &canonical_names);
            remote_keys.insert(tuple, target_id);
        }

        let mut matched = 0usize;
        for (tuple, source_id) in &local_keys {
            if let Some(target_id) = remote_keys.get(tuple) {
                if id_map.insert(source_id.clone(), target_id.clone()) {
                    matched += 1;
                }
            }
        }
        info!(
            object = %object_name,
            key_fields = ?key_fields,
            matched,
            "业务键匹配完成"
        );
        Ok(())
    }

    /// 默认映射: 未命中业务键的源 Id 统一落到兜底目标
    async fn resolve_default(
        &self,
        default_mapping: &DefaultMapping,
        dataset: &LoadDataset,
        object_name: &str,
        id_field: &str,
        id_index: usize,
        id_map: &mut IdMap,
    ) -> MigrationResult<()> {
        let target_id = match default_mapping {
            DefaultMapping::Literal(id) => Some(id.clone()),
            DefaultMapping::Picker(picker) => {
                let fields = vec![id_field.to_string()];
                let soql = SelectStatement {
                    fields: &fields,
                    object: object_name,
                    condition: picker.condition.as_deref(),
                    orderby: picker.orderby.as_deref(),
                    limit: Some(1),
                    offset: picker.offset,
                    ..Default::default()
                }
                .to_soql();
                let records = self.data_client.query(&soql, 1).await?;
                records.first().and_then(|r| record_cell(r, id_field))
            }
        };

        let Some(target_id) = target_id else {
            debug!(object = %object_name, "默认映射未选出目标记录,跳过");
            return Ok(());
        };

        let mut fallback = 0usize;
        for row in &dataset.rows {
            let source_id = row.get(id_index).map(String::as_str).unwrap_or("");
            if source_id.is_empty() {
                continue;
            }
            if id_map.insert(source_id.to_string(), target_id.clone()) {
                fallback += 1;
            }
        }
        info!(object = %object_name, target_id = %target_id, fallback, "默认映射完成");
        Ok(())
    }
}

// ==========================================
// 内部辅助
// ==========================================

/// 在数据集中按对象名查找(大小写/命名空间宽容)
fn find_dataset<'d>(
    datasets: &'d [LoadDataset],
    describer: &Describer,
    object: &str,
) -> Option<&'d LoadDataset> {
    let wanted = describer
        .find_object(object)
        .map(|d| d.name.to_ascii_lowercase())
        .unwrap_or_else(|| object.to_ascii_lowercase());
    datasets.iter().find(|d| {
        let got = describer
            .find_object(&d.object)
            .map(|desc| desc.name.to_ascii_lowercase())
            .unwrap_or_else(|| d.object.to_ascii_lowercase());
        got == wanted
    })
}

/// 字段名对应的表头列下标
fn column_of(dataset: &LoadDataset, describer: &Describer, field_name: &str) -> Option<usize> {
    let wanted = describer
        .find_field(&dataset.object, field_name)
        .map(|f| f.name.to_ascii_lowercase())?;
    dataset.headers.iter().position(|h| {
        describer
            .find_field(&dataset.object, h)
            .map(|f| f.name.to_ascii_lowercase() == wanted)
            .unwrap_or(false)
    })
}

/// 行的键元组: 各键列值按 "\t" 拼接后 trim(缺失列记空串)
fn key_tuple_from_row(row: &[String], key_columns: &[Option<usize>]) -> String {
    key_columns
        .iter()
        .map(|column| match column {
            Some(index) => row.get(*index).map(String::as_str).unwrap_or(""),
            None => "",
        })
        .collect::<Vec<_>>()
        .join("\t")
        .trim()
        .to_string()
}

/// 记录的键元组(同一配方)
fn key_tuple_from_record(record: &Record, canonical_names: &[Option<String>]) -> String {
    canonical_names
        .iter()
        .map(|name| match name {
            Some(name) => record_cell(record, name).unwrap_or_default(),
            None => String::new(),
        })
        .collect::<Vec<_>>()
        .join("\t")
        .trim()
        .to_string()
}

/// 记录取值(键大小写不敏感),转为单元格字符串
fn record_cell(record: &Record, field: &str) -> Option<String> {
    record
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(field))
        .map(|(_, value)| value.to_cell())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::error::ClientError;
    use crate::client::schema_client::SchemaClient;
    use crate::domain::describe::{FieldDescription, ObjectDescription};
    use crate::domain::types::{CreateResult, FieldType};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubSchemaClient;

    #[async_trait]
    impl SchemaClient for StubSchemaClient {
        async fn describe(
            &self,
            object: &str,
        ) -> Result<Option<ObjectDescription>, ClientError> {
            match object.to_ascii_lowercase().as_str() {
                // 无 id 字段的对象(设置类对象)
                "appsetting" => Ok(Some(ObjectDescription::new(
                    "AppSetting",
                    vec![FieldDescription::new("Name", FieldType::Text)],
                ))),
                "account" => Ok(Some(ObjectDescription::new(
                    "Account",
                    vec![
                        FieldDescription::new("Id", FieldType::Id),
                        FieldDescription::new("Name", FieldType::Text),
                    ],
                ))),
                _ => Ok(None),
            }
        }
    }

    // 记录查询次数的 Data Client: 跳过路径不得发出任何查询
    struct CountingDataClient {
        query_count: AtomicUsize,
    }

    #[async_trait]
    impl DataClient for CountingDataClient {
        async fn query(
            &self,
            _soql: &str,
            _max_fetch_size: usize,
        ) -> Result<Vec<Record>, ClientError> {
            self.query_count.fetch_add(1, Ordering::Relaxed);
            Ok(Vec::new())
        }

        async fn create(
            &self,
            _object: &str,
            _records: &[Record],
        ) -> Result<Vec<CreateResult>, ClientError> {
            unreachable!("解析器不调用 create")
        }
    }

    #[tokio::test]
    async fn test_policy_on_object_without_id_field_is_skipped() {
        let describer = crate::engine::describer::Describer::build(
            &StubSchemaClient,
            &["AppSetting".to_string()],
            None,
        )
        .await
        .expect("构建 Describer 失败");
        let datasets = vec![LoadDataset::new(
            "AppSetting",
            vec!["Name".to_string()],
            vec![vec!["夜间模式".to_string()]],
        )];
        let policies: Vec<MappingPolicy> =
            vec![serde_json::from_str(r#"{"object":"AppSetting","keyField":"Name"}"#).unwrap()];
        let client = CountingDataClient {
            query_count: AtomicUsize::new(0),
        };

        let mut id_map = IdMap::new();
        MappingResolver::new(&client, &describer)
            .resolve(&policies, &datasets, &mut id_map)
            .await
            .expect("无 id 字段的对象应跳过而非报错");

        assert!(id_map.is_empty());
        assert_eq!(client.query_count.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_policy_on_dataset_without_id_header_is_skipped() {
        let describer = crate::engine::describer::Describer::build(
            &StubSchemaClient,
            &["Account".to_string()],
            None,
        )
        .await
        .expect("构建 Describer 失败");
        // 数据集缺 Id 表头: 同样跳过
        let datasets = vec![LoadDataset::new(
            "Account",
            vec!["Name".to_string()],
            vec![vec!["Account 01".to_string()]],
        )];
        let policies: Vec<MappingPolicy> =
            vec![serde_json::from_str(r#"{"object":"Account","keyField":"Name"}"#).unwrap()];
        let client = CountingDataClient {
            query_count: AtomicUsize::new(0),
        };

        let mut id_map = IdMap::new();
        MappingResolver::new(&client, &describer)
            .resolve(&policies, &datasets, &mut id_map)
            .await
            .expect("缺 id 表头的数据集应跳过而非报错");

        assert!(id_map.is_empty());
        assert_eq!(client.query_count.load(Ordering::Relaxed), 0);
    }
}
