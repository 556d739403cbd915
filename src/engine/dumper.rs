// ==========================================
// 业务记录迁移系统 - 导出不动点驱动
// ==========================================
// 职责: 从种子查询出发,交替执行关联扩展(入边)与
//       依赖扩展(出边),直至闭包;输出逐查询 CSV
// 不变式: 每条记录至多进入逐对象集合一次,
//         取回总数单调增长,一整轮零增长即终止
// ==========================================

use crate::client::data_client::DataClient;
use crate::domain::idmap::IdMap;
use crate::domain::query::DumpQuery;
use crate::domain::record::{FieldValue, Record};
use crate::domain::status::DumpProgress;
use crate::domain::types::{FieldType, QueryTarget};
use crate::engine::describer::Describer;
use crate::engine::error::{MigrationError, MigrationResult};
use crate::engine::events::{OptionalProgressPublisher, ProgressEvent};
use crate::engine::namespace;
use crate::engine::soql::{in_condition, SelectStatement};
use crate::csvio;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

// ==========================================
// DumpOrchestrator - 导出驱动
// ==========================================
pub struct DumpOrchestrator<'a, D: DataClient + ?Sized> {
    data_client: &'a D,
    describer: &'a Describer,
    publisher: &'a OptionalProgressPublisher,
    max_fetch_size: usize,
    reverse_id_map: Option<HashMap<String, String>>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, D: DataClient + ?Sized> DumpOrchestrator<'a, D> {
    pub fn new(
        data_client: &'a D,
        describer: &'a Describer,
        publisher: &'a OptionalProgressPublisher,
        max_fetch_size: usize,
    ) -> Self {
        Self {
            data_client,
            describer,
            publisher,
            max_fetch_size,
            reverse_id_map: None,
            cancel: None,
        }
    }

    /// 配置 ID 反写映射(往返场景: 目标 Id 改写回源 Id)
    pub fn with_id_map(mut self, id_map: &IdMap) -> Self {
        self.reverse_id_map = Some(id_map.reversed());
        self
    }

    /// 配置取消信号(阶段之间为取消点)
    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// 执行导出,按输入顺序返回逐查询 CSV 文本
    pub async fn dump(&self, queries: &[DumpQuery]) -> MigrationResult<Vec<String>> {
        let plans = self.build_plans(queries)?;
        let mut fetched: HashMap<String, FetchedSet> = HashMap::new();
        for plan in &plans {
            fetched.entry(plan.object_key.clone()).or_default();
        }

        // ==========================================
        // 阶段S: 种子查询
        // ==========================================
        let mut new_prev: HashMap<String, Vec<String>> = HashMap::new();
        for plan in plans.iter().filter(|p| p.is_seed) {
            let soql = SelectStatement {
                fields: &plan.fields,
                object: &plan.object_name,
                scope: plan.query.scope.as_deref(),
                condition: plan.query.condition.as_deref(),
                orderby: plan.query.orderby.as_deref(),
                limit: plan.query.limit,
                offset: plan.query.offset,
            }
            .to_soql();
            debug!(soql = %soql, "执行种子查询");
            let records = self.data_client.query(&soql, self.max_fetch_size).await?;
            let set = fetched.get_mut(&plan.object_key).expect("集合已预置");
            let added = set.absorb(records, plan.id_field.as_deref());
            new_prev.entry(plan.object_key.clone()).or_default().extend(added);
        }
        self.publish_progress(&plans, &fetched);

        // ==========================================
        // 阶段L: 闭包循环(关联扩展 → 依赖扩展)
        // ==========================================
        let related_plans: Vec<&QueryPlan> = plans.iter().filter(|p| !p.is_seed).collect();
        let mut round = 0usize;
        loop {
            round += 1;
            if self.is_cancelled() {
                warn!(round, "导出被取消,输出部分结果");
                break;
            }

            let before: usize = fetched.values().map(|s| s.records.len()).sum();
            let mut new_curr: HashMap<String, Vec<String>> = HashMap::new();

            // ===== 关联扩展: 引用指向上一轮新增记录的行 =====
            for plan in &related_plans {
                let mut parts = Vec::new();
                for (field_name, reference_to) in &plan.reference_fields {
                    let mut ids: Vec<String> = Vec::new();
                    let mut seen: HashSet<&str> = HashSet::new();
                    for target in reference_to {
                        if let Some(key) = self.object_key_of(target) {
                            if let Some(new_ids) = new_prev.get(&key) {
                                for id in new_ids {
                                    if seen.insert(id.as_str()) {
                                        ids.push(id.clone());
                                    }
                                }
                            }
                        }
                    }
                    if !ids.is_empty() {
                        parts.push(in_condition(field_name, &ids));
                    }
                }
                if parts.is_empty() {
                    continue;
                }
                let condition = parts.join(" OR ");
                let soql = SelectStatement {
                    fields: &plan.fields,
                    object: &plan.object_name,
                    condition: Some(&condition),
                    ..Default::default()
                }
                .to_soql();
                debug!(soql = %soql, round, "执行关联扩展查询");
                let records = self.data_client.query(&soql, self.max_fetch_size).await?;
                let set = fetched.get_mut(&plan.object_key).expect("集合已预置");
                let added = set.absorb(records, plan.id_field.as_deref());
                new_curr.entry(plan.object_key.clone()).or_default().extend(added);
            }
            self.publish_progress(&plans, &fetched);

            // ===== 依赖扩展: 已取回记录的出边引用目标 =====
            for plan in &related_plans {
                let Some(id_field) = plan.id_field.as_deref() else {
                    continue;
                };
                let wanted = self.collect_wanted_ids(plan, &plans, &fetched);
                if wanted.is_empty() {
                    continue;
                }
                let condition = in_condition(id_field, &wanted);
                let soql = SelectStatement {
                    fields: &plan.fields,
                    object: &plan.object_name,
                    condition: Some(&condition),
                    ..Default::default()
                }
                .to_soql();
                debug!(soql = %soql, round, "执行依赖扩展查询");
                let records = self.data_client.query(&soql, self.max_fetch_size).await?;
                let set = fetched.get_mut(&plan.object_key).expect("集合已预置");
                let added = set.absorb(records, plan.id_field.as_deref());
                new_curr.entry(plan.object_key.clone()).or_default().extend(added);
            }
            self.publish_progress(&plans, &fetched);

            let after: usize = fetched.values().map(|s| s.records.len()).sum();
            if after == before {
                info!(round, fetched_count = after, "导出闭包完成");
                break;
            }
            new_prev = new_curr;
        }

        // ==========================================
        // 输出: 逐查询 CSV(列=字段选择,Id/引用列可反写)
        // ==========================================
        let mut outputs = Vec::with_capacity(plans.len());
        for plan in &plans {
            let set = fetched.get(&plan.object_key).expect("集合已预置");
            outputs.push(self.render_csv(plan, &set.records));
        }
        Ok(outputs)
    }

    // ==========================================
    // 查询计划
    // ==========================================

    fn build_plans<'q>(&self, queries: &'q [DumpQuery]) -> MigrationResult<Vec<QueryPlan<'q>>> {
        let mut plans = Vec::with_capacity(queries.len());
        for query in queries {
            let description = self.describer.find_object(&query.object).ok_or_else(|| {
                MigrationError::SchemaNotFound {
                    object: query.object.clone(),
                }
            })?;

            // 字段选择: fields 优先,其次全字段减 ignore_fields,否则全字段
            let fields: Vec<String> = if let Some(fields) = &query.fields {
                fields.to_vec()
            } else if let Some(ignore) = &query.ignore_fields {
                let ignored = ignore.to_vec();
                description
                    .fields
                    .iter()
                    .map(|f| f.name.clone())
                    .filter(|name| {
                        !namespace::slice_contains(
                            &ignored,
                            name,
                            self.describer.default_namespace(),
                        )
                    })
                    .collect()
            } else {
                description.field_names()
            };

            let reference_fields: Vec<(String, Vec<String>)> = description
                .fields
                .iter()
                .filter(|f| f.field_type == FieldType::Reference)
                .map(|f| (f.name.clone(), f.reference_to.clone()))
                .collect();

            plans.push(QueryPlan {
                query,
                is_seed: query.target == QueryTarget::Query,
                object_name: description.name.clone(),
                object_key: description.name.to_ascii_lowercase(),
                id_field: description.id_field().map(|f| f.name.clone()),
                fields,
                reference_fields,
            });
        }
        Ok(plans)
    }

    /// 对象名 → 集合键(经 Describer 解析规范名)
    fn object_key_of(&self, name: &str) -> Option<String> {
        self.describer
            .find_object(name)
            .map(|d| d.name.to_ascii_lowercase())
    }

    /// 依赖扩展的待取 Id: 任意已取回记录指向本对象、但尚未取回的引用值
    fn collect_wanted_ids(
        &self,
        plan: &QueryPlan<'_>,
        plans: &[QueryPlan<'_>],
        fetched: &HashMap<String, FetchedSet>,
    ) -> Vec<String> {
        let own_ids = &fetched.get(&plan.object_key).expect("集合已预置").ids;
        let mut wanted = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for source_plan in plans {
            let Some(set) = fetched.get(&source_plan.object_key) else {
                continue;
            };
            // 指向本对象的引用字段
            let pointing: Vec<&str> = source_plan
                .reference_fields
                .iter()
                .filter(|(_, reference_to)| {
                    reference_to
                        .iter()
                        .any(|t| self.object_key_of(t).as_deref() == Some(&plan.object_key))
                })
                .map(|(name, _)| name.as_str())
                .collect();
            if pointing.is_empty() {
                continue;
            }
            for record in &set.records {
                for field in &pointing {
                    let Some(value) = self.record_cell(record, field) else {
                        continue;
                    };
                    let Some(id) = value.as_id() else {
                        continue;
                    };
                    if !own_ids.contains(id) && seen.insert(id.to_string()) {
                        wanted.push(id.to_string());
                    }
                }
            }
        }
        wanted
    }

    // ==========================================
    // 输出与进度
    // ==========================================

    fn render_csv(&self, plan: &QueryPlan<'_>, records: &[Record]) -> String {
        let column_types: Vec<Option<FieldType>> = plan
            .fields
            .iter()
            .map(|f| {
                self.describer
                    .find_field(&plan.object_name, f)
                    .map(|d| d.field_type)
            })
            .collect();

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let mut cells = Vec::with_capacity(plan.fields.len());
            for (field, field_type) in plan.fields.iter().zip(&column_types) {
                let mut cell = self
                    .record_cell(record, field)
                    .map(FieldValue::to_cell)
                    .unwrap_or_default();
                // 往返场景: Id/引用列反写回源 Id
                if let (Some(reverse), Some(t)) = (&self.reverse_id_map, field_type) {
                    if matches!(t, FieldType::Id | FieldType::Reference) {
                        if let Some(source_id) = reverse.get(&cell) {
                            cell = source_id.clone();
                        }
                    }
                }
                cells.push(cell);
            }
            rows.push(cells);
        }
        csvio::write_csv(&plan.fields, &rows)
    }

    /// 记录取值(大小写不敏感,命名空间宽容)
    fn record_cell<'r>(&self, record: &'r Record, field: &str) -> Option<&'r FieldValue> {
        if let Some(value) = record
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(field))
            .map(|(_, v)| v)
        {
            return Some(value);
        }
        let ns = self.describer.default_namespace()?;
        let stripped = namespace::strip_namespace(field, ns);
        if stripped != field {
            if let Some(value) = record
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(stripped))
                .map(|(_, v)| v)
            {
                return Some(value);
            }
        }
        let added = namespace::add_namespace(field, ns);
        if added != field {
            return record
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(&added))
                .map(|(_, v)| v);
        }
        None
    }

    fn publish_progress(&self, plans: &[QueryPlan<'_>], fetched: &HashMap<String, FetchedSet>) {
        let mut per_object = BTreeMap::new();
        for plan in plans {
            if let Some(set) = fetched.get(&plan.object_key) {
                per_object.insert(plan.object_name.clone(), set.records.len());
            }
        }
        let fetched_count = per_object.values().sum();
        self.publisher.publish(ProgressEvent::Dump(DumpProgress {
            fetched_count,
            fetched_count_per_object: per_object,
        }));
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

// ==========================================
// 内部结构
// ==========================================

struct QueryPlan<'q> {
    query: &'q DumpQuery,
    is_seed: bool,
    object_name: String,            // 规范对象名(FROM 子句)
    object_key: String,             // 小写规范名(集合键)
    id_field: Option<String>,       // id 字段名(去重依据)
    fields: Vec<String>,            // 输出/查询字段列表
    reference_fields: Vec<(String, Vec<String>)>, // (字段名, referenceTo)
}

/// 逐对象取回集合(按 Id 去重)
#[derive(Default)]
struct FetchedSet {
    ids: HashSet<String>,
    records: Vec<Record>,
}

impl FetchedSet {
    /// 吸收一批记录,返回新增 Id 列表
    ///
    /// 无 id 字段可依据时不去重(记录直接计入,无 Id 贡献)
    fn absorb(&mut self, records: Vec<Record>, id_field: Option<&str>) -> Vec<String> {
        let mut added = Vec::new();
        for record in records {
            let id = id_field.and_then(|f| {
                record
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(f))
                    .and_then(|(_, v)| v.as_id())
                    .map(str::to_string)
            });
            match id {
                Some(id) => {
                    if self.ids.insert(id.clone()) {
                        self.records.push(record);
                        added.push(id);
                    }
                }
                None => self.records.push(record),
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::error::ClientError;
    use crate::client::schema_client::SchemaClient;
    use crate::domain::describe::{FieldDescription, ObjectDescription};
    use crate::domain::types::CreateResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ==========================================
    // 测试用脚本化 Data Client
    // ==========================================
    // 按子串匹配查询文本,返回预置记录;未匹配返回空集
    struct ScriptedDataClient {
        scripts: Vec<(&'static str, Vec<Record>)>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DataClient for ScriptedDataClient {
        async fn query(
            &self,
            soql: &str,
            _max_fetch_size: usize,
        ) -> Result<Vec<Record>, ClientError> {
            self.queries.lock().unwrap().push(soql.to_string());
            for (pattern, records) in &self.scripts {
                if soql.contains(pattern) {
                    return Ok(records.clone());
                }
            }
            Ok(Vec::new())
        }

        async fn create(
            &self,
            _object: &str,
            _records: &[Record],
        ) -> Result<Vec<CreateResult>, ClientError> {
            unreachable!("导出不调用 create")
        }
    }

    struct GraphSchemaClient;

    #[async_trait]
    impl SchemaClient for GraphSchemaClient {
        async fn describe(
            &self,
            object: &str,
        ) -> Result<Option<ObjectDescription>, ClientError> {
            match object.to_ascii_lowercase().as_str() {
                "account" => Ok(Some(ObjectDescription::new(
                    "Account",
                    vec![
                        FieldDescription::new("Id", FieldType::Id),
                        FieldDescription::new("Name", FieldType::Text),
                    ],
                ))),
                "contact" => Ok(Some(ObjectDescription::new(
                    "Contact",
                    vec![
                        FieldDescription::new("Id", FieldType::Id),
                        FieldDescription::reference("AccountId", vec!["Account".to_string()]),
                        FieldDescription::reference("OwnerId", vec!["User".to_string()]),
                    ],
                ))),
                "user" => Ok(Some(ObjectDescription::new(
                    "User",
                    vec![
                        FieldDescription::new("Id", FieldType::Id),
                        FieldDescription::new("Name", FieldType::Text),
                    ],
                ))),
                _ => Ok(None),
            }
        }
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::Text(v.to_string())))
            .collect()
    }

    #[tokio::test]
    async fn test_closure_related_then_dependent() {
        let describer = Describer::build(
            &GraphSchemaClient,
            &[
                "Account".to_string(),
                "Contact".to_string(),
                "User".to_string(),
            ],
            None,
        )
        .await
        .expect("构建失败");

        let client = ScriptedDataClient {
            scripts: vec![
                // 种子: Account 全量
                (
                    "FROM Account WHERE Name",
                    vec![record(&[("Id", "A1"), ("Name", "账户01")])],
                ),
                // 关联: Contact 被 A1 拉入
                (
                    "FROM Contact WHERE AccountId IN ('A1')",
                    vec![record(&[("Id", "C1"), ("AccountId", "A1"), ("OwnerId", "U1")])],
                ),
                // 依赖: C1 的 OwnerId 指向 U1
                (
                    "FROM User WHERE Id IN ('U1')",
                    vec![record(&[("Id", "U1"), ("Name", "用户01")])],
                ),
                // 第二轮关联: OwnerId IN ('U1') 只会重复取回 C1
                (
                    "FROM Contact WHERE OwnerId IN ('U1')",
                    vec![record(&[("Id", "C1"), ("AccountId", "A1"), ("OwnerId", "U1")])],
                ),
            ],
            queries: Mutex::new(Vec::new()),
        };

        let publisher = OptionalProgressPublisher::none();
        let orchestrator = DumpOrchestrator::new(&client, &describer, &publisher, 10_000);

        let mut seed = DumpQuery::seed("Account");
        seed.condition = Some("Name = '账户01'".to_string());
        let queries = vec![
            seed,
            DumpQuery::related("Contact"),
            DumpQuery::related("User"),
        ];

        let outputs = orchestrator.dump(&queries).await.expect("导出失败");
        assert_eq!(outputs.len(), 3);

        // Account CSV
        assert!(outputs[0].contains("A1"));
        assert!(outputs[0].contains("账户01"));
        // Contact CSV: C1 仅出现一次(去重)
        assert_eq!(outputs[1].matches("C1").count(), 1);
        // User CSV: 依赖扩展取回 U1
        assert!(outputs[2].contains("U1"));

        // 闭包不变式: 已取回 Contact 的引用目标均已取回
        assert!(outputs[1].contains("A1"));
        assert!(outputs[2].contains("U1"));
    }

    #[tokio::test]
    async fn test_reverse_id_rewrite() {
        let describer = Describer::build(&GraphSchemaClient, &["Account".to_string()], None)
            .await
            .expect("构建失败");
        let client = ScriptedDataClient {
            scripts: vec![(
                "FROM Account",
                vec![record(&[("Id", "REC-a1"), ("Name", "账户01")])],
            )],
            queries: Mutex::new(Vec::new()),
        };

        let id_map = IdMap::from_pairs([("A1", "REC-a1")]);
        let publisher = OptionalProgressPublisher::none();
        let orchestrator =
            DumpOrchestrator::new(&client, &describer, &publisher, 10_000).with_id_map(&id_map);

        let outputs = orchestrator
            .dump(&[DumpQuery::seed("Account")])
            .await
            .expect("导出失败");
        // Id 列被反写回源 Id
        assert!(outputs[0].contains("A1"));
        assert!(!outputs[0].contains("REC-a1"));
    }
}
