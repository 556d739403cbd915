// ==========================================
// 业务记录迁移系统 - 对象结构缓存
// ==========================================
// 职责: 懒取并缓存逐对象 schema;对象/字段名解析(命名空间回退)
// 契约: 构建完成后不可变,可安全并发只读
// ==========================================

use crate::client::schema_client::SchemaClient;
use crate::domain::describe::{FieldDescription, ObjectDescription};
use crate::engine::error::{MigrationError, MigrationResult};
use crate::engine::namespace;
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// Describer
// ==========================================
#[derive(Debug)]
pub struct Describer {
    default_namespace: Option<String>,
    // 键: lower(服务端返回的对象名)
    objects: HashMap<String, DescribedObject>,
}

#[derive(Debug)]
struct DescribedObject {
    description: ObjectDescription,
    // 键: lower(字段名) → fields 下标
    field_index: HashMap<String, usize>,
}

impl Describer {
    /// 构建缓存: 对给定对象名逐个 describe
    ///
    /// # 回退
    /// 对象未找到且配置了 default_namespace 时,以去前缀名重试一次;
    /// 仍未找到则以 SchemaNotFound 中止
    pub async fn build<S>(
        client: &S,
        object_names: &[String],
        default_namespace: Option<&str>,
    ) -> MigrationResult<Self>
    where
        S: SchemaClient + ?Sized,
    {
        let mut describer = Self {
            default_namespace: default_namespace.map(str::to_string),
            objects: HashMap::new(),
        };

        for name in object_names {
            if describer.find_object(name).is_some() {
                continue; // 去重: 同一对象以不同写法出现
            }

            let mut description = client.describe(name).await?;
            if description.is_none() {
                if let Some(ns) = default_namespace {
                    let stripped = namespace::strip_namespace(name, ns);
                    if stripped != name {
                        debug!(object = %name, retry = %stripped, "describe 未命中,去前缀重试");
                        description = client.describe(stripped).await?;
                    }
                }
            }

            let description = description.ok_or_else(|| MigrationError::SchemaNotFound {
                object: name.clone(),
            })?;
            describer.insert(description);
        }

        Ok(describer)
    }

    fn insert(&mut self, description: ObjectDescription) {
        let field_index = description
            .fields
            .iter()
            .enumerate()
            .map(|(idx, f)| (f.name.to_ascii_lowercase(), idx))
            .collect();
        self.objects.insert(
            description.name.to_ascii_lowercase(),
            DescribedObject {
                description,
                field_index,
            },
        );
    }

    /// 按名查找对象描述(大小写不敏感,命名空间宽容)
    pub fn find_object(&self, name: &str) -> Option<&ObjectDescription> {
        namespace::lookup_value(&self.objects, name, self.default_namespace.as_deref())
            .map(|o| &o.description)
    }

    /// 按名查找字段描述
    pub fn find_field(&self, object: &str, field: &str) -> Option<&FieldDescription> {
        let entry =
            namespace::lookup_value(&self.objects, object, self.default_namespace.as_deref())?;
        let idx = namespace::lookup_value(
            &entry.field_index,
            field,
            self.default_namespace.as_deref(),
        )?;
        entry.description.fields.get(*idx)
    }

    /// 对象是否在缓存中
    pub fn knows_object(&self, name: &str) -> bool {
        self.find_object(name).is_some()
    }

    /// 配置的默认命名空间
    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::error::ClientError;
    use crate::domain::types::FieldType;
    use async_trait::async_trait;

    // 测试用 Schema Client: 固定两个对象
    struct StubSchemaClient;

    #[async_trait]
    impl SchemaClient for StubSchemaClient {
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
                "item__c" => Ok(Some(ObjectDescription::new(
                    "myns__Item__c",
                    vec![FieldDescription::new("Id", FieldType::Id)],
                ))),
                _ => Ok(None),
            }
        }
    }

    #[tokio::test]
    async fn test_build_and_find() {
        let describer = Describer::build(
            &StubSchemaClient,
            &["Account".to_string()],
            None,
        )
        .await
        .expect("构建失败");

        assert!(describer.find_object("ACCOUNT").is_some());
        let field = describer.find_field("account", "NAME").expect("字段未找到");
        assert_eq!(field.name, "Name");
        assert!(describer.find_field("account", "Phone").is_none());
    }

    #[tokio::test]
    async fn test_namespace_fallback_retry() {
        // myns__Item__c 未注册,但去前缀后的 Item__c 命中
        let describer = Describer::build(
            &StubSchemaClient,
            &["myns__Item__c".to_string()],
            Some("myns"),
        )
        .await
        .expect("构建失败");

        assert!(describer.find_object("Item__c").is_some());
        assert!(describer.find_object("myns__Item__c").is_some());
    }

    #[tokio::test]
    async fn test_schema_not_found() {
        let err = Describer::build(&StubSchemaClient, &["Lead".to_string()], None)
            .await
            .expect_err("应当报错");
        assert!(matches!(err, MigrationError::SchemaNotFound { object } if object == "Lead"));
    }
}
