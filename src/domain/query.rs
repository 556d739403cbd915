// ==========================================
// 业务记录迁移系统 - 导出查询描述
// ==========================================
// 职责: dump 入口的查询参数(种子/关联)
// ==========================================

use crate::domain::types::QueryTarget;
use serde::{Deserialize, Serialize};

// ==========================================
// FieldList - 字段列表(逗号串或数组)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldList {
    /// 逗号分隔字符串: "Id, Name, AccountId"
    Csv(String),
    /// 字段名数组
    List(Vec<String>),
}

impl FieldList {
    /// 归一化为字段名列表(去空白,丢弃空项)
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            FieldList::Csv(s) => s
                .split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
            FieldList::List(v) => v
                .iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }
}

// ==========================================
// DumpQuery - 导出查询
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpQuery {
    /// 对象名
    pub object: String,

    /// 查询角色: 种子(query) / 关联(related)
    pub target: QueryTarget,

    /// 输出字段(缺省时取 schema 全部字段)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldList>,

    /// 排除字段(fields 缺省时生效: 全部字段减去此列表)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_fields: Option<FieldList>,

    /// WHERE 条件(仅种子查询使用)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// ORDER BY 子句(仅种子查询使用)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orderby: Option<String>,

    /// LIMIT(仅种子查询使用)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// OFFSET(仅种子查询使用)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,

    /// USING SCOPE 范围(仅种子查询使用)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl DumpQuery {
    /// 构造种子查询
    pub fn seed(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            target: QueryTarget::Query,
            fields: None,
            ignore_fields: None,
            condition: None,
            orderby: None,
            limit: None,
            offset: None,
            scope: None,
        }
    }

    /// 构造关联查询
    pub fn related(object: impl Into<String>) -> Self {
        Self {
            target: QueryTarget::Related,
            ..Self::seed(object)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_list_forms() {
        let csv = FieldList::Csv("Id, Name ,AccountId,".into());
        assert_eq!(csv.to_vec(), vec!["Id", "Name", "AccountId"]);

        let list = FieldList::List(vec!["Id".into(), " Name ".into()]);
        assert_eq!(list.to_vec(), vec!["Id", "Name"]);
    }

    #[test]
    fn test_query_deserialize() {
        let q: DumpQuery = serde_json::from_str(
            r#"{"object":"Account","target":"query","condition":"Name='X'","limit":10}"#,
        )
        .unwrap();
        assert_eq!(q.object, "Account");
        assert_eq!(q.target, QueryTarget::Query);
        assert_eq!(q.limit, Some(10));

        let q: DumpQuery =
            serde_json::from_str(r#"{"object":"Contact","target":"related","fields":"Id,Name"}"#)
                .unwrap();
        assert_eq!(q.target, QueryTarget::Related);
        assert_eq!(q.fields.unwrap().to_vec(), vec!["Id", "Name"]);
    }
}
