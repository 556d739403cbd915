// ==========================================
// 业务记录迁移系统 - 查询语句拼装
// ==========================================
// 职责: 引擎生成的 SELECT 语句统一在此拼装
// 约束: 字符串字面量一律经 quote_literal 转义
// ==========================================

/// 字符串字面量转义(单引号翻倍)
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// IN 条件: `field IN ('a','b',…)`
pub fn in_condition(field: &str, values: &[String]) -> String {
    let list: Vec<String> = values.iter().map(|v| quote_literal(v)).collect();
    format!("{} IN ({})", field, list.join(","))
}

// ==========================================
// SelectStatement - SELECT 语句描述
// ==========================================
#[derive(Debug, Default)]
pub struct SelectStatement<'a> {
    pub fields: &'a [String],
    pub object: &'a str,
    pub scope: Option<&'a str>,
    pub condition: Option<&'a str>,
    pub orderby: Option<&'a str>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectStatement<'_> {
    /// 拼装为查询文本
    pub fn to_soql(&self) -> String {
        let mut soql = format!("SELECT {} FROM {}", self.fields.join(", "), self.object);
        if let Some(scope) = self.scope {
            soql.push_str(&format!(" USING SCOPE {}", scope));
        }
        if let Some(condition) = self.condition {
            soql.push_str(&format!(" WHERE {}", condition));
        }
        if let Some(orderby) = self.orderby {
            soql.push_str(&format!(" ORDER BY {}", orderby));
        }
        if let Some(limit) = self.limit {
            soql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            soql.push_str(&format!(" OFFSET {}", offset));
        }
        soql
    }
}
