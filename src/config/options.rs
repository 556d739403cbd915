// ==========================================
// 业务记录迁移系统 - 运行选项
// ==========================================
// 职责: 装载/导出入口的可选参数
// 说明: 全部可从任务档案(JSON)反序列化
// ==========================================

use crate::domain::idmap::IdMap;
use serde::{Deserialize, Serialize};

/// 导出查询默认取回上限
pub const DEFAULT_MAX_FETCH_SIZE: usize = 10_000;

// ==========================================
// CsvParseOptions - CSV 解析选项
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CsvParseOptions {
    /// 分隔符(单字符)
    pub delimiter: char,
    /// 是否允许行长度不一致
    pub flexible: bool,
    /// 是否去除单元格首尾空白
    pub trim: bool,
}

impl Default for CsvParseOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            flexible: true,
            trim: true,
        }
    }
}

// ==========================================
// UploadOptions - 装载选项
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadOptions {
    /// 默认命名空间(开启宽容查找)
    pub default_namespace: Option<String>,
    /// CSV 解析选项(原样转发解析层)
    pub csv_parse_options: CsvParseOptions,
    /// IdMap 种子(调用方既有映射,永不被覆盖)
    pub id_map: Option<IdMap>,
    /// 目标集种子(空/缺省表示全量装载;沿引用边传播)
    pub target_ids: Option<Vec<String>>,
}

// ==========================================
// DumpOptions - 导出选项
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DumpOptions {
    /// 默认命名空间(开启宽容查找)
    pub default_namespace: Option<String>,
    /// 单次查询取回上限
    pub max_fetch_size: usize,
    /// ID 反写映射(往返场景: 目标 Id 改写回源 Id)
    pub id_map: Option<IdMap>,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            default_namespace: None,
            max_fetch_size: DEFAULT_MAX_FETCH_SIZE,
            id_map: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DumpOptions::default();
        assert_eq!(options.max_fetch_size, 10_000);

        let options: DumpOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.max_fetch_size, 10_000);

        let options: UploadOptions =
            serde_json::from_str(r#"{"defaultNamespace":"myns"}"#).unwrap();
        assert_eq!(options.default_namespace.as_deref(), Some("myns"));
        assert_eq!(options.csv_parse_options.delimiter, ',');
    }
}
