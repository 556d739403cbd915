// ==========================================
// 业务记录迁移系统 - CSV 解析/序列化层
// ==========================================
// 职责: CSV 文本 ↔ 装载数据集/导出行
// 约束: 首行为表头;行长度与表头对齐(补齐/截断);
//       完全空白行跳过
// ==========================================

use crate::config::options::CsvParseOptions;
use crate::domain::dataset::LoadDataset;
use crate::engine::error::{MigrationError, MigrationResult};
use csv::{ReaderBuilder, WriterBuilder};

/// 解析 CSV 文本为装载数据集
///
/// # 参数
/// - object: 对象名
/// - text: CSV 文本(首行表头)
/// - options: 解析选项(分隔符/宽容行长/去空白)
pub fn parse_dataset(
    object: &str,
    text: &str,
    options: &CsvParseOptions,
) -> MigrationResult<LoadDataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(options.flexible)
        .delimiter(options.delimiter as u8)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| MigrationError::CsvParse(format!("{}: {}", object, e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| MigrationError::CsvParse(format!("{}: {}", object, e)))?;
        let mut cells: Vec<String> = record
            .iter()
            .map(|c| {
                if options.trim {
                    c.trim().to_string()
                } else {
                    c.to_string()
                }
            })
            .collect();

        // 完全空白行跳过
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }

        // 行长度与表头对齐
        cells.resize(headers.len(), String::new());
        rows.push(cells);
    }

    Ok(LoadDataset::new(object, headers, rows))
}

/// 序列化行集为 CSV 文本(首行表头)
pub fn write_csv(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    // 写入 Vec<u8> 不产生 IO 错误,仅在记录宽度异常时失败;行宽由调用方对齐
    let _ = writer.write_record(headers);
    for row in rows {
        let _ = writer.write_record(row);
    }
    let bytes = writer.into_inner().unwrap_or_default();
    String::from_utf8(bytes).unwrap_or_default()
}
