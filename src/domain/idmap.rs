// ==========================================
// 业务记录迁移系统 - ID 翻译映射
// ==========================================
// 职责: 源实例 Id → 目标实例 Id 的有序映射
// 不变式: 单调增长,已有条目永不覆盖
// ==========================================

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

// ==========================================
// IdMap
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    entries: HashMap<String, String>, // source_id → target_id
    order: Vec<String>,               // 插入顺序(序列化/迭代稳定性)
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 (source, target) 序列构造(重复 source 首次为准)
    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut map = Self::new();
        for (s, t) in pairs {
            map.insert(s.into(), t.into());
        }
        map
    }

    /// 插入映射;已有条目不覆盖
    ///
    /// # 返回
    /// - true: 新条目已写入
    /// - false: source_id 已存在,忽略本次写入
    pub fn insert(&mut self, source_id: String, target_id: String) -> bool {
        if self.entries.contains_key(&source_id) {
            return false;
        }
        self.order.push(source_id.clone());
        self.entries.insert(source_id, target_id);
        true
    }

    pub fn get(&self, source_id: &str) -> Option<&str> {
        self.entries.get(source_id).map(String::as_str)
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.entries.contains_key(source_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按插入顺序迭代 (source, target)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order.iter().filter_map(move |k| {
            self.entries
                .get(k)
                .map(|v| (k.as_str(), v.as_str()))
        })
    }

    /// 反转映射: target → source
    ///
    /// 多个 source 指向同一 target 时(默认映射场景),先插入者为准
    pub fn reversed(&self) -> HashMap<String, String> {
        let mut rev = HashMap::with_capacity(self.entries.len());
        for (source, target) in self.iter() {
            rev.entry(target.to_string())
                .or_insert_with(|| source.to_string());
        }
        rev
    }
}

// ==========================================
// 序列化: 以插入顺序输出 JSON 对象
// ==========================================

impl Serialize for IdMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.order.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct IdMapVisitor;

impl<'de> Visitor<'de> for IdMapVisitor {
    type Value = IdMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("source_id → target_id 映射对象")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = IdMap::new();
        while let Some((k, v)) = access.next_entry::<String, String>()? {
            map.insert(k, v);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for IdMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(IdMapVisitor)
    }
}
