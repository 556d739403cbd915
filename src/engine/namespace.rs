// ==========================================
// 业务记录迁移系统 - 命名空间工具
// ==========================================
// 职责: 大小写不敏感、命名空间宽容的标识符查找
// 规则: 先按原样查,未命中时依次尝试去前缀/加前缀
// 约束: 无改写规则适用时必须保留原始写法
// ==========================================

use std::collections::{HashMap, HashSet};

/// 自定义标识符后缀(加前缀时采用更严格的判定)
const CUSTOM_SUFFIXES: [&str; 3] = ["__c", "__r", "__mdt"];

/// 去除命名空间前缀
///
/// `ns__Foo__c` → `Foo__c`;前缀比较大小写不敏感;不匹配时原样返回
pub fn strip_namespace<'a>(name: &'a str, namespace: &str) -> &'a str {
    let ns_len = namespace.len();
    let prefix_len = ns_len + 2;
    match (name.get(..ns_len), name.get(ns_len..prefix_len)) {
        (Some(head), Some(sep))
            if head.eq_ignore_ascii_case(namespace) && sep == "__" && name.len() > prefix_len =>
        {
            &name[prefix_len..]
        }
        _ => name,
    }
}

/// 添加命名空间前缀
///
/// - `Foo__c`(干部分不含 `__`)→ `ns__Foo__c`
/// - 不含 `__` 的名字 → `ns__name`
/// - 已带命名空间或其他情况 → 原样返回
pub fn add_namespace(name: &str, namespace: &str) -> String {
    let lower = name.to_ascii_lowercase();
    for suffix in CUSTOM_SUFFIXES {
        if let Some(stem) = lower.strip_suffix(suffix) {
            if stem.contains("__") {
                return name.to_string();
            }
            return format!("{}__{}", namespace, name);
        }
    }
    if name.contains("__") {
        return name.to_string();
    }
    format!("{}__{}", namespace, name)
}

/// 在以小写键存储的映射中查找
///
/// 依次尝试: 原键 → 去前缀 → 加前缀;首个命中生效
pub fn lookup_value<'a, V>(
    map: &'a HashMap<String, V>,
    key: &str,
    namespace: Option<&str>,
) -> Option<&'a V> {
    let lower = key.to_ascii_lowercase();
    if let Some(v) = map.get(&lower) {
        return Some(v);
    }
    let ns = namespace?.to_ascii_lowercase();
    let stripped = strip_namespace(&lower, &ns);
    if stripped != lower {
        if let Some(v) = map.get(stripped) {
            return Some(v);
        }
    }
    let added = add_namespace(&lower, &ns);
    if added != lower {
        return map.get(&added);
    }
    None
}

/// 集合成员判定(集合元素为小写)
pub fn set_contains(set: &HashSet<String>, key: &str, namespace: Option<&str>) -> bool {
    let lower = key.to_ascii_lowercase();
    if set.contains(&lower) {
        return true;
    }
    let Some(ns) = namespace.map(str::to_ascii_lowercase) else {
        return false;
    };
    let stripped = strip_namespace(&lower, &ns);
    if stripped != lower && set.contains(stripped) {
        return true;
    }
    let added = add_namespace(&lower, &ns);
    added != lower && set.contains(&added)
}

/// 名称数组包含判定(元素大小写任意)
pub fn slice_contains(names: &[String], key: &str, namespace: Option<&str>) -> bool {
    let lower_names: HashSet<String> = names.iter().map(|n| n.to_ascii_lowercase()).collect();
    set_contains(&lower_names, key, namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip() {
        assert_eq!(strip_namespace("myns__Foo__c", "myns"), "Foo__c");
        assert_eq!(strip_namespace("MyNS__Foo__c", "myns"), "Foo__c");
        assert_eq!(strip_namespace("Foo__c", "myns"), "Foo__c");
        // 前缀恰好等于整个名字时不去除
        assert_eq!(strip_namespace("myns__", "myns"), "myns__");
    }

    #[test]
    fn test_add() {
        assert_eq!(add_namespace("Foo__c", "myns"), "myns__Foo__c");
        assert_eq!(add_namespace("myns__Foo__c", "myns"), "myns__Foo__c");
        assert_eq!(add_namespace("Name", "myns"), "myns__Name");
        assert_eq!(add_namespace("Custom__mdt", "myns"), "myns__Custom__mdt");
    }

    #[test]
    fn test_lookup_law() {
        // lookup(m,k,N) = lookup(m,strip(k,N),N) = lookup(m,add(k,N),N)
        let mut map = HashMap::new();
        map.insert("myns__foo__c".to_string(), 1);

        let ns = Some("myns");
        assert_eq!(lookup_value(&map, "Foo__c", ns), Some(&1));
        assert_eq!(lookup_value(&map, "myns__Foo__c", ns), Some(&1));
        assert_eq!(lookup_value(&map, "MYNS__FOO__C", ns), Some(&1));

        let mut plain = HashMap::new();
        plain.insert("foo__c".to_string(), 2);
        assert_eq!(lookup_value(&plain, "myns__Foo__c", ns), Some(&2));
        // 无命名空间配置时不做回退
        assert_eq!(lookup_value(&plain, "myns__Foo__c", None), None);
    }

    #[test]
    fn test_set_and_slice() {
        let names = vec!["Account".to_string(), "myns__Item__c".to_string()];
        assert!(slice_contains(&names, "ACCOUNT", None));
        assert!(slice_contains(&names, "Item__c", Some("myns")));
        assert!(!slice_contains(&names, "Contact", Some("myns")));
    }
}
