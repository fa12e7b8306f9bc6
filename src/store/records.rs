use crate::models::{SkuOption, TransactionRecord};
use indexmap::IndexSet;
use std::collections::BTreeSet;
use std::sync::Arc;

/// 会话内只读的交易记录集合, 克隆开销为一次引用计数
#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Arc<[TransactionRecord]>,
}

impl RecordStore {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 描述包含关键字的记录; 关键字为空时返回全部
    pub fn filter_by_description(&self, term: &str) -> Vec<&TransactionRecord> {
        let needle = term.trim().to_lowercase();
        self.records
            .iter()
            .filter(|r| needle.is_empty() || r.description_contains(&needle))
            .collect()
    }

    pub fn by_sku(&self, sku: &str) -> Vec<&TransactionRecord> {
        self.records.iter().filter(|r| r.sku == sku).collect()
    }

    /// 某客户的记录, 可选按描述关键字再过滤
    pub fn by_customer(&self, customer: &str, term: Option<&str>) -> Vec<&TransactionRecord> {
        let needle = term.map(|t| t.trim().to_lowercase()).unwrap_or_default();
        self.records
            .iter()
            .filter(|r| r.customer == customer)
            .filter(|r| needle.is_empty() || r.description_contains(&needle))
            .collect()
    }

    /// 客户类型比较前两边都去空白
    pub fn by_customer_type(&self, customer_type: &str) -> Vec<&TransactionRecord> {
        let wanted = customer_type.trim();
        self.records
            .iter()
            .filter(|r| r.trimmed_type() == wanted)
            .collect()
    }

    /// 去重并升序的客户列表
    pub fn customers(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.customer.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 去重并升序的客户类型列表 (忽略空类型)
    pub fn customer_types(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.trimmed_type())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// SKU 下拉选项: 每个 SKU 的每个不同描述一项, 保持首次出现顺序
pub fn sku_options<'a, I>(records: I) -> Vec<SkuOption>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut seen: IndexSet<(&str, &str)> = IndexSet::new();
    for record in records {
        seen.insert((record.sku.as_str(), record.description.as_str()));
    }

    // 同一 SKU 的描述排在一起, 次序按 SKU 首次出现
    let sku_order: IndexSet<&str> = seen.iter().map(|(sku, _)| *sku).collect();
    sku_order
        .iter()
        .flat_map(|sku| {
            seen.iter()
                .filter(move |(s, _)| s == sku)
                .map(|(s, d)| SkuOption {
                    sku: s.to_string(),
                    description: d.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(sku: &str, description: &str, customer: &str, customer_type: &str) -> TransactionRecord {
        TransactionRecord {
            sku: sku.into(),
            description: description.into(),
            customer: customer.into(),
            customer_type: customer_type.into(),
            date: "2024-01-01".into(),
            ..Default::default()
        }
    }

    fn store() -> RecordStore {
        RecordStore::new(vec![
            rec("A", "Paper Towel", "Zed Cafe", " Restaurant "),
            rec("B", "Hand Soap", "Acme", "Office"),
            rec("A", "Paper Towel Roll", "Acme", "Office"),
            rec("C", "Trash Bags", "Zed Cafe", ""),
        ])
    }

    #[test]
    fn description_filter_ignores_case_and_blank_term() {
        let store = store();
        assert_eq!(store.filter_by_description("  TOWEL ").len(), 2);
        assert_eq!(store.filter_by_description("").len(), 4);
        assert!(store.filter_by_description("bleach").is_empty());
    }

    #[test]
    fn customer_filter_with_term() {
        let store = store();
        assert_eq!(store.by_customer("Acme", None).len(), 2);
        let hits = store.by_customer("Acme", Some("soap"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].sku, "B");
    }

    #[test]
    fn type_filter_trims_both_sides() {
        let store = store();
        assert_eq!(store.by_customer_type("Restaurant").len(), 1);
        assert_eq!(store.by_customer_type(" Office").len(), 2);
    }

    #[test]
    fn distinct_lists_are_sorted() {
        let store = store();
        assert_eq!(store.customers(), vec!["Acme", "Zed Cafe"]);
        assert_eq!(store.customer_types(), vec!["Office", "Restaurant"]);
    }

    #[test]
    fn sku_options_group_descriptions_by_sku() {
        let store = store();
        let options = sku_options(store.records());
        let pairs: Vec<_> = options
            .iter()
            .map(|o| (o.sku.as_str(), o.description.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("A", "Paper Towel"),
                ("A", "Paper Towel Roll"),
                ("B", "Hand Soap"),
                ("C", "Trash Bags"),
            ]
        );
    }
}
