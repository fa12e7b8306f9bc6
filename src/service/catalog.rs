use crate::models::{CandidateProduct, TransactionRecord};
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDateTime;
use indexmap::IndexMap;

/// 搜索结果上限
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// 按描述关键字搜索候选商品, 最多 50 条
pub fn search(
    records: &[TransactionRecord],
    query: &str,
    scoped_customer: Option<&str>,
) -> Vec<CandidateProduct> {
    search_with_limit(records, query, scoped_customer, DEFAULT_SEARCH_LIMIT)
}

/// 搜索候选商品
///
/// 1. 描述包含关键字 (忽略大小写) 的记录为全局匹配
/// 2. 指定客户且该客户有匹配时, 先列客户匹配, 再接全部全局匹配作为兜底
/// 3. 按 SKU 去重, 保留日期最新的记录 (无法解析的日期视为最早), 位置取 SKU 首次出现处
/// 4. 指定客户时回填该客户最近一次购买价作为建议价
pub fn search_with_limit(
    records: &[TransactionRecord],
    query: &str,
    scoped_customer: Option<&str>,
    limit: usize,
) -> Vec<CandidateProduct> {
    let term = query.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }
    let customer = scoped_customer.filter(|c| !c.is_empty());

    let global: Vec<&TransactionRecord> = records
        .iter()
        .filter(|r| r.description_contains(&term))
        .collect();
    let scoped: Vec<&TransactionRecord> = match customer {
        Some(c) => global.iter().copied().filter(|r| r.customer == c).collect(),
        None => Vec::new(),
    };

    let pool: Vec<&TransactionRecord> = if scoped.is_empty() {
        global
    } else {
        scoped.into_iter().chain(global).collect()
    };

    let mut by_sku: IndexMap<&str, (&TransactionRecord, Option<NaiveDateTime>)> = IndexMap::new();
    for record in pool {
        let date = record.parsed_date();
        match by_sku.get_mut(record.sku.as_str()) {
            Some(slot) => {
                if date > slot.1 {
                    *slot = (record, date);
                }
            }
            None => {
                by_sku.insert(record.sku.as_str(), (record, date));
            }
        }
    }

    tracing::debug!(
        "catalog search '{}' (customer: {:?}): {} distinct SKUs",
        term,
        customer,
        by_sku.len()
    );

    by_sku
        .into_values()
        .take(limit)
        .map(|(record, _)| CandidateProduct {
            sku: record.sku.clone(),
            description: record.description.clone(),
            customer: record.customer.clone(),
            date: record.date.clone(),
            unit_price: record.unit_price.clone(),
            suggested_price: customer
                .map(|c| recall_price(records, c, &record.sku))
                .unwrap_or_else(BigDecimal::zero),
        })
        .collect()
}

/// 客户对该 SKU 最近一次购买 (全量记录中查找)
pub fn last_purchase<'a>(
    records: &'a [TransactionRecord],
    customer: &str,
    sku: &str,
) -> Option<&'a TransactionRecord> {
    let mut best: Option<(&TransactionRecord, Option<NaiveDateTime>)> = None;
    for record in records.iter().filter(|r| r.customer == customer && r.sku == sku) {
        let date = record.parsed_date();
        if best.as_ref().map_or(true, |(_, best_date)| date > *best_date) {
            best = Some((record, date));
        }
    }
    best.map(|(record, _)| record)
}

/// 建议单价: 客户最近一次购买价, 无购买记录为 0
pub fn recall_price(records: &[TransactionRecord], customer: &str, sku: &str) -> BigDecimal {
    last_purchase(records, customer, sku)
        .map(|r| r.unit_price.clone())
        .unwrap_or_else(BigDecimal::zero)
}

/// 按 SKU 取最新一条记录作为候选, 用于直接按 SKU 加行
///
/// 同一 SKU 可能有多个描述; 给出 `description` 时只在描述相同的记录中挑选,
/// 保证加入的行与用户在搜索结果中选中的一致。
pub fn candidate_for_sku(
    records: &[TransactionRecord],
    sku: &str,
    description: Option<&str>,
    scoped_customer: Option<&str>,
) -> Option<CandidateProduct> {
    let mut best: Option<(&TransactionRecord, Option<NaiveDateTime>)> = None;
    let matching = records
        .iter()
        .filter(|r| r.sku == sku && description.map_or(true, |d| r.description == d));
    for record in matching {
        let date = record.parsed_date();
        if best.as_ref().map_or(true, |(_, best_date)| date > *best_date) {
            best = Some((record, date));
        }
    }

    let customer = scoped_customer.filter(|c| !c.is_empty());
    best.map(|(record, _)| CandidateProduct {
        sku: record.sku.clone(),
        description: record.description.clone(),
        customer: record.customer.clone(),
        date: record.date.clone(),
        unit_price: record.unit_price.clone(),
        suggested_price: customer
            .map(|c| recall_price(records, c, sku))
            .unwrap_or_else(BigDecimal::zero),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(sku: &str, description: &str, customer: &str, date: &str, price: i64) -> TransactionRecord {
        TransactionRecord {
            sku: sku.into(),
            description: description.into(),
            customer: customer.into(),
            date: date.into(),
            unit_price: BigDecimal::from(price),
            ..Default::default()
        }
    }

    fn catalog() -> Vec<TransactionRecord> {
        vec![
            rec("T1", "Paper Towel", "Other", "2024-03-01", 9),
            rec("G1", "Nitrile Gloves", "Acme", "2024-01-01", 20),
            rec("T1", "Paper Towel", "Acme", "2024-01-15", 7),
            rec("T2", "Towel Dispenser", "Other", "2024-02-01", 30),
            rec("T1", "Paper Towel", "Acme", "2024-02-10", 8),
            rec("T3", "Bar Towel", "Acme", "garbage", 5),
        ]
    }

    fn skus(candidates: &[CandidateProduct]) -> Vec<&str> {
        candidates.iter().map(|c| c.sku.as_str()).collect()
    }

    #[test]
    fn blank_query_returns_nothing() {
        assert!(search(&catalog(), "   ", Some("Acme")).is_empty());
    }

    #[test]
    fn substring_match_ignores_case() {
        let results = search(&catalog(), "TOWEL", None);
        assert_eq!(skus(&results), vec!["T1", "T2", "T3"]);
        assert!(results.iter().all(|c| c.suggested_price.is_zero()));
    }

    #[test]
    fn customer_matches_come_first() {
        let results = search(&catalog(), "towel", Some("Acme"));
        assert_eq!(skus(&results), vec!["T1", "T3", "T2"]);
    }

    #[test]
    fn unknown_customer_falls_back_to_global_order() {
        let results = search(&catalog(), "towel", Some("Nobody"));
        assert_eq!(skus(&results), vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn dedup_keeps_latest_record_per_sku() {
        let results = search(&catalog(), "towel", Some("Acme"));
        let t1 = results.iter().find(|c| c.sku == "T1").unwrap();
        assert_eq!(t1.date, "2024-03-01");
        assert_eq!(t1.customer, "Other");

        let mut seen = std::collections::HashSet::new();
        assert!(results.iter().all(|c| seen.insert(c.sku.clone())));
    }

    #[test]
    fn parseable_date_beats_unparsable() {
        let records = vec![
            rec("Z", "Mop Head", "A", "??", 1),
            rec("Z", "Mop Head", "B", "2020-01-01", 2),
            rec("Z", "Mop Head", "C", "also bad", 3),
        ];
        let results = search(&records, "mop", None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].customer, "B");
    }

    #[test]
    fn suggested_price_is_customers_latest_purchase() {
        let results = search(&catalog(), "towel", Some("Acme"));
        let t1 = results.iter().find(|c| c.sku == "T1").unwrap();
        // 全局最新是 Other 的 9, 但建议价取 Acme 自己最近的 8
        assert_eq!(t1.unit_price, BigDecimal::from(9));
        assert_eq!(t1.suggested_price, BigDecimal::from(8));

        let t2 = results.iter().find(|c| c.sku == "T2").unwrap();
        assert!(t2.suggested_price.is_zero());
    }

    #[test]
    fn recall_scans_whole_record_set() {
        let records = catalog();
        assert_eq!(recall_price(&records, "Acme", "G1"), BigDecimal::from(20));
        assert_eq!(recall_price(&records, "Acme", "T3"), BigDecimal::from(5));
        assert!(recall_price(&records, "Other", "G1").is_zero());
    }

    #[test]
    fn results_are_capped() {
        let records: Vec<_> = (0..80)
            .map(|i| rec(&format!("S{i}"), "Liner", "X", "2024-01-01", i))
            .collect();
        assert_eq!(search(&records, "liner", None).len(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(search_with_limit(&records, "liner", None, 5).len(), 5);
    }

    #[test]
    fn candidate_for_sku_uses_latest_record() {
        let records = catalog();
        let candidate = candidate_for_sku(&records, "T1", None, Some("Acme")).unwrap();
        assert_eq!(candidate.date, "2024-03-01");
        assert_eq!(candidate.suggested_price, BigDecimal::from(8));
        assert!(candidate_for_sku(&records, "NOPE", None, None).is_none());
    }

    #[test]
    fn candidate_for_sku_honours_chosen_description() {
        let mut records = catalog();
        records.push(rec("T1", "Paper Towel Roll", "Acme", "2024-01-02", 6));

        let picked = candidate_for_sku(&records, "T1", Some("Paper Towel Roll"), Some("Acme")).unwrap();
        assert_eq!(picked.description, "Paper Towel Roll");
        assert_eq!(picked.date, "2024-01-02");

        let latest = candidate_for_sku(&records, "T1", None, None).unwrap();
        assert_eq!(latest.description, "Paper Towel");
        assert!(candidate_for_sku(&records, "T1", Some("Mop"), None).is_none());
    }
}
