use crate::models::{CandidateProduct, InvoiceHeader, InvoiceSnapshot, InvoiceTotals, LineItem};
use crate::utils::generate_invoice_number;
use bigdecimal::{BigDecimal, One, Zero};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;

/// 开票台账: 有序明细 + 抬头 (含税率), 合计每次现算
///
/// 同一 SKU 重复添加会保留为多行, 不合并。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLedger {
    header: InvoiceHeader,
    items: Vec<LineItem>,
}

/// 数量不足 1 或非数字时取 1
pub fn coerce_qty(qty: Option<BigDecimal>) -> BigDecimal {
    match qty {
        Some(q) if q >= BigDecimal::one() => q,
        _ => BigDecimal::one(),
    }
}

/// 非数字单价取 0, 负数原样保留
pub fn coerce_price(price: Option<BigDecimal>) -> BigDecimal {
    price.unwrap_or_else(BigDecimal::zero)
}

/// 税率: 非数字或负数取 0
pub fn coerce_tax_pct(pct: Option<BigDecimal>) -> BigDecimal {
    match pct {
        Some(p) if p > BigDecimal::zero() => p,
        _ => BigDecimal::zero(),
    }
}

impl InvoiceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> &InvoiceHeader {
        &self.header
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// 开始新的开票会话: 清空明细和抬头
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// 整体替换抬头, 税率按规则归一
    ///
    /// 切换客户不清空已有明细, 只影响后续搜索与建议价。
    pub fn set_header(&mut self, header: InvoiceHeader) -> InvoiceTotals {
        let tax_pct = header.tax_pct.clone();
        self.header = header;
        self.set_tax_pct(Some(tax_pct))
    }

    pub fn set_tax_pct(&mut self, pct: Option<BigDecimal>) -> InvoiceTotals {
        self.header.tax_pct = coerce_tax_pct(pct);
        self.compute_totals()
    }

    /// 追加一行, 数量为 1
    pub fn add_item(&mut self, candidate: &CandidateProduct, default_price: BigDecimal) -> InvoiceTotals {
        self.items.push(LineItem {
            sku: candidate.sku.clone(),
            description: candidate.description.clone(),
            qty: BigDecimal::one(),
            unit_price: default_price,
        });
        tracing::debug!("ledger add {} -> {} lines", candidate.sku, self.items.len());
        self.compute_totals()
    }

    /// 行号不存在时返回 None
    pub fn update_qty(&mut self, index: usize, qty: Option<BigDecimal>) -> Option<InvoiceTotals> {
        let item = self.items.get_mut(index)?;
        item.qty = coerce_qty(qty);
        Some(self.compute_totals())
    }

    pub fn update_price(&mut self, index: usize, price: Option<BigDecimal>) -> Option<InvoiceTotals> {
        let item = self.items.get_mut(index)?;
        item.unit_price = coerce_price(price);
        Some(self.compute_totals())
    }

    /// 删除后其后的行号整体前移一位
    pub fn remove_item(&mut self, index: usize) -> Option<InvoiceTotals> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        tracing::debug!("ledger remove {} at {}", removed.sku, index);
        Some(self.compute_totals())
    }

    pub fn compute_totals(&self) -> InvoiceTotals {
        let subtotal = self
            .items
            .iter()
            .fold(BigDecimal::zero(), |acc, item| acc + item.line_total());
        let tax = &subtotal * &self.header.tax_pct / BigDecimal::from(100);
        let grand_total = &subtotal + &tax;

        InvoiceTotals {
            subtotal,
            tax,
            grand_total,
        }
    }

    /// 发票号为空时按当天生成
    pub fn resolved_invoice_number(&self, today: NaiveDate) -> String {
        let number = self.header.invoice_number.trim();
        if number.is_empty() {
            generate_invoice_number(today)
        } else {
            self.header.invoice_number.clone()
        }
    }

    pub fn snapshot(&self) -> InvoiceSnapshot {
        self.snapshot_at(Local::now())
    }

    pub fn snapshot_at(&self, now: DateTime<Local>) -> InvoiceSnapshot {
        let totals = self.compute_totals();
        let mut header = self.header.clone();
        header.invoice_number = self.resolved_invoice_number(now.date_naive());

        InvoiceSnapshot {
            header,
            items: self.items.clone(),
            subtotal: totals.subtotal,
            tax: totals.tax,
            grand_total: totals.grand_total,
            generated_at: now.with_timezone(&Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(raw: &str) -> BigDecimal {
        BigDecimal::from_str(raw).unwrap()
    }

    fn candidate(sku: &str) -> CandidateProduct {
        CandidateProduct {
            sku: sku.into(),
            description: format!("Item {sku}"),
            customer: "X".into(),
            date: "2024-01-01".into(),
            unit_price: BigDecimal::from(1),
            suggested_price: BigDecimal::from(1),
        }
    }

    #[test]
    fn totals_scenario() {
        let mut ledger = InvoiceLedger::new();
        ledger.add_item(&candidate("A"), BigDecimal::from(10));
        ledger.add_item(&candidate("B"), BigDecimal::from(5));
        ledger.update_qty(0, Some(BigDecimal::from(2))).unwrap();
        let totals = ledger.set_tax_pct(Some(BigDecimal::from(10)));

        assert_eq!(totals.subtotal, BigDecimal::from(25));
        assert_eq!(totals.tax, dec("2.5"));
        assert_eq!(totals.grand_total, dec("27.5"));
    }

    #[test]
    fn duplicate_skus_stay_separate_lines() {
        let mut ledger = InvoiceLedger::new();
        ledger.add_item(&candidate("A"), BigDecimal::from(3));
        ledger.add_item(&candidate("A"), BigDecimal::from(4));
        assert_eq!(ledger.items().len(), 2);
        assert!(ledger.items().iter().all(|i| i.qty == BigDecimal::one()));
        assert_eq!(ledger.compute_totals().subtotal, BigDecimal::from(7));
    }

    #[test]
    fn qty_never_drops_below_one() {
        let mut ledger = InvoiceLedger::new();
        ledger.add_item(&candidate("A"), BigDecimal::from(3));

        for bad in [None, Some(BigDecimal::zero()), Some(dec("-4")), Some(dec("0.5"))] {
            ledger.update_qty(0, bad).unwrap();
            assert_eq!(ledger.items()[0].qty, BigDecimal::one());
        }
        ledger.update_qty(0, Some(dec("2.5"))).unwrap();
        assert_eq!(ledger.items()[0].qty, dec("2.5"));
    }

    #[test]
    fn price_coerces_to_zero_and_keeps_negatives() {
        let mut ledger = InvoiceLedger::new();
        ledger.add_item(&candidate("A"), BigDecimal::from(3));

        ledger.update_price(0, None).unwrap();
        assert!(ledger.items()[0].unit_price.is_zero());

        let totals = ledger.update_price(0, Some(dec("-2"))).unwrap();
        assert_eq!(ledger.items()[0].unit_price, dec("-2"));
        assert_eq!(totals.subtotal, dec("-2"));
    }

    #[test]
    fn negative_or_missing_tax_is_zero() {
        let mut ledger = InvoiceLedger::new();
        ledger.add_item(&candidate("A"), BigDecimal::from(10));
        assert!(ledger.set_tax_pct(Some(dec("-5"))).tax.is_zero());
        assert!(ledger.set_tax_pct(None).tax.is_zero());
        assert_eq!(ledger.set_tax_pct(Some(dec("8.25"))).tax, dec("0.825"));
    }

    #[test]
    fn remove_shifts_following_lines() {
        let mut ledger = InvoiceLedger::new();
        for sku in ["A", "B", "C"] {
            ledger.add_item(&candidate(sku), BigDecimal::from(1));
        }
        ledger.remove_item(1).unwrap();
        let skus: Vec<_> = ledger.items().iter().map(|i| i.sku.as_str()).collect();
        assert_eq!(skus, vec!["A", "C"]);
        assert!(ledger.remove_item(2).is_none());
        assert!(ledger.update_qty(5, Some(BigDecimal::from(3))).is_none());
        assert!(ledger.update_price(2, None).is_none());
    }

    #[test]
    fn grand_total_identity_holds_after_every_mutation() {
        let mut ledger = InvoiceLedger::new();
        ledger.set_tax_pct(Some(dec("7.5")));

        let check = |ledger: &InvoiceLedger| {
            let t = ledger.compute_totals();
            let expected = &t.subtotal + &t.subtotal * &ledger.header().tax_pct / BigDecimal::from(100);
            assert_eq!(t.grand_total, expected);
            let recomputed = ledger
                .items()
                .iter()
                .fold(BigDecimal::zero(), |acc, i| acc + &i.qty * &i.unit_price);
            assert_eq!(t.subtotal, recomputed);
        };

        ledger.add_item(&candidate("A"), dec("19.99"));
        check(&ledger);
        ledger.add_item(&candidate("B"), dec("0.35"));
        check(&ledger);
        ledger.update_qty(1, Some(BigDecimal::from(12)));
        check(&ledger);
        ledger.update_price(0, Some(dec("18.75")));
        check(&ledger);
        ledger.remove_item(0);
        check(&ledger);
        ledger.remove_item(0);
        check(&ledger);
        assert!(ledger.compute_totals().grand_total.is_zero());
    }

    fn header_for(customer: &str) -> InvoiceHeader {
        InvoiceHeader {
            customer: customer.into(),
            ..Default::default()
        }
    }

    #[test]
    fn set_header_clamps_negative_tax() {
        let mut ledger = InvoiceLedger::new();
        ledger.add_item(&candidate("A"), BigDecimal::from(10));

        let mut header = header_for("Acme");
        header.tax_pct = dec("-5");
        let totals = ledger.set_header(header);
        assert!(ledger.header().tax_pct.is_zero());
        assert!(totals.tax.is_zero());
        assert_eq!(totals.grand_total, BigDecimal::from(10));

        let mut header = header_for("Acme");
        header.tax_pct = BigDecimal::from(10);
        assert_eq!(ledger.set_header(header).grand_total, BigDecimal::from(11));
    }

    #[test]
    fn customer_change_keeps_items_and_reset_clears() {
        let mut ledger = InvoiceLedger::new();
        ledger.set_header(header_for("Acme"));
        ledger.add_item(&candidate("A"), BigDecimal::from(1));
        ledger.set_header(header_for("Other"));
        assert_eq!(ledger.items().len(), 1);
        assert_eq!(ledger.header().customer, "Other");

        ledger.reset();
        assert!(ledger.items().is_empty());
        assert_eq!(ledger.header(), &InvoiceHeader::default());
    }

    #[test]
    fn snapshot_generates_number_when_blank() {
        let now = Local.with_ymd_and_hms(2024, 5, 9, 10, 30, 0).unwrap();
        let mut ledger = InvoiceLedger::new();
        ledger.add_item(&candidate("A"), BigDecimal::from(10));
        ledger.set_tax_pct(Some(BigDecimal::from(10)));

        let snapshot = ledger.snapshot_at(now);
        assert_eq!(snapshot.header.invoice_number, "20240509-001");
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.grand_total, BigDecimal::from(11));
        assert_eq!(snapshot.generated_at, now.with_timezone(&Utc));
        // 快照不回写台账
        assert_eq!(ledger.header().invoice_number, "");

        let mut header = ledger.header().clone();
        header.invoice_number = "INV-7".into();
        ledger.set_header(header);
        assert_eq!(ledger.snapshot_at(now).header.invoice_number, "INV-7");
    }
}
