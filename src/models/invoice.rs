use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 开票时的候选商品 (按 SKU 去重后的搜索结果)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProduct {
    pub sku: String,
    pub description: String,
    pub customer: String,
    pub date: String,
    pub unit_price: BigDecimal,
    /// 该客户最近一次购买此 SKU 的单价, 无记录为 0
    pub suggested_price: BigDecimal,
}

/// 发票明细行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub sku: String,
    pub description: String,
    pub qty: BigDecimal,
    pub unit_price: BigDecimal,
}

impl LineItem {
    pub fn line_total(&self) -> BigDecimal {
        &self.qty * &self.unit_price
    }
}

/// 发票抬头, 自由文本, 不做交叉校验
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceHeader {
    pub invoice_number: String,
    pub customer: String,
    pub tax_pct: BigDecimal,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub customer_address: String,
}

impl Default for InvoiceHeader {
    fn default() -> Self {
        Self {
            invoice_number: String::new(),
            customer: String::new(),
            tax_pct: BigDecimal::zero(),
            contact_name: String::new(),
            contact_phone: String::new(),
            contact_email: String::new(),
            customer_address: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub subtotal: BigDecimal,
    pub tax: BigDecimal,
    pub grand_total: BigDecimal,
}

/// 导出快照, 交给展示层排版打印
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSnapshot {
    pub header: InvoiceHeader,
    pub items: Vec<LineItem>,
    pub subtotal: BigDecimal,
    pub tax: BigDecimal,
    pub grand_total: BigDecimal,
    pub generated_at: DateTime<Utc>,
}
