use crate::models::TransactionRecord;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// 分组维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Customer,
    Sku,
    #[serde(alias = "type", alias = "customerType")]
    CustomerType,
}

impl Dimension {
    pub fn value_of<'a>(&self, record: &'a TransactionRecord) -> &'a str {
        match self {
            Dimension::Customer => &record.customer,
            Dimension::Sku => &record.sku,
            Dimension::CustomerType => record.trimmed_type(),
        }
    }
}

/// 代表价格/成本的归约策略 (全部报表统一使用同一种)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    /// 组内日期最新的一条记录的价格/成本
    #[default]
    #[serde(alias = "lastValue")]
    LastValue,
    /// 按数量加权平均
    #[serde(alias = "weightedAverage")]
    WeightedAverage,
}

/// 月度汇总行 (维度值 x 月份)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRow {
    pub dimension_value: String,
    /// 组内首条记录的商品描述
    pub description: String,
    pub month_label: String,
    pub month_key: String,
    pub total_qty: BigDecimal,
    pub representative_price: BigDecimal,
    pub representative_cost: BigDecimal,
}

/// 客户类型下的 SKU 汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub sku: String,
    pub description: String,
    pub customer_count: usize,
    pub min_price: BigDecimal,
    pub max_price: BigDecimal,
}

/// SKU 下拉选项 (同一 SKU 的每个不同描述各一项)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuOption {
    pub sku: String,
    pub description: String,
}
