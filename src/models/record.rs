use crate::utils::{lenient_decimal, lenient_text, month_key, month_label, parse_record_date};
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 销售明细记录 (一行一个售出商品), 外部数据源提供, 只读
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub sku: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub customer: String,
    #[serde(default, alias = "type", deserialize_with = "lenient_text")]
    pub customer_type: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub qty: BigDecimal,
    #[serde(default, alias = "price", deserialize_with = "lenient_decimal")]
    pub unit_price: BigDecimal,
    #[serde(default, alias = "cost", deserialize_with = "lenient_decimal")]
    pub unit_cost: BigDecimal,
    #[serde(default, alias = "inv#", deserialize_with = "lenient_text")]
    pub invoice_ref: String,
}

/// 记录所属的日历月
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMonth {
    pub key: String,
    pub label: String,
}

impl TransactionRecord {
    /// 解析后的日期; 无法解析时为 None
    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        parse_record_date(&self.date)
    }

    pub fn month(&self) -> Option<RecordMonth> {
        self.parsed_date().map(|d| RecordMonth {
            key: month_key(&d),
            label: month_label(&d),
        })
    }

    /// 描述是否包含关键字; `needle` 须已转为小写
    pub fn description_contains(&self, needle: &str) -> bool {
        self.description.to_lowercase().contains(needle)
    }

    /// 客户类型 (去首尾空白)
    pub fn trimmed_type(&self) -> &str {
        self.customer_type.trim()
    }
}
