use crate::models::{AggregateRow, SummaryRow};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;

/// 月份列: 按 `monthKey` 排序而非显示标签
pub const MONTH_COLUMN: &str = "month";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }

    pub fn is_ascending(self) -> bool {
        self == Direction::Asc
    }
}

/// 单元格的排序值
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue<'a> {
    Text(&'a str),
    Number(Cow<'a, BigDecimal>),
}

/// 可按列排序的行
pub trait Sortable {
    /// 列键对应的值; 未知列返回 None
    fn sort_value(&self, key: &str) -> Option<SortValue<'_>>;

    fn month_key(&self) -> Option<&str> {
        None
    }
}

impl Sortable for AggregateRow {
    fn sort_value(&self, key: &str) -> Option<SortValue<'_>> {
        let value = match key {
            "dimensionValue" | "customer" | "sku" | "customerType" => SortValue::Text(&self.dimension_value),
            "description" => SortValue::Text(&self.description),
            "monthLabel" => SortValue::Text(&self.month_label),
            "monthKey" => SortValue::Text(&self.month_key),
            "totalQty" => SortValue::Number(Cow::Borrowed(&self.total_qty)),
            "representativePrice" | "lastPrice" => SortValue::Number(Cow::Borrowed(&self.representative_price)),
            "representativeCost" | "lastCost" => SortValue::Number(Cow::Borrowed(&self.representative_cost)),
            _ => return None,
        };
        Some(value)
    }

    fn month_key(&self) -> Option<&str> {
        Some(&self.month_key)
    }
}

impl Sortable for SummaryRow {
    fn sort_value(&self, key: &str) -> Option<SortValue<'_>> {
        let value = match key {
            "sku" => SortValue::Text(&self.sku),
            "description" => SortValue::Text(&self.description),
            "customerCount" | "customersCount" => {
                SortValue::Number(Cow::Owned(BigDecimal::from(self.customer_count as u64)))
            }
            "minPrice" => SortValue::Number(Cow::Borrowed(&self.min_price)),
            "maxPrice" => SortValue::Number(Cow::Borrowed(&self.max_price)),
            _ => return None,
        };
        Some(value)
    }
}

/// 近似本地化比较: 先忽略大小写, 相同再按字节序
fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// 升序比较; 类型不一致或未知列视为相等
pub fn compare_by<R: Sortable>(a: &R, b: &R, key: &str) -> Ordering {
    if key == MONTH_COLUMN {
        if let (Some(x), Some(y)) = (a.month_key(), b.month_key()) {
            return x.cmp(y);
        }
    }

    match (a.sort_value(key), b.sort_value(key)) {
        (Some(SortValue::Text(x)), Some(SortValue::Text(y))) => locale_cmp(x, y),
        (Some(SortValue::Number(x)), Some(SortValue::Number(y))) => x.cmp(&y),
        _ => Ordering::Equal,
    }
}

/// 返回按列排序后的新序列, 不修改输入; 稳定排序, 相等键保持原有相对顺序
pub fn sort_rows<R: Sortable + Clone>(rows: &[R], key: &str, direction: Direction) -> Vec<R> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| direction.apply(compare_by(a, b, key)));
    sorted
}

/// 视图持有的表格排序状态
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortedTable<R> {
    pub rows: Vec<R>,
    pub sort_key: Option<String>,
    pub sort_ascending: bool,
}

impl<R: Sortable + Clone> SortedTable<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows,
            sort_key: None,
            sort_ascending: true,
        }
    }

    /// 点同一列切换方向, 点新列从升序开始
    pub fn next_direction(&self, key: &str) -> Direction {
        if self.sort_key.as_deref() == Some(key) && self.sort_ascending {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }

    pub fn sort_by_column(&mut self, key: &str) -> &[R] {
        let direction = self.next_direction(key);
        self.rows = sort_rows(&self.rows, key, direction);
        self.sort_key = Some(key.to_string());
        self.sort_ascending = direction.is_ascending();
        &self.rows
    }
}
