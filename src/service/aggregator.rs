use crate::models::{AggregateRow, Dimension, Reduction, SummaryRow, TransactionRecord};
use crate::utils::{month_key, month_label};
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDateTime;
use indexmap::{IndexMap, IndexSet};

/// 单个 (维度值, 月份) 分组的累加状态
struct Bucket<'a> {
    first: &'a TransactionRecord,
    month_label: String,
    total_qty: BigDecimal,
    latest: Option<NaiveDateTime>,
    last_price: BigDecimal,
    last_cost: BigDecimal,
    price_amount: BigDecimal,
    cost_amount: BigDecimal,
}

impl<'a> Bucket<'a> {
    fn new(first: &'a TransactionRecord, date: &NaiveDateTime) -> Self {
        Self {
            first,
            month_label: month_label(date),
            total_qty: BigDecimal::zero(),
            latest: None,
            last_price: BigDecimal::zero(),
            last_cost: BigDecimal::zero(),
            price_amount: BigDecimal::zero(),
            cost_amount: BigDecimal::zero(),
        }
    }

    fn absorb(&mut self, record: &TransactionRecord, date: NaiveDateTime) {
        self.total_qty += &record.qty;
        self.price_amount += &record.unit_price * &record.qty;
        self.cost_amount += &record.unit_cost * &record.qty;

        // 严格大于: 同一时间戳时保留先出现的记录
        if self.latest.map_or(true, |latest| date > latest) {
            self.latest = Some(date);
            self.last_price = record.unit_price.clone();
            self.last_cost = record.unit_cost.clone();
        }
    }

    fn into_row(self, dimension_value: String, month_key: String, reduction: Reduction) -> AggregateRow {
        let (representative_price, representative_cost) = match reduction {
            Reduction::LastValue => (self.last_price, self.last_cost),
            Reduction::WeightedAverage => {
                if self.total_qty.is_zero() {
                    (BigDecimal::zero(), BigDecimal::zero())
                } else {
                    (
                        &self.price_amount / &self.total_qty,
                        &self.cost_amount / &self.total_qty,
                    )
                }
            }
        };

        AggregateRow {
            dimension_value,
            description: self.first.description.clone(),
            month_label: self.month_label,
            month_key,
            total_qty: self.total_qty,
            representative_price,
            representative_cost,
        }
    }
}

/// 按 (维度值, 月份) 汇总; 日期无法解析的记录不参与
///
/// 结果按分组首次出现的顺序排列, 需要别的顺序交给 `sorter`。
pub fn aggregate<'a, I>(records: I, dimension: Dimension, reduction: Reduction) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut buckets: IndexMap<(String, String), Bucket<'a>> = IndexMap::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(date) = record.parsed_date() else {
            skipped += 1;
            continue;
        };

        let key = (dimension.value_of(record).to_string(), month_key(&date));
        buckets
            .entry(key)
            .or_insert_with(|| Bucket::new(record, &date))
            .absorb(record, date);
    }

    tracing::debug!(
        "aggregate by {:?} ({:?}): {} groups, {} undated records skipped",
        dimension,
        reduction,
        buckets.len(),
        skipped
    );

    buckets
        .into_iter()
        .map(|((value, key), bucket)| bucket.into_row(value, key, reduction))
        .collect()
}

/// 某 SKU 的按客户月度明细 (商品页)
pub fn sku_breakdown<'a, I>(records: I, reduction: Reduction) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    aggregate(records, Dimension::Customer, reduction)
}

/// 某客户的按 SKU 月度明细 (客户页)
pub fn customer_breakdown<'a, I>(records: I, reduction: Reduction) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    aggregate(records, Dimension::Sku, reduction)
}

/// 客户类型下每个 SKU 的客户数与价格区间
pub fn summarize_customer_type<'a, I>(records: I, customer_type: &str) -> Vec<SummaryRow>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    struct Acc<'r> {
        description: &'r str,
        customers: IndexSet<&'r str>,
        min_price: BigDecimal,
        max_price: BigDecimal,
    }

    let wanted = customer_type.trim();
    let mut by_sku: IndexMap<&'a str, Acc<'a>> = IndexMap::new();

    for record in records.into_iter().filter(|r| r.trimmed_type() == wanted) {
        let acc = by_sku.entry(record.sku.as_str()).or_insert_with(|| Acc {
            description: &record.description,
            customers: IndexSet::new(),
            min_price: record.unit_price.clone(),
            max_price: record.unit_price.clone(),
        });
        acc.customers.insert(record.customer.as_str());
        if record.unit_price < acc.min_price {
            acc.min_price = record.unit_price.clone();
        }
        if record.unit_price > acc.max_price {
            acc.max_price = record.unit_price.clone();
        }
    }

    by_sku
        .into_iter()
        .map(|(sku, acc)| SummaryRow {
            sku: sku.to_string(),
            description: acc.description.to_string(),
            customer_count: acc.customers.len(),
            min_price: acc.min_price,
            max_price: acc.max_price,
        })
        .collect()
}

/// 客户类型 + SKU 的逐条购买历史, 每条记录一行, 保持输入顺序
pub fn customer_type_history<'a, I>(records: I, customer_type: &str, sku: &str) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let wanted = customer_type.trim();
    records
        .into_iter()
        .filter(|r| r.trimmed_type() == wanted && r.sku == sku)
        .map(|r| {
            let (month_key, month_label) = r
                .month()
                .map(|m| (m.key, m.label))
                .unwrap_or_default();
            AggregateRow {
                dimension_value: r.customer.clone(),
                description: r.description.clone(),
                month_label,
                month_key,
                total_qty: r.qty.clone(),
                representative_price: r.unit_price.clone(),
                representative_cost: r.unit_cost.clone(),
            }
        })
        .collect()
}
