use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// 带时间的日期格式 (按顺序尝试)
const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
];

/// 纯日期格式; 月份名解析时长短写都接受 ("Jan" / "January")
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%Y.%m.%d",
    "%b %d, %Y",
    "%d %b %Y",
];

/// 解析交易日期, 无法识别时返回 None
pub fn parse_record_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// 月份排序键 `YYYY-MM`
pub fn month_key(date: &NaiveDateTime) -> String {
    date.format("%Y-%m").to_string()
}

/// 月份显示标签, 例如 "Jan 2024" (只用于展示, 不可用于排序)
pub fn month_label(date: &NaiveDateTime) -> String {
    date.format("%b %Y").to_string()
}

/// 默认发票号: `YYYYMMDD-001`
pub fn generate_invoice_number(today: NaiveDate) -> String {
    format!("{}-001", today.format("%Y%m%d"))
}

/// 解析十进制字符串, 空串或非数字返回 None
pub fn parse_decimal(raw: &str) -> Option<BigDecimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    BigDecimal::from_str(trimmed).ok()
}

/// 从 JSON 值中取数字 (数字或数字字符串)
pub fn decimal_from_value(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// 宽松数字字段: 缺失/null/非数字一律为 0
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(decimal_from_value)
        .unwrap_or_else(BigDecimal::zero))
}

/// 宽松文本字段: 接受字符串/数字/布尔, 其余为空串
pub fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// 金额格式化为两位小数 (四舍五入, 远离零)
pub fn format_money(value: &BigDecimal) -> String {
    let half = BigDecimal::from_str("0.5").unwrap_or_else(|_| BigDecimal::zero());
    let cents = value * BigDecimal::from(100);
    let rounded = if cents < BigDecimal::zero() {
        (cents - half).with_scale(0)
    } else {
        (cents + half).with_scale(0)
    };
    (rounded / BigDecimal::from(100)).with_scale(2).to_string()
}
