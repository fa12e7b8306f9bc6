use crate::models::{AggregateRow, InvoiceSnapshot, SummaryRow};
use crate::utils::format_money;
use csv::{Writer, WriterBuilder};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV 缓冲区错误: {0}")]
    Io(#[from] std::io::Error),
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// 月度汇总行导出为 CSV; `dimension_header` 为第一列表头 (Customer / SKU)
pub fn aggregate_rows_to_csv(rows: &[AggregateRow], dimension_header: &str) -> Result<String, ExportError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record([
        dimension_header,
        "Description",
        "Month",
        "Month Key",
        "Total Qty",
        "Price",
        "Cost",
    ])?;

    for row in rows {
        writer.write_record([
            row.dimension_value.clone(),
            row.description.clone(),
            row.month_label.clone(),
            row.month_key.clone(),
            row.total_qty.to_string(),
            format_money(&row.representative_price),
            format_money(&row.representative_cost),
        ])?;
    }

    finish(writer)
}

pub fn summary_rows_to_csv(rows: &[SummaryRow]) -> Result<String, ExportError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["SKU", "Description", "Customers", "Min Price", "Max Price"])?;
    for row in rows {
        writer.write_record([
            row.sku.clone(),
            row.description.clone(),
            row.customer_count.to_string(),
            format_money(&row.min_price),
            format_money(&row.max_price),
        ])?;
    }
    finish(writer)
}

/// 发票快照导出: 抬头 + 明细 + 合计, 行长不一
pub fn invoice_to_csv(snapshot: &InvoiceSnapshot) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    let header = &snapshot.header;

    writer.write_record(["Invoice", header.invoice_number.as_str()])?;
    writer.write_record(["Date", &snapshot.generated_at.to_rfc3339()])?;
    writer.write_record(["Customer", header.customer.as_str()])?;
    writer.write_record(["Contact Name", header.contact_name.as_str()])?;
    writer.write_record(["Phone", header.contact_phone.as_str()])?;
    writer.write_record(["Email", header.contact_email.as_str()])?;
    writer.write_record(["Address", header.customer_address.as_str()])?;

    writer.write_record(["SKU", "Description", "Qty", "Unit Price", "Line Total"])?;
    for item in &snapshot.items {
        writer.write_record([
            item.sku.clone(),
            item.description.clone(),
            item.qty.to_string(),
            format_money(&item.unit_price),
            format_money(&item.line_total()),
        ])?;
    }

    writer.write_record(["Subtotal".to_string(), format_money(&snapshot.subtotal)])?;
    writer.write_record([
        format!("Tax ({}%)", format_money(&header.tax_pct)),
        format_money(&snapshot.tax),
    ])?;
    writer.write_record(["Total".to_string(), format_money(&snapshot.grand_total)])?;

    finish(writer)
}
