use crate::config::{AppConfig, CompanyProfile};
use crate::models::{
    AggregateRow, CandidateProduct, InvoiceHeader, InvoiceSnapshot, InvoiceTotals, LineItem,
    Reduction, SkuOption, SummaryRow, TransactionRecord,
};
use crate::service::{
    aggregator, catalog, export, sort_rows, Direction, InvoiceLedger, Sortable,
};
use crate::store::{sku_options, RecordStore};
use crate::utils::decimal_from_value;
use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// 共享状态: 只读记录集 + 各开票会话的台账
#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub reduction: Reduction,
    pub search_limit: usize,
    pub max_sessions: usize,
    pub company: Arc<CompanyProfile>,
    pub sessions: Arc<DashMap<String, InvoiceLedger>>,
}

impl AppState {
    pub fn new(store: RecordStore, config: &AppConfig) -> Self {
        Self {
            store,
            reduction: config.report.reduction,
            search_limit: config.invoice.search_limit,
            max_sessions: config.invoice.max_sessions,
            company: Arc::new(config.invoice.company.clone()),
            sessions: Arc::new(DashMap::new()),
        }
    }
}

/// 通用响应体
#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

fn not_found(message: String) -> Response {
    tracing::warn!("{}", message);
    let body = ApiMessage {
        success: false,
        message,
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

fn export_failed(err: export::ExportError) -> Response {
    tracing::error!("CSV export failed: {}", err);
    let body = ApiMessage {
        success: false,
        message: format!("Error: {}", err),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

fn csv_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response()
}

/// 表格查询参数: `q` 关键字, `sort` 列键, `dir` asc/desc
#[derive(Debug, Default, Deserialize)]
pub struct TableQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<Direction>,
}

impl TableQuery {
    fn apply<R: Sortable + Clone>(&self, rows: Vec<R>) -> Vec<R> {
        match self.sort.as_deref() {
            Some(key) if !key.is_empty() => sort_rows(&rows, key, self.dir.unwrap_or_default()),
            _ => rows,
        }
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 商品列表 (按描述过滤)
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> Json<Vec<TransactionRecord>> {
    let term = query.q.unwrap_or_default();
    let rows = state
        .store
        .filter_by_description(&term)
        .into_iter()
        .cloned()
        .collect();
    Json(rows)
}

/// SKU 下拉选项 (同样按描述过滤)
pub async fn list_sku_options(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> Json<Vec<SkuOption>> {
    let term = query.q.unwrap_or_default();
    Json(sku_options(state.store.filter_by_description(&term)))
}

/// 某 SKU 按客户 x 月份的明细
pub async fn sku_breakdown(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Query(query): Query<TableQuery>,
) -> Json<Vec<AggregateRow>> {
    let rows = aggregator::sku_breakdown(state.store.by_sku(&sku), state.reduction);
    Json(query.apply(rows))
}

pub async fn list_customers(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.store.customers())
}

/// 某客户按 SKU x 月份的明细, `q` 过滤描述
pub async fn customer_breakdown(
    State(state): State<AppState>,
    Path(customer): Path<String>,
    Query(query): Query<TableQuery>,
) -> Json<Vec<AggregateRow>> {
    let records = state.store.by_customer(&customer, query.q.as_deref());
    let rows = aggregator::customer_breakdown(records, state.reduction);
    Json(query.apply(rows))
}

pub async fn list_customer_types(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.store.customer_types())
}

pub async fn customer_type_summary(
    State(state): State<AppState>,
    Path(customer_type): Path<String>,
    Query(query): Query<TableQuery>,
) -> Json<Vec<SummaryRow>> {
    let rows = aggregator::summarize_customer_type(state.store.records(), &customer_type);
    Json(query.apply(rows))
}

pub async fn customer_type_history(
    State(state): State<AppState>,
    Path((customer_type, sku)): Path<(String, String)>,
    Query(query): Query<TableQuery>,
) -> Json<Vec<AggregateRow>> {
    let rows = aggregator::customer_type_history(state.store.records(), &customer_type, &sku);
    Json(query.apply(rows))
}

pub async fn sku_breakdown_csv(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Query(query): Query<TableQuery>,
) -> Response {
    let rows = query.apply(aggregator::sku_breakdown(state.store.by_sku(&sku), state.reduction));
    match export::aggregate_rows_to_csv(&rows, "Customer") {
        Ok(body) => csv_response(body),
        Err(e) => export_failed(e),
    }
}

pub async fn customer_breakdown_csv(
    State(state): State<AppState>,
    Path(customer): Path<String>,
    Query(query): Query<TableQuery>,
) -> Response {
    let records = state.store.by_customer(&customer, query.q.as_deref());
    let rows = query.apply(aggregator::customer_breakdown(records, state.reduction));
    match export::aggregate_rows_to_csv(&rows, "SKU") {
        Ok(body) => csv_response(body),
        Err(e) => export_failed(e),
    }
}

pub async fn customer_type_summary_csv(
    State(state): State<AppState>,
    Path(customer_type): Path<String>,
    Query(query): Query<TableQuery>,
) -> Response {
    let rows = query.apply(aggregator::summarize_customer_type(state.store.records(), &customer_type));
    match export::summary_rows_to_csv(&rows) {
        Ok(body) => csv_response(body),
        Err(e) => export_failed(e),
    }
}

/// 台账视图
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerView {
    pub invoice_id: String,
    pub header: InvoiceHeader,
    pub items: Vec<LineItem>,
    pub totals: InvoiceTotals,
}

impl LedgerView {
    fn of(invoice_id: &str, ledger: &InvoiceLedger) -> Self {
        Self {
            invoice_id: invoice_id.to_string(),
            header: ledger.header().clone(),
            items: ledger.items().to_vec(),
            totals: ledger.compute_totals(),
        }
    }
}

/// 抬头更新; 缺省字段保持不变
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHeaderRequest {
    pub invoice_number: Option<String>,
    pub customer: Option<String>,
    pub tax_pct: Option<Value>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub customer_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub sku: String,
    /// 搜索结果中选中的描述; 缺省时取该 SKU 最新记录的描述
    pub description: Option<String>,
    /// 缺省时取客户最近一次购买价
    pub unit_price: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub qty: Option<Value>,
    pub unit_price: Option<Value>,
}

/// 开票导出文档: 开票方信息 + 快照
#[derive(Debug, Serialize)]
pub struct InvoiceDocument {
    pub company: CompanyProfile,
    pub invoice: InvoiceSnapshot,
}

fn session_missing(invoice_id: &str) -> Response {
    not_found(format!("Invoice session {} not found", invoice_id))
}

/// 新建开票会话; 会话只在 DELETE 时释放, 达到上限后拒绝新建
pub async fn create_invoice(State(state): State<AppState>) -> Response {
    if state.sessions.len() >= state.max_sessions {
        tracing::warn!("Invoice session limit {} reached", state.max_sessions);
        let body = ApiMessage {
            success: false,
            message: format!(
                "Too many open invoice sessions ({}), close one with DELETE first",
                state.max_sessions
            ),
        };
        return (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    }

    let invoice_id = uuid::Uuid::new_v4().to_string();
    let ledger = InvoiceLedger::new();
    let view = LedgerView::of(&invoice_id, &ledger);
    state.sessions.insert(invoice_id.clone(), ledger);
    tracing::info!("Invoice session {} created ({} active)", invoice_id, state.sessions.len());
    (StatusCode::CREATED, Json(view)).into_response()
}

pub async fn get_invoice(State(state): State<AppState>, Path(invoice_id): Path<String>) -> Response {
    match state.sessions.get(&invoice_id) {
        Some(ledger) => Json(LedgerView::of(&invoice_id, &ledger)).into_response(),
        None => session_missing(&invoice_id),
    }
}

pub async fn delete_invoice(State(state): State<AppState>, Path(invoice_id): Path<String>) -> Response {
    match state.sessions.remove(&invoice_id) {
        Some(_) => {
            tracing::info!("Invoice session {} closed", invoice_id);
            Json(ApiMessage {
                success: true,
                message: format!("Invoice session {} closed", invoice_id),
            })
            .into_response()
        }
        None => session_missing(&invoice_id),
    }
}

/// 新开票: 清空明细与抬头
pub async fn reset_invoice(State(state): State<AppState>, Path(invoice_id): Path<String>) -> Response {
    let Some(mut ledger) = state.sessions.get_mut(&invoice_id) else {
        return session_missing(&invoice_id);
    };
    ledger.reset();
    Json(LedgerView::of(&invoice_id, &ledger)).into_response()
}

pub async fn update_invoice_header(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    Json(req): Json<UpdateHeaderRequest>,
) -> Response {
    let Some(mut ledger) = state.sessions.get_mut(&invoice_id) else {
        return session_missing(&invoice_id);
    };

    let mut header = ledger.header().clone();
    if let Some(v) = req.customer {
        header.customer = v;
    }
    if let Some(v) = req.invoice_number {
        header.invoice_number = v;
    }
    if let Some(v) = req.tax_pct {
        header.tax_pct = decimal_from_value(&v).unwrap_or_default();
    }
    if let Some(v) = req.contact_name {
        header.contact_name = v;
    }
    if let Some(v) = req.contact_phone {
        header.contact_phone = v;
    }
    if let Some(v) = req.contact_email {
        header.contact_email = v;
    }
    if let Some(v) = req.customer_address {
        header.customer_address = v;
    }
    ledger.set_header(header);

    Json(LedgerView::of(&invoice_id, &ledger)).into_response()
}

/// 搜索候选商品, 范围取当前发票的客户
pub async fn search_products(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    Query(query): Query<TableQuery>,
) -> Response {
    let customer = match state.sessions.get(&invoice_id) {
        Some(ledger) => ledger.header().customer.clone(),
        None => return session_missing(&invoice_id),
    };

    let term = query.q.unwrap_or_default();
    let candidates: Vec<CandidateProduct> = catalog::search_with_limit(
        state.store.records(),
        &term,
        Some(customer.as_str()),
        state.search_limit,
    );
    Json(candidates).into_response()
}

pub async fn add_invoice_item(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Response {
    let Some(mut ledger) = state.sessions.get_mut(&invoice_id) else {
        return session_missing(&invoice_id);
    };

    let customer = ledger.header().customer.clone();
    let Some(candidate) = catalog::candidate_for_sku(
        state.store.records(),
        &req.sku,
        req.description.as_deref(),
        Some(customer.as_str()),
    ) else {
        return not_found(format!("SKU {} not found", req.sku));
    };

    let price = match req.unit_price.as_ref() {
        Some(v) => decimal_from_value(v).unwrap_or_default(),
        None => candidate.suggested_price.clone(),
    };
    ledger.add_item(&candidate, price);
    Json(LedgerView::of(&invoice_id, &ledger)).into_response()
}

pub async fn update_invoice_item(
    State(state): State<AppState>,
    Path((invoice_id, index)): Path<(String, usize)>,
    Json(req): Json<UpdateItemRequest>,
) -> Response {
    let Some(mut ledger) = state.sessions.get_mut(&invoice_id) else {
        return session_missing(&invoice_id);
    };

    if index >= ledger.items().len() {
        return not_found(format!("Invoice {} has no line {}", invoice_id, index));
    }
    if let Some(qty) = req.qty {
        ledger.update_qty(index, decimal_from_value(&qty));
    }
    if let Some(price) = req.unit_price {
        ledger.update_price(index, decimal_from_value(&price));
    }
    Json(LedgerView::of(&invoice_id, &ledger)).into_response()
}

pub async fn remove_invoice_item(
    State(state): State<AppState>,
    Path((invoice_id, index)): Path<(String, usize)>,
) -> Response {
    let Some(mut ledger) = state.sessions.get_mut(&invoice_id) else {
        return session_missing(&invoice_id);
    };

    match ledger.remove_item(index) {
        Some(_) => Json(LedgerView::of(&invoice_id, &ledger)).into_response(),
        None => not_found(format!("Invoice {} has no line {}", invoice_id, index)),
    }
}

pub async fn export_invoice(State(state): State<AppState>, Path(invoice_id): Path<String>) -> Response {
    let snapshot = match state.sessions.get(&invoice_id) {
        Some(ledger) => ledger.snapshot(),
        None => return session_missing(&invoice_id),
    };

    let document = InvoiceDocument {
        company: state.company.as_ref().clone(),
        invoice: snapshot,
    };
    Json(document).into_response()
}

pub async fn export_invoice_csv(State(state): State<AppState>, Path(invoice_id): Path<String>) -> Response {
    let snapshot = match state.sessions.get(&invoice_id) {
        Some(ledger) => ledger.snapshot(),
        None => return session_missing(&invoice_id),
    };

    match export::invoice_to_csv(&snapshot) {
        Ok(body) => csv_response(body),
        Err(e) => export_failed(e),
    }
}
