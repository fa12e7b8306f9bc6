use axum::{
    routing::{get, post, put},
    Router,
};
use sales_ledger_rust::{api, load_records, AppConfig};
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // 一次性加载交易记录, 之后只读
    let store = load_records(&config.data.records_path)?;
    info!(
        "Record store ready: {} records, {} customers, reduction = {:?}",
        store.len(),
        store.customers().len(),
        config.report.reduction
    );

    let state = api::AppState::new(store, &config);

    // 报表路由
    let report_routes = Router::new()
        .route("/api/products", get(api::list_products))
        .route("/api/products/skus", get(api::list_sku_options))
        .route("/api/products/:sku/breakdown", get(api::sku_breakdown))
        .route("/api/products/:sku/breakdown.csv", get(api::sku_breakdown_csv))
        .route("/api/customers", get(api::list_customers))
        .route("/api/customers/:customer/breakdown", get(api::customer_breakdown))
        .route("/api/customers/:customer/breakdown.csv", get(api::customer_breakdown_csv))
        .route("/api/types", get(api::list_customer_types))
        .route("/api/types/:type/summary", get(api::customer_type_summary))
        .route("/api/types/:type/summary.csv", get(api::customer_type_summary_csv))
        .route("/api/types/:type/skus/:sku/history", get(api::customer_type_history));

    // 开票路由
    let invoice_routes = Router::new()
        .route("/api/invoices", post(api::create_invoice))
        .route("/api/invoices/:id", get(api::get_invoice).delete(api::delete_invoice))
        .route("/api/invoices/:id/header", put(api::update_invoice_header))
        .route("/api/invoices/:id/reset", post(api::reset_invoice))
        .route("/api/invoices/:id/search", get(api::search_products))
        .route("/api/invoices/:id/items", post(api::add_invoice_item))
        .route(
            "/api/invoices/:id/items/:index",
            axum::routing::patch(api::update_invoice_item).delete(api::remove_invoice_item),
        )
        .route("/api/invoices/:id/export", get(api::export_invoice))
        .route("/api/invoices/:id/export.csv", get(api::export_invoice_csv));

    let app = Router::new()
        .route("/health", get(api::health_check))
        .merge(report_routes)
        .merge(invoice_routes)
        .with_state(state)
        .layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
