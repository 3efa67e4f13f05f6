pub mod api;
pub mod dashboards;
pub mod routes;
pub mod shared;
pub mod system;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::http::{header, Method};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};

    use crate::api::state::AppState;
    use crate::dashboards::d402_sales_panel::repository::SalesRepository;
    use crate::dashboards::d402_sales_panel::service::SalesPanelService;

    system::tracing::initialize()?;

    let config = shared::config::load_config()?;

    // Initialize database (creates the sales schema if missing)
    let db_path = shared::config::get_database_path(&config);
    shared::data::db::initialize_database(Some(&db_path.to_string_lossy()))
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;

    if config.dashboard.seed_demo_data {
        system::initialization::seed_demo_sales_if_empty(shared::data::db::get_connection())
            .await?;
    }

    let repository = SalesRepository::new(shared::data::db::get_connection().clone());
    let service = SalesPanelService::new(Arc::new(repository), &config.dashboard);
    let state = AppState::new(
        Arc::new(service),
        Duration::from_secs(config.dashboard.session_max_idle_hours * 3600),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = routes::configure_routes(state).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Sales panel listening on http://{}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
