use std::sync::Arc;

use used_car_dashboard::{
    dashboard_config_from_env, dashboard_router, init_logging, load_listings, log_app_bind,
    log_app_start, log_dataset_ready,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = dashboard_config_from_env()?;
    init_logging(&config.logging)?;
    log_app_start(&config);

    // The dashboard has nothing to show without its dataset.
    let dataset = Arc::new(load_listings(&config.data_path)?);
    log_dataset_ready(&dataset);

    let app = dashboard_router(dataset);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let bound_addr = listener.local_addr()?;

    log_app_bind(bound_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
