use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "module": "recon",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
