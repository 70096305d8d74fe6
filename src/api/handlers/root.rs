use axum::response::IntoResponse;

/// Liveness text for load balancers and smoke tests.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is up", body = String)
    ),
    tag = "health"
)]
pub async fn root() -> impl IntoResponse {
    "The server is working."
}
