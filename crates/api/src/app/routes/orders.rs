use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use stockroom_core::{DomainError, OrderId};
use stockroom_orders::{OrderLineRequest, OrderStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).patch(update_order_status))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.orders.list().await {
        Ok(orders) => {
            let items = orders
                .iter()
                .map(dto::order_summary_to_json)
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::Value::Array(items))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let mut lines = Vec::with_capacity(body.items.len());
    for item in &body.items {
        let product_id = match item.product_id.parse() {
            Ok(v) => v,
            Err(e) => return errors::domain_error_to_response(e),
        };
        let quantity = match u64::try_from(item.quantity) {
            Ok(v) => v,
            Err(_) => {
                return errors::domain_error_to_response(DomainError::validation(
                    "line quantity must be positive",
                ));
            }
        };
        lines.push(OrderLineRequest {
            product_id,
            quantity,
        });
    }

    match services.fulfillment.create_order(lines).await {
        Ok(order) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "id": order.id.to_string(),
                "total": order.total,
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.orders.get(id).await {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderStatusRequest>,
) -> axum::response::Response {
    let id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let status: OrderStatus = match body.status.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.orders.update_status(id, status).await {
        Ok(order) => (StatusCode::OK, Json(dto::order_summary_to_json(&order))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
