use serde::Deserialize;

use stockroom_orders::Order;
use stockroom_products::Product;

// -------------------------
// Request DTOs
// -------------------------

/// `price`/`quantity` are signed on the wire so that negative values become
/// domain validation errors (400) instead of deserialization failures.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

// -------------------------
// Response mapping
// -------------------------

pub fn product_to_json(product: &Product) -> serde_json::Value {
    serde_json::json!({
        "id": product.id.to_string(),
        "name": product.name,
        "description": product.description,
        "price": product.price,
        "quantity": product.quantity,
    })
}

/// Summary shape used by `GET /orders`: header fields without lines.
pub fn order_summary_to_json(order: &Order) -> serde_json::Value {
    serde_json::json!({
        "id": order.id.to_string(),
        "status": order.status,
        "total": order.total,
        "created_at": order.created_at,
    })
}

pub fn order_to_json(order: &Order) -> serde_json::Value {
    serde_json::json!({
        "id": order.id.to_string(),
        "status": order.status,
        "total": order.total,
        "created_at": order.created_at,
        "items": order
            .lines
            .iter()
            .map(|line| {
                serde_json::json!({
                    "product_id": line.product_id.to_string(),
                    "quantity": line.quantity,
                    "price": line.unit_price,
                })
            })
            .collect::<Vec<_>>(),
    })
}
