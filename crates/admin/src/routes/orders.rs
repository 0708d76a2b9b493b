//! Order management: listing, status changes and deletion.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use sonic_core::{OrderId, OrderStatus, PaymentStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireEditor, RequireStaff};
use crate::models::{Order, OrderFilter, Page, Paginated, StatusUpdate};
use crate::state::AppState;

/// Query string of `GET /api/orders`.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `GET /api/orders`
///
/// Newest first, paginated.
#[instrument(skip(_staff, state))]
pub async fn list(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Paginated<Order>>> {
    let filter = OrderFilter {
        order_status: query.status,
        payment_status: query.payment_status,
    };
    let page = Page::new(query.page, query.per_page);

    let (orders, total) = OrderRepository::new(state.pool()).list(filter, page).await?;
    Ok(Json(Paginated::new(orders, page, total)))
}

/// `GET /api/orders/{id}`
#[instrument(skip(_staff, state))]
pub async fn show(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))
}

/// `PUT /api/orders/{id}/status`
#[instrument(skip_all, fields(user_id = %staff.id, order_id = %id))]
pub async fn update_status(
    RequireEditor(staff): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    if update.is_empty() {
        return Err(AppError::BadRequest(
            "order_status or payment_status is required".to_string(),
        ));
    }

    let order = OrderRepository::new(state.pool())
        .update_status(id, update)
        .await?;

    tracing::info!(
        order_number = %order.order_number,
        order_status = %order.order_status,
        payment_status = %order.payment_status,
        "Order status updated"
    );
    Ok(Json(order))
}

/// `DELETE /api/orders/{id}`
#[instrument(skip_all, fields(user_id = %staff.id, order_id = %id))]
pub async fn delete(
    RequireAdmin(staff): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    OrderRepository::new(state.pool()).delete(id).await?;

    tracing::warn!("Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::extract::Query;
    use axum::http::Uri;

    use super::*;

    fn parse(uri: &str) -> OrdersQuery {
        let uri: Uri = uri.parse().unwrap();
        Query::<OrdersQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_query_parsing() {
        let query = parse("/api/orders?status=shipped&payment_status=paid&page=3&per_page=50");
        assert_eq!(query.status, Some(OrderStatus::Shipped));
        assert_eq!(query.payment_status, Some(PaymentStatus::Paid));
        assert_eq!(query.page, Some(3));
        assert_eq!(query.per_page, Some(50));
    }

    #[test]
    fn test_empty_query() {
        let query = parse("/api/orders");
        assert!(query.status.is_none());
        assert_eq!(Page::new(query.page, query.per_page), Page::new(None, None));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let uri: Uri = "/api/orders?status=lost".parse().unwrap();
        assert!(Query::<OrdersQuery>::try_from_uri(&uri).is_err());
    }
}
