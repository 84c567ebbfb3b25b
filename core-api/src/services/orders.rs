//! Checkout and order history.

use super::catalog::require_id;
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{CheckoutRequest, Order, OrderQuery, Page};
use core_runtime::events::{CoreEvent, EventBus, OrderEvent};
use serde_json::json;
use tracing::{info, instrument};

/// Longest delivery note accepted at checkout.
pub const MAX_NOTE_LENGTH: usize = 500;

#[derive(Clone)]
pub struct OrderService {
    client: ApiClient,
    events: EventBus,
}

impl OrderService {
    pub fn new(client: ApiClient, events: EventBus) -> Self {
        Self { client, events }
    }

    /// Place an order for the current cart contents.
    #[instrument(skip(self, request), fields(payment = ?request.payment_method))]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<Order> {
        require_id(&request.address_id)
            .map_err(|_| ApiError::validation("addressId", "a shipping address is required"))?;
        if let Some(note) = &request.note {
            if note.chars().count() > MAX_NOTE_LENGTH {
                return Err(ApiError::validation(
                    "note",
                    format!("must be at most {} characters", MAX_NOTE_LENGTH),
                ));
            }
        }

        let order: Order = self.client.post("/orders", &request).await?;

        info!(order_id = %order.id, total = order.total_price, "Order placed");
        let _ = self.events.emit(CoreEvent::Order(OrderEvent::Placed {
            order_id: order.id.clone(),
        }));
        Ok(order)
    }

    pub async fn list_orders(&self, query: OrderQuery) -> Result<Page<Order>> {
        self.client
            .get_with_query("/orders", &query.normalized())
            .await
    }

    pub async fn get_order(&self, id: &str) -> Result<Order> {
        let id = require_id(id)?;
        self.client.get(&format!("/orders/{}", id)).await
    }

    #[instrument(skip(self))]
    pub async fn cancel_order(&self, id: &str) -> Result<Order> {
        let id = require_id(id)?;
        let order: Order = self
            .client
            .patch(&format!("/orders/{}/cancel", id), &json!({}))
            .await?;

        info!(order_id = %order.id, "Order cancelled");
        let _ = self.events.emit(CoreEvent::Order(OrderEvent::Cancelled {
            order_id: order.id.clone(),
        }));
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderStatus, PaymentMethod};
    use crate::test_support::{answering, harness, json_body, untouched, url};
    use bridge_traits::HttpMethod;

    const ORDER: &str = r#"{"result":{"id":501,"status":"pending","items":[{"bookId":42,"quantity":1,"price":12.0}],"totalPrice":12.0,"paymentMethod":"cod"},"statusCode":201}"#;

    #[tokio::test]
    async fn test_checkout_places_order_and_emits() {
        let http = answering(
            |req| {
                req.method == HttpMethod::Post
                    && req.url == url("/orders")
                    && json_body(req)
                        == json!({"addressId": "3", "paymentMethod": "cod", "note": "Leave at door"})
            },
            201,
            ORDER,
        );
        let h = harness(http).await;
        let mut rx = h.events.subscribe();
        let orders = OrderService::new(h.client, h.events.clone());

        let order = orders
            .checkout(CheckoutRequest::new("3", PaymentMethod::Cod).with_note("Leave at door"))
            .await
            .unwrap();

        assert_eq!(order.id, "501");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(
            rx.try_recv().unwrap(),
            CoreEvent::Order(OrderEvent::Placed {
                order_id: "501".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_checkout_requires_address() {
        let h = harness(untouched()).await;
        let orders = OrderService::new(h.client, h.events.clone());

        let err = orders
            .checkout(CheckoutRequest::new(" ", PaymentMethod::Card))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { ref field, .. } if field == "addressId"));

        let long_note = "x".repeat(MAX_NOTE_LENGTH + 1);
        let err = orders
            .checkout(CheckoutRequest::new("3", PaymentMethod::Card).with_note(long_note))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { ref field, .. } if field == "note"));
    }

    #[tokio::test]
    async fn test_list_orders_filters_by_status() {
        let http = answering(
            |req| req.url == url("/orders?page=1&limit=20&status=delivered"),
            200,
            r#"{"result":{"items":[],"total":0,"page":1,"limit":20}}"#,
        );
        let h = harness(http).await;

        let page = OrderService::new(h.client, h.events.clone())
            .list_orders(OrderQuery {
                status: Some(OrderStatus::Delivered),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn test_cancel_order() {
        let http = answering(
            |req| req.method == HttpMethod::Patch && req.url == url("/orders/501/cancel"),
            200,
            r#"{"result":{"id":"501","status":"cancelled","totalPrice":12.0}}"#,
        );
        let h = harness(http).await;
        let mut rx = h.events.subscribe();

        let order = OrderService::new(h.client, h.events.clone())
            .cancel_order("501")
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(
            rx.try_recv().unwrap(),
            CoreEvent::Order(OrderEvent::Cancelled {
                order_id: "501".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_get_order_of_someone_else_is_api_error() {
        let http = answering(
            |req| req.url == url("/orders/9"),
            400,
            r#"{"message":"Order does not belong to user","statusCode":400}"#,
        );
        let h = harness(http).await;

        let err = OrderService::new(h.client, h.events.clone())
            .get_order("9")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Api { status: 400, .. }));
    }
}
