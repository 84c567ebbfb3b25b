//! Shopping cart.

use super::catalog::require_id;
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{AddCartItem, Cart, QuantityUpdate};
use bridge_traits::HttpMethod;
use core_runtime::events::{CartEvent, CoreEvent, EventBus};
use tracing::{info, instrument};

/// Largest quantity of a single book per cart line.
pub const MAX_QUANTITY: u32 = 99;

#[derive(Clone)]
pub struct CartService {
    client: ApiClient,
    events: EventBus,
}

impl CartService {
    pub fn new(client: ApiClient, events: EventBus) -> Self {
        Self { client, events }
    }

    pub async fn get_cart(&self) -> Result<Cart> {
        self.client.get("/cart").await
    }

    #[instrument(skip(self))]
    pub async fn add_item(&self, book_id: &str, quantity: u32) -> Result<Cart> {
        let book_id = require_id(book_id)?;
        check_quantity(quantity)?;

        let cart: Cart = self
            .client
            .post("/cart/items", &AddCartItem { book_id, quantity })
            .await?;

        info!(book_id, quantity, "Added to cart");
        self.emit(CartEvent::ItemAdded {
            book_id: book_id.to_string(),
            quantity,
        });
        Ok(cart)
    }

    #[instrument(skip(self))]
    pub async fn update_quantity(&self, item_id: &str, quantity: u32) -> Result<Cart> {
        let item_id = require_id(item_id)?;
        check_quantity(quantity)?;

        let cart: Cart = self
            .client
            .patch(&format!("/cart/items/{}", item_id), &QuantityUpdate { quantity })
            .await?;

        self.emit(CartEvent::QuantityChanged {
            item_id: item_id.to_string(),
            quantity,
        });
        Ok(cart)
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, item_id: &str) -> Result<()> {
        let item_id = require_id(item_id)?;
        self.client
            .execute(HttpMethod::Delete, &format!("/cart/items/{}", item_id))
            .await?;

        self.emit(CartEvent::ItemRemoved {
            item_id: item_id.to_string(),
        });
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.client.execute(HttpMethod::Delete, "/cart").await?;
        info!("Cart cleared");
        self.emit(CartEvent::Cleared);
        Ok(())
    }

    fn emit(&self, event: CartEvent) {
        let _ = self.events.emit(CoreEvent::Cart(event));
    }
}

fn check_quantity(quantity: u32) -> Result<()> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(ApiError::validation(
            "quantity",
            format!("must be between 1 and {}", MAX_QUANTITY),
        ));
    }
    Ok(())
}
