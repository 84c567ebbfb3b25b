//! # Bookstore API
//!
//! Typed access to the bookstore backend. Every call goes through the
//! [`AuthGateway`](core_auth::AuthGateway), so credential expiry is handled
//! before a service ever sees the response.
//!
//! Responses use the envelope `{ result, message, statusCode }`; a failed
//! status (HTTP or envelope) surfaces as [`ApiError::Api`] or
//! [`ApiError::NotFound`], and inputs the backend would reject are caught
//! locally as [`ApiError::Validation`].

pub mod client;
pub mod envelope;
pub mod error;
pub mod models;
pub mod services;

#[cfg(test)]
mod test_support;

pub use client::ApiClient;
pub use error::{ApiError, Result};
pub use models::{
    Address, AddressInput, Book, BookQuery, BookSort, Cart, CartItem, Category, CheckoutRequest,
    Order, OrderItem, OrderQuery, OrderStatus, Page, PaymentMethod, ProfileUpdate,
    RegisterRequest, UserProfile,
};
pub use services::{
    AddressService, AuthService, CartService, CatalogService, OrderService, ProfileService,
};
