//! Typed bookstore services. Each one is a thin, cloneable wrapper over a
//! shared [`ApiClient`](crate::client::ApiClient).

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod profile;

pub use addresses::AddressService;
pub use auth::AuthService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use orders::OrderService;
pub use profile::ProfileService;
