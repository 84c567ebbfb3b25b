//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP transport,
//! credential storage, session navigator) into the client core: one
//! [`EventBus`], one [`AuthGateway`] and the typed bookstore services on
//! top of it. Desktop apps typically enable the `desktop-shims` feature so
//! that missing capabilities fall back to the `bridge-desktop` adapters.
//!
//! ```ignore
//! use core_service::{BookstoreService, BookQuery};
//!
//! let core = BookstoreService::from_env()?;
//! core.auth().login("reader@books.example", "secret").await?;
//! let page = core.catalog().list_books(BookQuery::new().search("dune")).await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

pub use bridge_traits::{HttpClient, KeyValueStore, Notice, NoticeLevel, SessionNavigator};
pub use core_api::{
    Address, AddressInput, AddressService, ApiClient, ApiError, AuthService, Book, BookQuery,
    BookSort, Cart, CartItem, CartService, CatalogService, Category, CheckoutRequest, Order,
    OrderItem, OrderQuery, OrderService, OrderStatus, Page, PaymentMethod, ProfileService,
    ProfileUpdate, RegisterRequest, UserProfile,
};
pub use core_auth::{AuthError, AuthGateway, Credential, SignOutReason};
pub use core_runtime::events::{AuthEvent, CartEvent, CoreEvent, EventBus, EventStream, OrderEvent};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use core_runtime::{ClientConfig, ClientConfigBuilder};

use std::sync::Arc;
use tracing::info;

/// Primary façade exposed to host applications.
///
/// Cloning is cheap; clones share the gateway, and with it the single
/// refresh coordinator and the event bus.
#[derive(Clone)]
pub struct BookstoreService {
    config: Arc<ClientConfig>,
    events: EventBus,
    gateway: Arc<AuthGateway>,
    auth: AuthService,
    catalog: CatalogService,
    cart: CartService,
    orders: OrderService,
    addresses: AddressService,
    profile: ProfileService,
}

impl BookstoreService {
    /// Create a new service from a built configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let events = EventBus::new(config.event_buffer_size);
        let gateway = Arc::new(AuthGateway::from_config(&config, events.clone()));
        let client = ApiClient::from_config(Arc::clone(&gateway), &config);

        info!(base_url = %config.base_url, "Bookstore core initialized");

        Ok(Self {
            auth: AuthService::new(client.clone()),
            catalog: CatalogService::new(client.clone()),
            cart: CartService::new(client.clone(), events.clone()),
            orders: OrderService::new(client.clone(), events.clone()),
            addresses: AddressService::new(client.clone()),
            profile: ProfileService::new(client),
            config: Arc::new(config),
            events,
            gateway,
        })
    }

    /// Configuration from `BOOKSTORE_*` environment variables, with the
    /// default capabilities for the enabled features.
    pub fn from_env() -> Result<Self> {
        let config = ClientConfigBuilder::from_env()?.build()?;
        Self::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<AuthGateway> {
        &self.gateway
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn cart(&self) -> &CartService {
        &self.cart
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }

    pub fn addresses(&self) -> &AddressService {
        &self.addresses
    }

    pub fn profile(&self) -> &ProfileService {
        &self.profile
    }

    pub fn subscribe_events(&self) -> EventStream {
        self.events.stream()
    }
}
