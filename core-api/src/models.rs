//! Domain models exchanged with the bookstore backend.
//!
//! Identifiers are kept as strings; the backend sends them either as numbers
//! or as strings depending on the resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Largest page size the backend serves.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when a query does not set one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    /// Price before discount, when the book is on sale
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Discount in whole percent, if the book is on sale.
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?;
        if original <= 0.0 || self.price >= original {
            return None;
        }
        Some((((original - self.price) / original) * 100.0).round() as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookSort {
    Newest,
    PriceAsc,
    PriceDesc,
    TitleAsc,
    BestSelling,
}

/// Filters for `GET /books`. Unset fields are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<BookSort>,
}

impl BookQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn sort(mut self, sort: BookSort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Clamp paging into the served range and drop a blank search term.
    pub fn normalized(mut self) -> Self {
        self.page = Some(self.page.unwrap_or(1).max(1));
        self.limit = Some(clamp_page_size(self.limit));
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        for price in [self.min_price, self.max_price].into_iter().flatten() {
            if !price.is_finite() || price < 0.0 {
                return Err("Price bounds must be non-negative".to_string());
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(format!("Minimum price {} exceeds maximum price {}", min, max));
            }
        }
        Ok(())
    }
}

fn clamp_page_size(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// One page of a listing. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(alias = "data")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn first_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit)) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

// ============================================================================
// Cart
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub book_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub quantity: u32,
    pub price: f64,
}

impl CartItem {
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_price: Option<f64>,
}

impl Cart {
    /// Number of books in the cart, counting quantities.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Server total when provided, otherwise the sum of line subtotals.
    pub fn total(&self) -> f64 {
        self.total_price
            .unwrap_or_else(|| self.items.iter().map(CartItem::subtotal).sum())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddCartItem<'a> {
    pub book_id: &'a str,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QuantityUpdate {
    pub quantity: u32,
}

// ============================================================================
// Orders
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[serde(alias = "PENDING")]
    Pending,
    #[serde(alias = "CONFIRMED")]
    Confirmed,
    #[serde(alias = "SHIPPING")]
    Shipping,
    #[serde(alias = "DELIVERED")]
    Delivered,
    #[serde(alias = "CANCELLED")]
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Orders can be cancelled until they leave the warehouse.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    BankTransfer,
    Card,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub book_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total_price: f64,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub address_id: String,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CheckoutRequest {
    pub fn new(address_id: impl Into<String>, payment_method: PaymentMethod) -> Self {
        Self {
            address_id: address_id.into(),
            payment_method,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl OrderQuery {
    pub fn normalized(mut self) -> Self {
        self.page = Some(self.page.unwrap_or(1).max(1));
        self.limit = Some(clamp_page_size(self.limit));
        self
    }
}

// ============================================================================
// Address book
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub street: String,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    pub city: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Fields for creating or replacing an address.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub full_name: String,
    pub phone: String,
    pub street: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    pub city: String,
    pub is_default: bool,
}

impl AddressInput {
    /// Returns the offending field and a message.
    pub fn validate(&self) -> Result<(), (&'static str, String)> {
        let required = [
            ("fullName", &self.full_name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("city", &self.city),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err((field, "is required".to_string()));
            }
        }

        if !is_phone_number(&self.phone) {
            return Err(("phone", format!("'{}' is not a valid phone number", self.phone)));
        }

        Ok(())
    }
}

fn is_phone_number(phone: &str) -> bool {
    let phone = phone.trim();
    let body = phone.strip_prefix('+').unwrap_or(phone);
    let digits = body.chars().filter(char::is_ascii_digit).count();
    body.chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-' || c == '.')
        && (8..=15).contains(&digits)
}

// ============================================================================
// Account
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.phone.is_none() && self.avatar.is_none()
    }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

// Keeps the password out of logs and panics.
impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("full_name", &self.full_name)
            .finish()
    }
}

#[derive(Serialize)]
pub(crate) struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PasswordChange<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResult {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Loose shape check: something before `@`, a dotted domain after it.
pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split('.')
                    .filter(|part| !part.is_empty())
                    .count()
                    >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}
