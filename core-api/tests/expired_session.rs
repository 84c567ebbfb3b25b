//! Services keep working across a credential expiry and stop cleanly when
//! the session cannot be recovered.

use async_trait::async_trait;
use bridge_traits::{
    HttpClient, HttpRequest, HttpResponse, KeyValueStore, MemoryStore, Notice, SessionNavigator,
};
use core_api::{ApiClient, ApiError, CartService, CatalogService};
use core_auth::{AuthError, AuthGateway, GatewaySettings};
use core_runtime::events::EventBus;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

const BASE: &str = "https://shop.test/api";

/// Accepts `C2` only; the refresh endpoint hands out `refresh_to`.
struct Backend {
    refresh_to: Option<&'static str>,
    refreshes: AtomicUsize,
}

#[async_trait]
impl HttpClient for Backend {
    async fn execute(&self, request: HttpRequest) -> bridge_traits::Result<HttpResponse> {
        let path = request.url.trim_start_matches(BASE).to_string();

        if path == "/auth/refresh-access-token" {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            return Ok(match self.refresh_to {
                Some(token) => HttpResponse::new(
                    200,
                    format!(r#"{{"result":{{"accessToken":"{}"}}}}"#, token),
                ),
                None => HttpResponse::new(401, r#"{"message":"Refresh token expired"}"#),
            });
        }

        if request.bearer() != Some("C2") {
            return Ok(HttpResponse::new(
                200,
                r#"{"result":null,"message":"Unauthorized","statusCode":401}"#,
            ));
        }

        Ok(match path.as_str() {
            "/cart" => HttpResponse::new(
                200,
                r#"{"result":{"items":[{"id":1,"bookId":8,"quantity":3,"price":2.5}]}}"#,
            ),
            "/categories" => HttpResponse::new(200, r#"{"result":[{"id":1,"name":"Poetry"}]}"#),
            _ => HttpResponse::new(404, r#"{"message":"Not Found","statusCode":404}"#),
        })
    }
}

#[derive(Default)]
struct Navigator {
    redirects: Mutex<Vec<String>>,
}

#[async_trait]
impl SessionNavigator for Navigator {
    async fn notify(&self, _notice: Notice) -> bridge_traits::Result<()> {
        Ok(())
    }

    async fn navigate_to_login(&self, route: &str) -> bridge_traits::Result<()> {
        self.redirects.lock().unwrap().push(route.to_string());
        Ok(())
    }
}

async fn client(
    refresh_to: Option<&'static str>,
) -> (ApiClient, Arc<Backend>, Arc<MemoryStore>, Arc<Navigator>) {
    let backend = Arc::new(Backend {
        refresh_to,
        refreshes: AtomicUsize::new(0),
    });
    let store = Arc::new(MemoryStore::new());
    store.set("accessToken", "C1").await.unwrap();
    let navigator = Arc::new(Navigator::default());

    let gateway = AuthGateway::new(
        backend.clone(),
        store.clone(),
        navigator.clone(),
        EventBus::new(16),
        GatewaySettings {
            refresh_url: format!("{}/auth/refresh-access-token", BASE),
            login_route: "/login".to_string(),
            credential_key: "accessToken".to_string(),
        },
    );
    let client = ApiClient::new(
        Arc::new(gateway),
        Url::parse(BASE).unwrap(),
        Duration::from_secs(5),
    );
    (client, backend, store, navigator)
}

#[tokio::test]
async fn services_recover_from_expiry_with_one_refresh() {
    let (client, backend, store, _navigator) = client(Some("C2")).await;
    let cart = CartService::new(client.clone(), EventBus::new(4));
    let catalog = CatalogService::new(client);

    let (cart, categories) = tokio::join!(cart.get_cart(), catalog.list_categories());

    assert_eq!(cart.unwrap().item_count(), 3);
    assert_eq!(categories.unwrap()[0].name, "Poetry");
    assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(store.get("accessToken").await.unwrap(), Some("C2".to_string()));
}

#[tokio::test]
async fn services_surface_failed_refresh_as_auth_error() {
    let (client, backend, store, navigator) = client(None).await;

    let err = CartService::new(client, EventBus::new(4))
        .get_cart()
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Auth(AuthError::RefreshFailed(_))));
    assert!(err.requires_sign_in());
    assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(store.get("accessToken").await.unwrap(), None);
    assert_eq!(*navigator.redirects.lock().unwrap(), vec!["/login".to_string()]);
}
