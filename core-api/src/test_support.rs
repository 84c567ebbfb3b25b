use crate::client::ApiClient;
use async_trait::async_trait;
use bridge_traits::{
    HttpClient, HttpRequest, HttpResponse, KeyValueStore, MemoryStore, Notice, SessionNavigator,
};
use core_auth::{AuthGateway, GatewaySettings};
use core_runtime::events::EventBus;
use mockall::mock;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const BASE: &str = "https://api.test";

mock! {
    pub Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> bridge_traits::Result<HttpResponse>;
    }
}

struct QuietNavigator;

#[async_trait]
impl SessionNavigator for QuietNavigator {
    async fn notify(&self, _notice: Notice) -> bridge_traits::Result<()> {
        Ok(())
    }

    async fn navigate_to_login(&self, _route: &str) -> bridge_traits::Result<()> {
        Ok(())
    }
}

pub struct Harness {
    pub client: ApiClient,
    pub store: Arc<MemoryStore>,
    pub events: EventBus,
}

/// Client over `http` with credential `C1` already stored.
pub async fn harness(http: MockHttp) -> Harness {
    let store = Arc::new(MemoryStore::new());
    store.set("accessToken", "C1").await.unwrap();
    let events = EventBus::new(16);

    let gateway = AuthGateway::new(
        Arc::new(http),
        store.clone(),
        Arc::new(QuietNavigator),
        events.clone(),
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

    Harness {
        client,
        store,
        events,
    }
}

/// Transport that must never be called.
pub fn untouched() -> MockHttp {
    let mut http = MockHttp::new();
    http.expect_execute().never();
    http
}

/// Transport answering one request that satisfies `check` with `status`/`body`.
pub fn answering<F>(check: F, status: u16, body: &'static str) -> MockHttp
where
    F: Fn(&HttpRequest) -> bool + Send + Sync + 'static,
{
    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(move |req| check(req))
        .times(1)
        .returning(move |_| Ok(HttpResponse::new(status, body)));
    http
}

pub fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

pub fn json_body(request: &HttpRequest) -> serde_json::Value {
    request
        .body
        .as_ref()
        .and_then(|body| serde_json::from_slice(body).ok())
        .unwrap_or(serde_json::Value::Null)
}
