//! Saved shipping addresses.

use super::catalog::require_id;
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{Address, AddressInput};
use bridge_traits::HttpMethod;
use serde_json::json;
use tracing::instrument;

#[derive(Clone)]
pub struct AddressService {
    client: ApiClient,
}

impl AddressService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Address>> {
        self.client.get("/addresses").await
    }

    /// The address marked as default, if any.
    pub async fn default_address(&self) -> Result<Option<Address>> {
        Ok(self.list().await?.into_iter().find(|a| a.is_default))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: AddressInput) -> Result<Address> {
        validate(&input)?;
        self.client.post("/addresses", &input).await
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: AddressInput) -> Result<Address> {
        let id = require_id(id)?;
        validate(&input)?;
        self.client.put(&format!("/addresses/{}", id), &input).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = require_id(id)?;
        self.client
            .execute(HttpMethod::Delete, &format!("/addresses/{}", id))
            .await
    }

    #[instrument(skip(self))]
    pub async fn set_default(&self, id: &str) -> Result<Address> {
        let id = require_id(id)?;
        self.client
            .patch(&format!("/addresses/{}/default", id), &json!({}))
            .await
    }
}

fn validate(input: &AddressInput) -> Result<()> {
    input
        .validate()
        .map_err(|(field, message)| ApiError::validation(field, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{answering, harness, json_body, untouched, url};
    use crate::test_support::MockHttp;
    use bridge_traits::HttpResponse;

    fn home() -> AddressInput {
        AddressInput {
            full_name: "Ada Lovelace".to_string(),
            phone: "0912 345 678".to_string(),
            street: "1 Main St".to_string(),
            city: "Hanoi".to_string(),
            is_default: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_sends_input() {
        let http = answering(
            |req| {
                req.method == HttpMethod::Post
                    && req.url == url("/addresses")
                    && json_body(req)["fullName"] == "Ada Lovelace"
                    && json_body(req).get("ward").is_none()
            },
            201,
            r#"{"result":{"id":3,"fullName":"Ada Lovelace","phone":"0912 345 678","street":"1 Main St","city":"Hanoi","isDefault":true}}"#,
        );
        let h = harness(http).await;

        let address = AddressService::new(h.client).create(home()).await.unwrap();

        assert_eq!(address.id, "3");
        assert!(address.is_default);
    }

    #[tokio::test]
    async fn test_missing_required_field_is_rejected() {
        let h = harness(untouched()).await;
        let service = AddressService::new(h.client);

        let input = AddressInput {
            street: String::new(),
            ..home()
        };
        let err = service.create(input).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation { ref field, .. } if field == "street"));

        let err = service.update("", home()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation { ref field, .. } if field == "id"));
    }

    #[tokio::test]
    async fn test_update_and_set_default_paths() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Put && req.url == url("/addresses/3"))
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"result":{"id":3,"fullName":"Ada","phone":"0912345678","street":"2 Side St","city":"Hue"}}"#,
                ))
            });
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Patch && req.url == url("/addresses/3/default"))
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"result":{"id":3,"fullName":"Ada","phone":"0912345678","street":"2 Side St","city":"Hue","isDefault":true}}"#,
                ))
            });
        let h = harness(http).await;
        let service = AddressService::new(h.client);

        let updated = service.update("3", home()).await.unwrap();
        assert_eq!(updated.city, "Hue");
        assert!(!updated.is_default);

        let updated = service.set_default("3").await.unwrap();
        assert!(updated.is_default);
    }

    #[tokio::test]
    async fn test_default_address_and_delete() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Get && req.url == url("/addresses"))
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"result":[
                        {"id":1,"fullName":"A","phone":"0912345678","street":"s","city":"c"},
                        {"id":2,"fullName":"B","phone":"0912345678","street":"s","city":"c","isDefault":true}
                    ]}"#,
                ))
            });
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Delete && req.url == url("/addresses/1"))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(204, "")));
        let h = harness(http).await;
        let service = AddressService::new(h.client);

        let default = service.default_address().await.unwrap().unwrap();
        assert_eq!(default.id, "2");
        service.delete("1").await.unwrap();
    }
}
