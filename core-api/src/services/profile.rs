//! The signed-in user's own account.

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{PasswordChange, ProfileUpdate, UserProfile, MIN_PASSWORD_LENGTH};
use bridge_traits::HttpMethod;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct ProfileService {
    client: ApiClient,
}

impl ProfileService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get(&self) -> Result<UserProfile> {
        self.client.get("/users/me").await
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, update: ProfileUpdate) -> Result<UserProfile> {
        if update.is_empty() {
            return Err(ApiError::validation("profile", "nothing to update"));
        }
        if matches!(&update.full_name, Some(name) if name.trim().is_empty()) {
            return Err(ApiError::validation("fullName", "cannot be blank"));
        }
        self.client.put("/users/me", &update).await
    }

    /// Change the account password. The backend verifies `current`.
    #[instrument(skip_all)]
    pub async fn change_password(&self, current: &str, new: &str) -> Result<()> {
        if current.is_empty() {
            return Err(ApiError::validation("currentPassword", "is required"));
        }
        if new.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::validation(
                "newPassword",
                format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }
        if new == current {
            return Err(ApiError::validation(
                "newPassword",
                "must differ from the current password",
            ));
        }

        let body = PasswordChange {
            current_password: current,
            new_password: new,
        };
        let request = self
            .client
            .request(HttpMethod::Patch, "/users/me/password")
            .json(&body)?;
        self.client.send(request).await?;

        info!("Password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{answering, harness, json_body, untouched, url};
    use serde_json::json;

    #[tokio::test]
    async fn test_get_profile() {
        let http = answering(
            |req| req.method == HttpMethod::Get && req.url == url("/users/me"),
            200,
            r#"{"result":{"id":5,"email":"reader@books.example","fullName":"Reader"}}"#,
        );
        let h = harness(http).await;

        let profile = ProfileService::new(h.client).get().await.unwrap();

        assert_eq!(profile.id, "5");
        assert_eq!(profile.full_name.as_deref(), Some("Reader"));
    }

    #[tokio::test]
    async fn test_update_sends_only_set_fields() {
        let http = answering(
            |req| req.method == HttpMethod::Put && json_body(req) == json!({"phone": "0912345678"}),
            200,
            r#"{"result":{"id":5,"email":"reader@books.example","phone":"0912345678"}}"#,
        );
        let h = harness(http).await;

        let profile = ProfileService::new(h.client)
            .update(ProfileUpdate {
                phone: Some("0912345678".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(profile.phone.as_deref(), Some("0912345678"));
    }

    #[tokio::test]
    async fn test_password_rules_are_checked_locally() {
        let h = harness(untouched()).await;
        let profile = ProfileService::new(h.client);

        assert!(matches!(
            profile.change_password("old-secret", "short").await,
            Err(ApiError::Validation { .. })
        ));
        assert!(matches!(
            profile.change_password("same-secret", "same-secret").await,
            Err(ApiError::Validation { .. })
        ));
        assert!(matches!(
            profile.update(ProfileUpdate::default()).await,
            Err(ApiError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let http = answering(
            |req| {
                req.method == HttpMethod::Patch
                    && req.url == url("/users/me/password")
                    && json_body(req)
                        == json!({"currentPassword": "old-secret", "newPassword": "new-secret-1"})
            },
            200,
            r#"{"result":null,"message":"Password updated","statusCode":200}"#,
        );
        let h = harness(http).await;

        ProfileService::new(h.client)
            .change_password("old-secret", "new-secret-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wrong_current_password_is_api_error() {
        let http = answering(
            |req| req.url == url("/users/me/password"),
            400,
            r#"{"message":"Current password is incorrect","statusCode":400}"#,
        );
        let h = harness(http).await;

        let err = ProfileService::new(h.client)
            .change_password("wrong-one", "new-secret-1")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Api { status: 400, .. }));
    }
}
