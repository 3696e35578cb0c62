use async_trait::async_trait;

use crate::{ApiRequest, AuthInfo, Result, SensorLinkClient};

/// API key introspection.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Confirms the API key is valid and returns its identity.
    async fn verify_api_key(&self) -> Result<AuthInfo>;
}

#[async_trait]
impl AuthApi for SensorLinkClient {
    async fn verify_api_key(&self) -> Result<AuthInfo> {
        self.send_json(ApiRequest::get("auth.verify", "auth/verify").route("auth/verify"))
            .await
    }
}
