use async_trait::async_trait;

use crate::{
    params::path_segment, ApiRequest, NewWebhook, Page, Result, SensorLinkClient, Webhook,
    WebhookTestResult,
};

/// Event delivery endpoints.
#[async_trait]
pub trait WebhooksApi: Send + Sync {
    async fn list_webhooks(&self) -> Result<Vec<Webhook>>;

    async fn create_webhook(&self, webhook: &NewWebhook) -> Result<Webhook>;

    async fn delete_webhook(&self, webhook_id: &str) -> Result<()>;

    /// Asks the API to send a test event to the webhook.
    async fn test_webhook(&self, webhook_id: &str) -> Result<WebhookTestResult>;
}

#[async_trait]
impl WebhooksApi for SensorLinkClient {
    async fn list_webhooks(&self) -> Result<Vec<Webhook>> {
        let page: Page<Webhook> = self
            .send_json(ApiRequest::get("webhooks.list", "webhooks").route("webhooks"))
            .await?;
        Ok(page.results)
    }

    async fn create_webhook(&self, webhook: &NewWebhook) -> Result<Webhook> {
        let request = ApiRequest::post("webhooks.create", "webhooks")
            .route("webhooks")
            .json(webhook)?;
        self.send_json(request).await
    }

    async fn delete_webhook(&self, webhook_id: &str) -> Result<()> {
        let endpoint = format!("webhooks/{}", path_segment(webhook_id)?);
        self.send(ApiRequest::delete("webhooks.delete", endpoint).route("webhooks/:id"))
            .await
            .map(|_| ())
    }

    async fn test_webhook(&self, webhook_id: &str) -> Result<WebhookTestResult> {
        let endpoint = format!("webhooks/{}/test", path_segment(webhook_id)?);
        self.send_json(ApiRequest::post("webhooks.test", endpoint).route("webhooks/:id/test"))
            .await
    }
}
