use async_trait::async_trait;

use crate::{params::path_segment, ApiRequest, NewTask, Result, SensorLinkClient, Task};

/// Reading export tasks.
#[async_trait]
pub trait TasksApi: Send + Sync {
    /// Starts an export over a time range.
    async fn create_task(&self, task: &NewTask) -> Result<Task>;

    /// Polls an export.
    async fn get_task(&self, task_id: &str) -> Result<Task>;

    /// Cancels a pending or running export.
    async fn cancel_task(&self, task_id: &str) -> Result<()>;
}

#[async_trait]
impl TasksApi for SensorLinkClient {
    async fn create_task(&self, task: &NewTask) -> Result<Task> {
        let request = ApiRequest::post("tasks.create", "environmental/tasks")
            .route("environmental/tasks")
            .json(task)?;
        self.send_json(request).await
    }

    async fn get_task(&self, task_id: &str) -> Result<Task> {
        let endpoint = format!("environmental/tasks/{}", path_segment(task_id)?);
        self.send_json(ApiRequest::get("tasks.get", endpoint).route("environmental/tasks/:taskId"))
            .await
    }

    async fn cancel_task(&self, task_id: &str) -> Result<()> {
        let endpoint = format!("environmental/tasks/{}", path_segment(task_id)?);
        self.send(ApiRequest::delete("tasks.cancel", endpoint).route("environmental/tasks/:taskId"))
            .await
            .map(|_| ())
    }
}
