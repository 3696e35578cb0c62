use async_trait::async_trait;

use crate::{
    params::{path_segment, QueryParams},
    ApiRequest, Page, Reading, ReadingsLogQuery, Result, SensorLinkClient,
};

/// Environmental readings.
#[async_trait]
pub trait ReadingsApi: Send + Sync {
    /// Most recent reading for each sensor.
    async fn get_latest_readings(&self, sensor_ids: &[&str]) -> Result<Vec<Reading>>;

    /// One page of the reading log produced by an export task.
    async fn get_readings_log(
        &self,
        task_id: &str,
        query: &ReadingsLogQuery,
    ) -> Result<Page<Reading>>;
}

#[async_trait]
impl ReadingsApi for SensorLinkClient {
    async fn get_latest_readings(&self, sensor_ids: &[&str]) -> Result<Vec<Reading>> {
        let endpoint = QueryParams::new()
            .push("sensor_ids", sensor_ids.join(","))
            .apply("environmental/readings/latest");
        let page: Page<Reading> = self
            .send_json(
                ApiRequest::get("readings.getLatest", endpoint)
                    .route("environmental/readings/latest"),
            )
            .await?;
        Ok(page.results)
    }

    async fn get_readings_log(
        &self,
        task_id: &str,
        query: &ReadingsLogQuery,
    ) -> Result<Page<Reading>> {
        let path = format!("environmental/tasks/{}/log", path_segment(task_id)?);
        let endpoint = query.to_params().apply(&path);
        self.send_json(
            ApiRequest::get("readings.getLog", endpoint).route("environmental/tasks/:taskId/log"),
        )
        .await
    }
}
