use async_trait::async_trait;

use crate::{
    params::path_segment, Alarm, AlarmUpdate, ApiRequest, ListAlarms, NewAlarm, Page, Result,
    SensorLinkClient,
};

/// Threshold alarms.
#[async_trait]
pub trait AlarmsApi: Send + Sync {
    async fn list_alarms(&self, query: &ListAlarms) -> Result<Page<Alarm>>;

    async fn get_alarm(&self, alarm_id: &str) -> Result<Alarm>;

    async fn create_alarm(&self, alarm: &NewAlarm) -> Result<Alarm>;

    /// Applies a partial update.
    async fn update_alarm(&self, alarm_id: &str, update: &AlarmUpdate) -> Result<Alarm>;

    async fn delete_alarm(&self, alarm_id: &str) -> Result<()>;
}

fn alarm_path(alarm_id: &str) -> Result<String> {
    Ok(format!("alarms/{}", path_segment(alarm_id)?))
}

#[async_trait]
impl AlarmsApi for SensorLinkClient {
    async fn list_alarms(&self, query: &ListAlarms) -> Result<Page<Alarm>> {
        let endpoint = query.to_params().apply("alarms");
        self.send_json(ApiRequest::get("alarms.list", endpoint).route("alarms"))
            .await
    }

    async fn get_alarm(&self, alarm_id: &str) -> Result<Alarm> {
        let endpoint = alarm_path(alarm_id)?;
        self.send_json(ApiRequest::get("alarms.get", endpoint).route("alarms/:id"))
            .await
    }

    async fn create_alarm(&self, alarm: &NewAlarm) -> Result<Alarm> {
        let request = ApiRequest::post("alarms.create", "alarms")
            .route("alarms")
            .json(alarm)?;
        self.send_json(request).await
    }

    async fn update_alarm(&self, alarm_id: &str, update: &AlarmUpdate) -> Result<Alarm> {
        let request = ApiRequest::patch("alarms.update", alarm_path(alarm_id)?)
            .route("alarms/:id")
            .json(update)?;
        self.send_json(request).await
    }

    async fn delete_alarm(&self, alarm_id: &str) -> Result<()> {
        let endpoint = alarm_path(alarm_id)?;
        self.send(ApiRequest::delete("alarms.delete", endpoint).route("alarms/:id"))
            .await
            .map(|_| ())
    }
}
