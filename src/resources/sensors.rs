use async_trait::async_trait;

use crate::{
    params::path_segment, ApiRequest, ListSensors, Page, Result, Sensor, SensorLinkClient,
    SensorLinkError, SensorStatus, SensorUpdate,
};

/// Sensor inventory and status.
#[async_trait]
pub trait SensorsApi: Send + Sync {
    /// Lists sensors matching `query`.
    async fn list_sensors(&self, query: &ListSensors) -> Result<Page<Sensor>>;

    /// Fetches one sensor by ID.
    async fn get_sensor(&self, sensor_id: &str) -> Result<Sensor>;

    /// Resolves a sensor from its serial number.
    ///
    /// Fails with [`SensorLinkError::NotFound`] when nothing matches. When
    /// several sensors match, the first is returned and a warning is logged.
    async fn get_sensor_by_serial(&self, serial_number: &str) -> Result<Sensor>;

    /// Fetches connectivity and battery status.
    async fn get_sensor_status(&self, sensor_id: &str) -> Result<SensorStatus>;

    /// Applies a partial update.
    async fn update_sensor(&self, sensor_id: &str, update: &SensorUpdate) -> Result<Sensor>;
}

#[async_trait]
impl SensorsApi for SensorLinkClient {
    async fn list_sensors(&self, query: &ListSensors) -> Result<Page<Sensor>> {
        let endpoint = query.to_params().apply("sensors");
        self.send_json(ApiRequest::get("sensors.list", endpoint).route("sensors"))
            .await
    }

    async fn get_sensor(&self, sensor_id: &str) -> Result<Sensor> {
        let endpoint = format!("sensors/{}", path_segment(sensor_id)?);
        self.send_json(ApiRequest::get("sensors.get", endpoint).route("sensors/:id"))
            .await
    }

    async fn get_sensor_by_serial(&self, serial_number: &str) -> Result<Sensor> {
        let query = ListSensors {
            serial_number: Some(serial_number.to_owned()),
            ..ListSensors::default()
        };
        let endpoint = query.to_params().apply("sensors");
        let page: Page<Sensor> = self
            .send_json(ApiRequest::get("sensors.getBySerial", endpoint).route("sensors"))
            .await?;
        select_by_serial(serial_number, page.results)
    }

    async fn get_sensor_status(&self, sensor_id: &str) -> Result<SensorStatus> {
        let endpoint = format!("sensors/{}/status", path_segment(sensor_id)?);
        self.send_json(ApiRequest::get("sensors.getStatus", endpoint).route("sensors/:id/status"))
            .await
    }

    async fn update_sensor(&self, sensor_id: &str, update: &SensorUpdate) -> Result<Sensor> {
        let endpoint = format!("sensors/{}", path_segment(sensor_id)?);
        let request = ApiRequest::patch("sensors.update", endpoint)
            .route("sensors/:id")
            .json(update)?;
        self.send_json(request).await
    }
}

/// Picks the first sensor of a serial-number lookup.
pub(crate) fn select_by_serial(serial_number: &str, sensors: Vec<Sensor>) -> Result<Sensor> {
    let matches = sensors.len();
    let first = sensors.into_iter().next().ok_or_else(|| {
        SensorLinkError::NotFound(format!("no sensor with serial number '{serial_number}'"))
    })?;
    if matches > 1 {
        tracing::warn!(
            serial_number,
            matches,
            sensor_id = %first.id,
            "multiple sensors share a serial number, using the first match"
        );
    }
    Ok(first)
}
