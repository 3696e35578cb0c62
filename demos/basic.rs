use std::sync::Arc;

use sensorlink_http::{
    AuthApi, ClientOptions, ListSensors, ReadingsApi, SensorLinkClient, SensorsApi,
    TracingTelemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let api_key = std::env::var("SENSORLINK_API_KEY")?;
    let serial = std::env::var("SENSORLINK_SERIAL").ok();

    let client = SensorLinkClient::builder(api_key)
        .options(ClientOptions::default())
        .telemetry(Arc::new(TracingTelemetry))
        .build()?;

    let identity = client.verify_api_key().await?;
    println!("authenticated as organization {}", identity.organization_id);

    let page = client
        .list_sensors(&ListSensors {
            limit: Some(10),
            ..ListSensors::default()
        })
        .await?;
    for sensor in &page.results {
        println!("{} {} {:?}", sensor.id, sensor.serial_number, sensor.name);
    }

    if let Some(serial) = serial {
        let sensor = client.get_sensor_by_serial(&serial).await?;
        let status = client.get_sensor_status(&sensor.id).await?;
        println!("{serial}: online={} battery={:?}", status.online, status.battery_level);

        for reading in client.get_latest_readings(&[sensor.id.as_str()]).await? {
            println!(
                "{} temperature={:?} humidity={:?}",
                reading.timestamp, reading.temperature, reading.humidity
            );
        }
    }

    Ok(())
}
