use std::env;

use phnix_cloud::sensors::Category;
use phnix_cloud::{Config, Credentials, PhnixClient};

#[tokio::main]
async fn main() -> phnix_cloud::Result<()> {
    tracing_subscriber::fmt::init();

    // Either `monitor <config.json>` or PHNIX_USERNAME / PHNIX_PASSWORD /
    // PHNIX_DEVICE_CODE in the environment.
    let (client, interval) = match env::args().nth(1) {
        Some(path) => {
            let config = Config::from_json_str(&std::fs::read_to_string(path)?)?;
            (PhnixClient::from_config(&config)?, config.scan_interval())
        }
        None => {
            let var = |name: &str| env::var(name).expect("usage: monitor [config.json]");
            let client = PhnixClient::builder(
                Credentials::password(var("PHNIX_USERNAME"), var("PHNIX_PASSWORD")),
                var("PHNIX_DEVICE_CODE"),
            )
            .build()?;
            (client, std::time::Duration::from_secs(30))
        }
    };

    println!("Logging in for device {}...", client.device_code());
    client.login().await?;
    println!("Logged in. Polling every {}s...", interval.as_secs());

    loop {
        match client.status().await {
            Ok(status) => {
                let climate = &status.climate;
                println!(
                    "mode: {:?} | indoor: {} | target: {}",
                    climate.hvac_mode,
                    climate
                        .current_temperature
                        .map_or("-".to_string(), |t| format!("{t:.1}\u{00b0}C")),
                    climate
                        .target_temperature
                        .map_or("-".to_string(), |t| format!("{t:.0}\u{00b0}C")),
                );
                for category in Category::ALL {
                    let readings: Vec<String> = status
                        .readings
                        .in_category(category)
                        .map(|r| r.to_string())
                        .collect();
                    let active: Vec<&str> = status
                        .flags
                        .in_category(category)
                        .filter(|r| r.value.as_bool() == Some(true))
                        .map(|r| r.name)
                        .collect();
                    if readings.is_empty() && active.is_empty() {
                        continue;
                    }
                    println!("  [{}]", category.label());
                    for line in readings {
                        println!("    {line}");
                    }
                    if !active.is_empty() {
                        println!("    active: {}", active.join(", "));
                    }
                }
            }
            Err(e) => eprintln!("Poll error: {e}"),
        }
        tokio::time::sleep(interval).await;
    }
}
