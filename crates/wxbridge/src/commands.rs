// Command handlers for the wxbridge CLI.

use color_eyre::eyre::{Result, eyre};
use tokio::sync::watch;
use tracing::{info, warn};

use wxbridge_api::transport::TransportConfig;
use wxbridge_api::{BridgeClient, RawReading, WeatherClient};
use wxbridge_config as config;
use wxbridge_core::{BridgeEvent, Supervisor};

use crate::cli::ConfigCommand;

/// Register every configured bridge and log events until interrupted.
pub async fn run() -> Result<()> {
    let cfg = config::load_config()?;
    if cfg.bridges.is_empty() {
        return Err(eyre!(
            "no bridges configured — run `wxbridge config init` and edit {}",
            config::config_path().display()
        ));
    }

    let transport = TransportConfig::default().with_timeout(config::timeout(&cfg.defaults));
    let weather = WeatherClient::new(&transport)?;
    let supervisor = Supervisor::new(transport, weather);
    let mut events = supervisor.events();
    let mut errors = supervisor.errors();

    // No reachability probing in the CLI: bridges are assumed reachable
    // and transport failures surface on the error channel instead.
    let (_reachable_tx, reachable_rx) = watch::channel(true);

    for profile in &cfg.bridges {
        let bridge = config::bridge_from_profile(profile, &cfg.defaults)?;
        info!(bridge = %bridge.display_name, ip = %bridge.ip_address, "registering bridge");
        supervisor.register(bridge, reachable_rx.clone()).await?;
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => {
                match event {
                    Ok(event) => log_event(&event),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "event receiver lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            error = errors.recv() => {
                if let Ok(e) = error {
                    warn!(bridge_id = %e.bridge_id, kind = ?e.kind, error = %e.error, "poll failed");
                }
            }
        }
    }

    info!("shutting down");
    supervisor.shutdown().await;
    Ok(())
}

fn log_event(event: &BridgeEvent) {
    match event {
        BridgeEvent::ObservationUpdated { snapshot, .. } => {
            for sensor in snapshot.sensors().filter(|s| s.is_observing) {
                let value = sensor.current_observation.value.as_deref().unwrap_or("--");
                let unit_display = sensor.current_unit().map_or("", |u| u.display.as_str());
                info!(
                    bridge = %snapshot.display_name,
                    sensor = %sensor.name,
                    battery = ?sensor.battery_status,
                    "{value}{unit_display}"
                );
            }
        }
        BridgeEvent::AlertsChanged {
            snapshot,
            newly_unacknowledged,
            ..
        } => {
            info!(
                bridge = %snapshot.display_name,
                active = snapshot.active_alerts.len(),
                new = newly_unacknowledged.len(),
                "active alerts changed"
            );
            for alert in &snapshot.active_alerts {
                if let Some(ref headline) = alert.headline {
                    info!(severity = ?alert.severity, "{headline}");
                }
            }
        }
        BridgeEvent::ForecastUpdated { result, .. } => match result {
            Ok(model) => info!(city = %model.closest_city, "forecast model ready"),
            Err(message) => warn!("forecast unavailable: {message}"),
        },
    }
}

/// Poll each configured bridge once and print the readings.
pub async fn poll_once(only: Option<&str>) -> Result<()> {
    let cfg = config::load_config()?;
    let transport = TransportConfig::default().with_timeout(config::timeout(&cfg.defaults));

    let mut polled = 0usize;
    for profile in &cfg.bridges {
        if only.is_some_and(|name| name != profile.name) {
            continue;
        }
        polled += 1;

        let bridge = config::bridge_from_profile(profile, &cfg.defaults)?;
        let client = BridgeClient::new(&bridge.ip_address, &transport)?;

        println!("{} ({})", bridge.display_name, bridge.ip_address);
        let response = client
            .poll_observations(&bridge.observation_templates(), true)
            .await?;
        for reading in &response.readings {
            match reading {
                RawReading::Weather {
                    name,
                    value,
                    max,
                    min,
                    battery,
                } => println!("  {name}: {value} (max {max}, min {min}, battery {battery:?})"),
                RawReading::System { name, value } => println!("  {name}: {value}"),
            }
        }

        let system_templates = bridge.system_templates();
        if !system_templates.is_empty() {
            let response = client.poll_system(&system_templates).await?;
            for reading in &response.readings {
                if let RawReading::System { name, value } = reading {
                    println!("  {name}: {value}");
                }
            }
        }
    }

    if polled == 0 {
        return Err(match only {
            Some(name) => eyre!("no configured bridge named {name:?}"),
            None => eyre!("no bridges configured"),
        });
    }
    Ok(())
}

/// Configuration helpers.
pub fn config(cmd: &ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
        ConfigCommand::Init => {
            let path = config::config_path();
            if path.exists() {
                return Err(eyre!("config already exists at {}", path.display()));
            }
            config::save_config(&config::Config::default())?;
            println!("wrote {}", path.display());
            Ok(())
        }
    }
}
