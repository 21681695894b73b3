//! enocean-gateway: monitor EnOcean devices through an ESP3 radio module.
//!
//! Prints every device state change as one JSON object per line.

use clap::Parser;
use log::{error, info, warn};

use enocean_gateway::config::{Args, GatewayConfig};
use enocean_gateway::{logging, transport, Gateway};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match GatewayConfig::resolve(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config file: {}", e);
            return Err(e.into());
        }
    };

    logging::init_logging(
        &config.log_dir(&args),
        config.log_retention_days(&args),
        args.verbose,
        config.logging.level.as_deref(),
    )?;

    let target = config.transport_target(&args)?;
    let stream = match transport::open(&target).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    let gateway = Gateway::start(stream, config.gateway_options());

    gateway.on_state_change(|change| match serde_json::to_string(change) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!("Cannot serialize state change: {}", e),
    });
    gateway.on_new_device(|address| info!("Unregistered device {} is transmitting", address));
    gateway.on_teach_in(|teach_in| {
        info!(
            "Teach-in request from {} for {}",
            teach_in.sender(),
            teach_in.eep().map_or_else(|| "unknown profile".to_string(), |eep| eep.to_string())
        )
    });

    match gateway.version_info().await {
        Ok(Some(version)) => info!(
            "{} (app {}, api {}), EURID {}",
            version.app_description, version.app_version, version.api_version, version.eurid
        ),
        Ok(None) => warn!("Module did not report its version"),
        Err(e) => warn!("Reading version failed: {}", e),
    }
    match gateway.base_id().await {
        Ok(Some(base_id)) => info!("Base ID {}", base_id),
        Ok(None) => warn!("Module did not report its base ID"),
        Err(e) => warn!("Reading base ID failed: {}", e),
    }

    for device in &config.devices {
        match gateway.register_device(device.address, device.eep).await {
            Ok(true) => {}
            Ok(false) => warn!("No built-in profile for {} ({})", device.eep, device.address),
            Err(e) => warn!("Registering {} failed: {}", device.address, e),
        }
    }

    info!("Monitoring, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    gateway.shutdown().await;
    Ok(())
}
