//! fingerprintd
//!
//! Opens the legacy fingerprint module, reports the sensor properties and
//! keeps the device open until SIGINT or SIGTERM.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use fingerprint_config::{ConfigFile, FingerprintConfig, PropertyFile};
use fingerprint_hal::ModuleLoader;
use fingerprint_service::Fingerprint;

const DEFAULT_CONFIG_PATH: &str = "/vendor/etc/fingerprint.toml";

fn main() -> Result<()> {
    setup_logging();

    info!("fingerprintd starting...");

    let config = load_config()?;
    info!("Configuration sources: {:?}", config);

    // Outlives the device, which points into the module
    let loader = module_loader();
    let fingerprint =
        Fingerprint::new(config, loader.as_ref()).context("Failed to open fingerprint HAL")?;

    let props = fingerprint
        .get_sensor_props()
        .context("Failed to build sensor properties")?;
    info!(
        "Sensor properties: {}",
        serde_json::to_string(&props).context("Failed to serialize sensor properties")?
    );

    let signal = wait_for_shutdown()?;
    info!("Received {:?}, shutting down", signal);

    if let Some(session) = fingerprint.current_session() {
        session.close()?;
    }
    drop(fingerprint);
    drop(loader);

    info!("fingerprintd stopped");
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_ansi(false))
        .init();
}

/// System properties, then `$FINGERPRINT_PROP_FILE`, then the TOML config
fn load_config() -> Result<FingerprintConfig> {
    let mut config = FingerprintConfig::system();

    if let Some(path) = std::env::var_os("FINGERPRINT_PROP_FILE") {
        let path = PathBuf::from(path);
        let file = PropertyFile::load(&path)
            .with_context(|| format!("Failed to load property file {}", path.display()))?;
        info!("Loaded properties from {}", path.display());
        config = config.with_source(file);
    }

    let config_path = std::env::var_os("FINGERPRINT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config_path = Some(config_path.as_path()).filter(|p| p.exists());
    if config_path.is_none() {
        warn!("No config file found, using properties and environment only");
    }
    let file = ConfigFile::load(config_path).context("Failed to load config file")?;
    config = config.with_source(file);

    Ok(config)
}

#[cfg(feature = "libhardware")]
fn module_loader() -> Box<dyn ModuleLoader> {
    Box::new(fingerprint_hal::LibHardware)
}

#[cfg(not(feature = "libhardware"))]
fn module_loader() -> Box<dyn ModuleLoader> {
    warn!("Built without libhardware, using the mock fingerprint module");
    Box::new(fingerprint_hal::mock::MockModule::new())
}

/// Block SIGINT and SIGTERM and wait for either
fn wait_for_shutdown() -> Result<nix::sys::signal::Signal> {
    use nix::sys::signal::{SigSet, Signal};

    let mut mask = SigSet::empty();
    mask.add(Signal::SIGINT);
    mask.add(Signal::SIGTERM);
    mask.thread_block().context("Failed to block signals")?;

    info!("Waiting for SIGINT or SIGTERM");
    mask.wait().context("Failed to wait for signal")
}
