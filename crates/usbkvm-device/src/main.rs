//! USB KVM device runtime: entry point.
//!
//! Loads the TOML config, applies command-line overrides, then serves the
//! controller protocol over TCP or stdio.
//!
//! # Usage
//!
//! ```text
//! usbkvm-device [OPTIONS]
//!
//! Options:
//!   --config <PATH>        Config file [default: usbkvm.toml]
//!   --listen <ADDR>        Serve TCP on ADDR (overrides [link])
//!   --stdio                Serve stdin/stdout instead of TCP
//!   --log-level <LEVEL>    Log level when RUST_LOG is unset
//!   --key-delay-ms <MS>    Minimum spacing between keyboard reports
//! ```
//!
//! | Variable              | Flag             |
//! |-----------------------|------------------|
//! | `USBKVM_CONFIG`       | `--config`       |
//! | `USBKVM_LISTEN`       | `--listen`       |
//! | `USBKVM_STDIO`        | `--stdio`        |
//! | `USBKVM_LOG`          | `--log-level`    |
//! | `USBKVM_KEY_DELAY_MS` | `--key-delay-ms` |
//!
//! Logs always go to stderr so stdout stays a clean protocol channel in
//! stdio mode.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use usbkvm_core::Device;
use usbkvm_device::{
    load_config, run_tcp, serve_stdio, share, DeviceConfig, GpioSwitchSink, LinkMode,
    TracingHidSink,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// USB KVM device runtime.
#[derive(Debug, Parser)]
#[command(
    name = "usbkvm-device",
    about = "Serves the USB KVM controller protocol over TCP or stdio",
    version
)]
struct Cli {
    /// Path to the TOML config file.  A missing file means all defaults.
    #[arg(long, default_value = "usbkvm.toml", env = "USBKVM_CONFIG")]
    config: PathBuf,

    /// Serve TCP on this address, overriding `[link]` in the config.
    #[arg(long, env = "USBKVM_LISTEN", conflicts_with = "stdio")]
    listen: Option<String>,

    /// Serve a single controller on stdin/stdout.
    #[arg(long, env = "USBKVM_STDIO")]
    stdio: bool,

    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, env = "USBKVM_LOG")]
    log_level: Option<String>,

    /// Minimum spacing between keyboard reports, in milliseconds.
    #[arg(long, env = "USBKVM_KEY_DELAY_MS")]
    key_delay_ms: Option<u64>,
}

impl Cli {
    /// Folds the command-line overrides into `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if `--listen` is not a socket address.
    fn apply_to(&self, config: &mut DeviceConfig) -> anyhow::Result<()> {
        if let Some(listen) = &self.listen {
            let addr: SocketAddr = listen
                .parse()
                .with_context(|| format!("invalid listen address: '{listen}'"))?;
            config.link.mode = LinkMode::Tcp;
            config.link.bind_address = addr.to_string();
        }
        if self.stdio {
            config.link.mode = LinkMode::Stdio;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(ms) = self.key_delay_ms {
            config.keyboard.min_key_events_delay_ms = ms;
        }
        Ok(())
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    cli.apply_to(&mut config)?;

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "usbkvm device starting: mode={:?}, hid_pin={}, mass_storage_pin={}",
        config.link.mode, config.gpio.hid_switch_pin, config.gpio.mass_storage_switch_pin
    );

    let device = share(Device::new(
        TracingHidSink::new(),
        GpioSwitchSink::from_config(&config.gpio),
        config.device_options(),
    ));
    let options = config.link_options();

    match config.link.mode {
        LinkMode::Stdio => {
            let stats = serve_stdio(device, &options)
                .await
                .context("stdio link failed")?;
            info!(
                frames = stats.frames_dispatched,
                discarded = stats.discarded_bytes,
                "stdio link closed"
            );
        }
        LinkMode::Tcp => {
            let listener = TcpListener::bind(&config.link.bind_address)
                .await
                .with_context(|| format!("failed to bind {}", config.link.bind_address))?;

            let running = Arc::new(AtomicBool::new(true));
            let running_clone = Arc::clone(&running);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("received Ctrl+C, shutting down");
                        running_clone.store(false, Ordering::SeqCst);
                    }
                    Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
                }
            });

            run_tcp(listener, device, options, running)
                .await
                .context("TCP link loop failed")?;
        }
    }

    info!("usbkvm device stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
