//! usb-probe
//!
//! Diagnostic tool that opens one USB device by vendor/product ID, detaches
//! any kernel driver bound to the chosen interface, selects a configuration,
//! claims the interface and prints the device descriptor.

mod config;
mod report;

use anyhow::{Context, Result, bail};
use clap::Parser;
use common::{Verbosity, setup_logging};
use descriptor::DeviceIdentifier;
use report::{DeviceStrings, ProbeReport};
use session::{DeviceSession, OpenError, RusbHost, SessionOptions, UsbHost};
use tracing::{debug, info, info_span};

#[derive(Parser, Debug)]
#[command(name = "usb-probe")]
#[command(
    author,
    version,
    about = "Open a USB device, claim an interface and dump its device descriptor"
)]
#[command(long_about = "
Opens the first attached USB device matching VID:PID, detaches a kernel driver
bound to the chosen interface, selects the configuration, claims the interface
and reads back the 18-byte device descriptor.

EXAMPLES:
    # Probe the device named in the configuration file
    usb-probe

    # Probe a specific device, interface 1, configuration 1
    usb-probe --device 1a86:7523 --interface 1

    # Hand the interface back to the kernel driver afterwards
    usb-probe --device 046d:0a45 --reattach

    # List attached devices
    usb-probe --list

    # Show every step, including the raw descriptor bytes
    usb-probe --debug

CONFIGURATION:
    The probe looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/usb-probe/probe.toml
    3. /etc/usb-probe/probe.toml
    4. Built-in defaults
")]
struct Args {
    /// Device to probe as VID:PID in hex (e.g. 046d:0a45)
    #[arg(short, long, value_name = "VID:PID")]
    device: Option<DeviceIdentifier>,

    /// Interface number to claim
    #[arg(short, long, value_name = "N")]
    interface: Option<u8>,

    /// Configuration value to select
    #[arg(long, value_name = "N")]
    configuration: Option<u8>,

    /// Re-attach the kernel driver when done
    #[arg(long)]
    reattach: bool,

    /// List attached USB devices and exit
    #[arg(long)]
    list: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Report each step of the session
    #[arg(short, long)]
    verbose: bool,

    /// Report everything, including the raw descriptor
    #[arg(long)]
    debug: bool,

    /// Log level (trace, debug, info, warn, error); overrides --verbose and --debug
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = config::ProbeConfig::default();
        let path = config::ProbeConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config = if let Some(ref path) = args.config {
        config::ProbeConfig::load(Some(config::expand_path(path)))
            .context("Failed to load configuration")?
    } else {
        config::ProbeConfig::load_or_default()
    };

    // --log-level beats -v/--debug, which beat the config file
    let verbosity = Verbosity::from_flags(args.verbose, args.debug);
    let log_level = match (&args.log_level, verbosity) {
        (Some(level), _) => level.as_str(),
        (None, Verbosity::Quiet) => config.probe.log_level.as_str(),
        (None, v) => v.filter(),
    };

    setup_logging(log_level).context("Failed to setup logging")?;
    debug!("usb-probe v{}, log level {}", env!("CARGO_PKG_VERSION"), log_level);

    let host = RusbHost::with_log_level(config.usb.log_level())
        .context("Failed to initialise libusb")?;

    if args.list {
        return list_devices_mode(&host);
    }

    let identifier = match args.device {
        Some(id) => id,
        None => config.device.identifier()?,
    };
    let interface = args.interface.unwrap_or(config.device.interface);
    let configuration = args.configuration.unwrap_or(config.device.configuration);
    let reattach = args.reattach || config.device.reattach_kernel_driver;

    let report = probe(&host, identifier, interface, configuration, reattach)?;

    if args.json {
        println!("{}", report.to_json().context("Failed to serialize report")?);
    } else {
        println!("{}", report);
    }

    Ok(())
}

/// List USB devices and exit
fn list_devices_mode(host: &impl UsbHost) -> Result<()> {
    info!("Listing USB devices...");

    let devices = host.list_devices().context("Failed to list USB devices")?;
    println!("{}", report::render_listing(&devices));

    Ok(())
}

/// Run one open, prepare, read, close sequence
fn probe<T: UsbHost>(
    host: &T,
    identifier: DeviceIdentifier,
    interface: u8,
    configuration: u8,
    reattach: bool,
) -> Result<ProbeReport> {
    let options = SessionOptions::default()
        .restore_kernel_driver(reattach)
        .span(info_span!("probe", device = %identifier));

    let mut session = match DeviceSession::open_with(host, identifier, options) {
        Ok(session) => session,
        Err(OpenError::NotFound(id)) => {
            bail!("Couldn't open device [{}]: no such device attached", id)
        }
        Err(e) => return Err(e).context("Failed to open device"),
    };

    session
        .prepare(interface, configuration)
        .context("Failed to prepare device")?;

    let descriptor = session
        .read_device_descriptor()
        .context("Failed to read device descriptor")?;
    let strings = DeviceStrings::read(&session, &descriptor);

    let kernel_driver_detached = session.kernel_driver_was_attached();
    let location = session.location();
    session.close();

    Ok(ProbeReport {
        identifier,
        location,
        interface,
        configuration,
        kernel_driver_detached,
        descriptor,
        strings,
    })
}
