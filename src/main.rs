use clap::{Parser, ValueEnum};
use color_eyre::{eyre::eyre, Result};
use padnorm::config::Config;
use padnorm::controller::session::{Detecting, Ready};
use padnorm::controller::{first_gamepad, ControllerFamily, ControllerSession, SessionError};
use padnorm::device::replay::ReplaySource;
use padnorm::device::DeviceBackend;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Milliseconds between printed snapshots
    #[arg(long)]
    interval_ms: Option<u64>,

    /// List detected gamepads and exit
    #[arg(long)]
    list: bool,

    /// Replay a recorded trace instead of reading hardware
    #[arg(long, requires = "family")]
    replay: Option<PathBuf>,

    /// Controller family of the replayed trace
    #[arg(long, value_enum)]
    family: Option<FamilyArg>,

    /// Delay between replayed events in milliseconds
    #[arg(long, default_value_t = 0)]
    pace_ms: u64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum FamilyArg {
    /// Microsoft Xbox One controller
    XboxOne,
    /// Sony PLAYSTATION(R)3 controller
    Ps3,
}

impl From<FamilyArg> for ControllerFamily {
    fn from(value: FamilyArg) -> Self {
        match value {
            FamilyArg::XboxOne => ControllerFamily::XboxOne,
            FamilyArg::Ps3 => ControllerFamily::Ps3,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup(args.debug)?;

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => {
            let path = Config::default_path();
            if let Err(e) = Config::ensure_default(&path).await {
                warn!("Could not write default config to {}: {}", path.display(), e);
            }
            path
        }
    };
    let config = Config::load(&config_path)
        .await
        .map_err(|e| eyre!("Failed to load config {}: {}", config_path.display(), e))?;

    if args.list {
        return list_devices(&config);
    }

    let session = match (&args.replay, args.family) {
        (Some(path), Some(family)) => {
            let family = ControllerFamily::from(family);
            let profile = config.session.profile_for(family);
            let mut source = ReplaySource::from_file(path, &profile)?;
            if args.pace_ms > 0 {
                source = source.with_pacing(Duration::from_millis(args.pace_ms));
            }
            ControllerSession::create(Some(config.session.clone())).attach(family, source)?
        }
        _ => open_hardware(ControllerSession::create(Some(config.session.clone())))?,
    };

    let interval_ms = args.interval_ms.unwrap_or(config.cli.read_interval_ms).max(1);
    run(session, Duration::from_millis(interval_ms)).await
}

async fn run(session: ControllerSession<Ready>, period: Duration) -> Result<()> {
    info!("Printing {} snapshots every {:?}", session.family()?, period);
    let mut interval = tokio::time::interval(period);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match session.read() {
                    Ok(snapshot) => println!("{}", snapshot),
                    Err(SessionError::SessionClosed) => {
                        info!("Controller session ended");
                        break;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            _ = &mut ctrl_c => {
                info!("Interrupted, closing controller session");
                break;
            }
        }
    }

    let closed = session.close()?;
    println!("final: {}", closed.last_snapshot()?);
    Ok(())
}

#[cfg(all(target_os = "linux", feature = "evdev"))]
fn hardware_backend() -> Result<impl DeviceBackend> {
    Ok(padnorm::device::evdev::EvdevBackend)
}

#[cfg(not(all(target_os = "linux", feature = "evdev")))]
fn hardware_backend() -> Result<padnorm::device::replay::ReplayBackend> {
    Err(eyre!("No hardware backend in this build, use --replay"))
}

fn open_hardware(session: ControllerSession<Detecting>) -> Result<ControllerSession<Ready>> {
    let backend = hardware_backend()?;
    let descriptor = match first_gamepad(&backend) {
        Ok(descriptor) => descriptor,
        Err(SessionError::NoDeviceFound) => {
            warn!("No gamepad connected");
            return Err(SessionError::NoDeviceFound.into());
        }
        Err(e) => return Err(e.into()),
    };
    debug!("Opening {}", descriptor);
    Ok(session.open(&backend, &descriptor)?)
}

fn list_devices(config: &Config) -> Result<()> {
    let backend = hardware_backend()?;
    let devices = backend.enumerate()?;
    if devices.is_empty() {
        println!("No gamepads found");
    }
    for device in devices {
        let family = config
            .session
            .detection
            .detect(&device.name)
            .map(|f| f.to_string())
            .unwrap_or_else(|| "unsupported".to_string());
        println!("{} ({})", device, family);
    }
    Ok(())
}

fn setup(debug: bool) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env(if debug { Level::DEBUG } else { Level::INFO });
    Ok(())
}

// Logs go to stderr so snapshots on stdout stay pipeable
fn setup_logging_env(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}
