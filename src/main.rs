//! # Simpit Bridge
//!
//! Bench runner for a Simpit controller board.
//!
//! Opens the configured serial port and drives the full synchronization engine
//! against an in-process bench vessel, so inputs from the board can be checked
//! without a running simulator.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (first argument, or built-in defaults)
//!    - Set up logging, optionally to a daily log file
//!    - Open the serial port
//!
//! 2. **Main Loop**
//!    - Deliver every inbound packet to the engine
//!    - Run a control cycle at the configured tick rate
//!    - Poll SAS status and command echo, writing queued packets to the port
//!    - Handle Ctrl+C for graceful shutdown
//!
//! # Examples
//!
//! ```bash
//! cargo run --release -- config/bench.toml
//! ```

use anyhow::{Context, Result};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use simpit_bridge::bridge::AxisBridge;
use simpit_bridge::config::{Config, LoggingConfig};
use simpit_bridge::serial::SimpitSerial;
use simpit_bridge::simpit::protocol::{AutopilotMode, Packet};
use simpit_bridge::vessel::{
    Autopilot, AxisGroup, AxisGroupSink, FlightCtrlState, FlightHost, Vessel,
};

/// Seconds between control status log messages
const STATUS_LOG_SECONDS: u64 = 5;

/// Log file name prefix inside `logging.log_dir`
const LOG_FILE_PREFIX: &str = "simpit-bridge.log";

/// Autopilot that accepts every mode while engaged
#[derive(Debug)]
struct BenchAutopilot {
    enabled: bool,
    mode: AutopilotMode,
}

impl Default for BenchAutopilot {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: AutopilotMode::StabilityAssist,
        }
    }
}

impl Autopilot for BenchAutopilot {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn mode(&self) -> AutopilotMode {
        self.mode
    }

    fn can_set_mode(&self, _mode: AutopilotMode) -> bool {
        self.enabled
    }

    fn set_mode(&mut self, mode: AutopilotMode) {
        self.mode = mode;
    }
}

/// Axis groups that only log what they receive
#[derive(Debug, Default)]
struct BenchAxisGroups;

impl AxisGroupSink for BenchAxisGroups {
    fn update_axis_group(&mut self, group: AxisGroup, value: f32) {
        debug!("Axis group {:?} = {:.3}", group, value);
    }
}

#[derive(Debug, Default)]
struct BenchVessel {
    autopilot: BenchAutopilot,
    axis_groups: BenchAxisGroups,
}

impl Vessel for BenchVessel {
    fn autopilot(&mut self) -> Option<&mut dyn Autopilot> {
        Some(&mut self.autopilot)
    }

    fn axis_groups(&mut self) -> Option<&mut dyn AxisGroupSink> {
        Some(&mut self.axis_groups)
    }
}

/// Host with a single, always active bench vessel
#[derive(Debug, Default)]
struct BenchHost {
    vessel: BenchVessel,
}

impl FlightHost for BenchHost {
    fn active_vessel(&mut self) -> Option<&mut dyn Vessel> {
        Some(&mut self.vessel)
    }
}

/// Install the tracing subscriber
///
/// The returned guard flushes the log file and must live until exit.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if config.log_dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();

    Some(guard)
}

fn load_config() -> Result<Config> {
    match std::env::args().nth(1) {
        Some(path) => {
            Config::load(&path).with_context(|| format!("Failed to load config from {}", path))
        }
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    let _log_guard = init_logging(&config.logging);

    info!("Simpit Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut serial = SimpitSerial::open(&config.serial)?;
    info!("Simpit serial port opened at: {}", serial.device_path());

    let mut bridge = AxisBridge::init(config.outbound.command_echo);
    let mut host = BenchHost::default();
    let mut ctrl = FlightCtrlState::default();
    let mut outbox: Vec<Packet> = Vec::new();

    let mut control_tick = interval(config.tick_period());
    control_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sas_poll = interval(config.sas_poll_period());
    let mut echo_poll = interval(config.echo_period());

    let status_every = u64::from(config.control.tick_rate_hz) * STATUS_LOG_SECONDS;
    let mut cycles: u64 = 0;

    info!("Running control loop at {}Hz", config.control.tick_rate_hz);
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            packet = serial.recv_packet() => {
                let packet = packet.context("Serial link lost")?;
                if let Ok(dispatch) = bridge.deliver(packet.channel, &packet.payload, &mut host) {
                    debug!("Channel {}: {:?}", packet.channel, dispatch);
                }
            }

            _ = control_tick.tick() => {
                bridge.control_tick(&mut host, &mut ctrl);
                cycles += 1;

                if cycles % status_every == 0 {
                    info!(
                        "Cycle {}: pitch {:.2} roll {:.2} yaw {:.2} throttle {:.2}",
                        cycles, ctrl.pitch, ctrl.roll, ctrl.yaw, ctrl.main_throttle
                    );
                }
            }

            _ = sas_poll.tick() => {
                if let Err(e) = bridge.poll_sas(&mut host, &mut outbox) {
                    warn!("SAS status not queued: {}", e);
                }
            }

            _ = echo_poll.tick() => {
                if let Err(e) = bridge.poll_command_echo(&mut outbox) {
                    warn!("Command echo not queued: {}", e);
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total control cycles: {}", cycles);
                break;
            }
        }

        for packet in outbox.drain(..) {
            if let Err(e) = serial.send_packet(&packet).await {
                debug!("Failed to send packet: {}", e);
            }
        }
    }

    bridge.shutdown();
    Ok(())
}
