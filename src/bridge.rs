//! # Axis Bridge
//!
//! Explicitly constructed owner of the whole synchronization core.
//!
//! The host calls [`AxisBridge::init`] when a flight starts, then drives the
//! bridge from its own loop:
//!
//! - [`deliver`](AxisBridge::deliver) for every inbound packet
//! - [`control_tick`](AxisBridge::control_tick) once per control cycle
//! - [`poll_sas`](AxisBridge::poll_sas) and
//!   [`poll_command_echo`](AxisBridge::poll_command_echo) at their polling intervals
//!
//! and finally [`shutdown`](AxisBridge::shutdown). Nothing persists across sessions.
//!
//! ## Usage
//!
//! ```
//! use simpit_bridge::bridge::AxisBridge;
//! use simpit_bridge::simpit::protocol::Packet;
//! use simpit_bridge::vessel::{
//!     Autopilot, AxisGroupSink, FlightCtrlState, FlightHost, Vessel,
//! };
//!
//! struct BareVessel;
//!
//! impl Vessel for BareVessel {
//!     fn autopilot(&mut self) -> Option<&mut dyn Autopilot> {
//!         None
//!     }
//!
//!     fn axis_groups(&mut self) -> Option<&mut dyn AxisGroupSink> {
//!         None
//!     }
//! }
//!
//! struct Host {
//!     vessel: BareVessel,
//! }
//!
//! impl FlightHost for Host {
//!     fn active_vessel(&mut self) -> Option<&mut dyn Vessel> {
//!         Some(&mut self.vessel)
//!     }
//! }
//!
//! let mut bridge = AxisBridge::init(false);
//! let mut host = Host { vessel: BareVessel };
//!
//! // Throttle at full
//! bridge.deliver(19, &[0xFF, 0x7F], &mut host)?;
//!
//! let mut ctrl = FlightCtrlState::default();
//! assert!(bridge.control_tick(&mut host, &mut ctrl));
//! assert_eq!(ctrl.main_throttle, 1.0);
//!
//! // No autopilot, nothing to report
//! let mut outbound: Vec<Packet> = Vec::new();
//! bridge.poll_sas(&mut host, &mut outbound)?;
//! assert!(outbound.is_empty());
//!
//! bridge.shutdown();
//! # Ok::<(), simpit_bridge::error::SimpitError>(())
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use crate::applier::ControlApplier;
use crate::error::Result;
use crate::inbound::{Dispatch, InboundProcessor};
use crate::outbound::{CommandEcho, PacketSink, SasPublisher};
use crate::store::{AxisSnapshot, AxisStore};
use crate::vessel::{FlightCtrlState, FlightHost};

/// Synchronization engine for one flight session
#[derive(Debug)]
pub struct AxisBridge {
    store: Arc<AxisStore>,
    inbound: InboundProcessor,
    applier: ControlApplier,
    sas: SasPublisher,
    echo: Option<CommandEcho>,
}

impl AxisBridge {
    /// Start a session with idle axes and a disabled SAS status
    ///
    /// # Arguments
    ///
    /// * `command_echo` - Whether applied controls are echoed back to the hardware
    pub fn init(command_echo: bool) -> Self {
        let store = Arc::new(AxisStore::new());
        info!(
            "Axis bridge started (command echo {})",
            if command_echo { "on" } else { "off" }
        );

        Self {
            inbound: InboundProcessor::new(Arc::clone(&store)),
            store,
            applier: ControlApplier::new(),
            sas: SasPublisher::new(),
            echo: command_echo.then(CommandEcho::new),
        }
    }

    /// Shared canonical state, for feeding inbound packets from another thread
    pub fn store(&self) -> Arc<AxisStore> {
        Arc::clone(&self.store)
    }

    /// Processor sharing this bridge's canonical state
    pub fn inbound(&self) -> InboundProcessor {
        self.inbound.clone()
    }

    /// Current canonical axis state
    pub fn snapshot(&self) -> AxisSnapshot {
        self.store.snapshot()
    }

    /// Apply one inbound packet
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` if the payload length is wrong for its channel
    pub fn deliver<H>(&self, channel_id: u8, payload: &[u8], host: &mut H) -> Result<Dispatch>
    where
        H: FlightHost + ?Sized,
    {
        self.inbound.deliver(channel_id, payload, host)
    }

    /// Run one control cycle
    ///
    /// Writes the canonical state into `ctrl` and the active vessel's axis
    /// groups, then records `ctrl` as the last applied state. Without an
    /// active vessel the cycle is skipped entirely, leaving `ctrl`, the last
    /// applied state and the throttle edge untouched.
    ///
    /// # Returns
    ///
    /// * `bool` - Whether the cycle was applied
    pub fn control_tick<H>(&mut self, host: &mut H, ctrl: &mut FlightCtrlState) -> bool
    where
        H: FlightHost + ?Sized,
    {
        let Some(vessel) = host.active_vessel() else {
            debug!("Skipping control cycle: no active vessel");
            return false;
        };

        let snapshot = self.store.snapshot();
        self.applier.apply(&snapshot, ctrl, vessel.axis_groups());
        true
    }

    /// Control record produced by the most recent cycle
    pub fn last_applied(&self) -> &FlightCtrlState {
        self.applier.last_applied()
    }

    /// Publish the autopilot status if it changed
    ///
    /// # Returns
    ///
    /// * `Result<bool>` - Whether a packet was transmitted
    pub fn poll_sas<H, S>(&mut self, host: &mut H, sink: &mut S) -> Result<bool>
    where
        H: FlightHost + ?Sized,
        S: PacketSink + ?Sized,
    {
        self.sas.poll(host, sink)
    }

    /// Echo the last applied controls; a no-op when echo is disabled
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of packets transmitted
    pub fn poll_command_echo<S>(&mut self, sink: &mut S) -> Result<usize>
    where
        S: PacketSink + ?Sized,
    {
        match self.echo.as_mut() {
            Some(echo) => echo.poll(self.applier.last_applied(), sink),
            None => Ok(0),
        }
    }

    /// End the session, discarding all state
    pub fn shutdown(self) {
        let snapshot = self.store.snapshot();
        info!(
            "Axis bridge stopped (last throttle {}, SAS mode {})",
            snapshot.throttle,
            self.sas.last_sent().current_mode
        );
    }
}
