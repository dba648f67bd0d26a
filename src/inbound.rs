//! # Inbound Update Processor
//!
//! Routes inbound payloads to the matching decode + merge pair.
//!
//! Only a payload of the wrong length surfaces as an error. Unknown channels,
//! a missing vessel or autopilot, and rejected mode requests are reported
//! through [`Dispatch`] and logged, so nothing here can halt the caller.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::simpit::decoder::decode;
use crate::simpit::protocol::{
    AutopilotMode, AutopilotModeCommand, CustomAxisCommand, InboundChannel, RotationCommand,
    ThrottleCommand, TranslationCommand, WheelCommand,
};
use crate::store::AxisStore;
use crate::vessel::FlightHost;

/// What an inbound packet did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Axis update merged into the store
    Merged(InboundChannel),
    /// Autopilot switched to the requested mode
    ModeSet(AutopilotMode),
    /// Requested mode id is unknown or not currently settable
    ModeRejected(u8),
    /// No vessel is under control
    NoActiveVehicle,
    /// Active vessel has no autopilot
    NoAutopilot,
    /// Channel id not handled here
    UnknownChannel(u8),
}

/// Applies inbound packets to the canonical axis state
#[derive(Debug, Clone)]
pub struct InboundProcessor {
    store: Arc<AxisStore>,
}

impl InboundProcessor {
    pub fn new(store: Arc<AxisStore>) -> Self {
        Self { store }
    }

    /// Decode and apply one inbound packet
    ///
    /// # Arguments
    ///
    /// * `channel_id` - Raw channel id from the transport
    /// * `payload` - Undecoded payload bytes
    /// * `host` - Simulator, consulted only for autopilot requests
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` if the payload length does not match the
    /// channel's record. Canonical state is untouched in that case.
    pub fn deliver<H>(&self, channel_id: u8, payload: &[u8], host: &mut H) -> Result<Dispatch>
    where
        H: FlightHost + ?Sized,
    {
        let channel = match InboundChannel::try_from(channel_id) {
            Ok(channel) => channel,
            Err(id) => {
                debug!("Ignoring packet on unknown channel {}", id);
                return Ok(Dispatch::UnknownChannel(id));
            }
        };

        self.apply(channel, payload, host).inspect_err(|e| {
            warn!("Dropping packet on channel {:?}: {}", channel, e);
        })
    }

    fn apply<H>(&self, channel: InboundChannel, payload: &[u8], host: &mut H) -> Result<Dispatch>
    where
        H: FlightHost + ?Sized,
    {
        match channel {
            InboundChannel::Rotation => {
                self.store.merge_rotation(&decode::<RotationCommand>(payload)?);
            }
            InboundChannel::Translation => {
                self.store
                    .merge_translation(&decode::<TranslationCommand>(payload)?);
            }
            InboundChannel::Wheel => {
                self.store.merge_wheel(&decode::<WheelCommand>(payload)?);
            }
            InboundChannel::CustomAxis => {
                self.store.merge_custom(&decode::<CustomAxisCommand>(payload)?);
            }
            InboundChannel::Throttle => {
                let cmd = decode::<ThrottleCommand>(payload)?;
                self.store.replace_throttle(cmd.throttle);
            }
            InboundChannel::AutopilotMode => {
                let cmd = decode::<AutopilotModeCommand>(payload)?;
                return Ok(Self::request_mode(cmd.mode, host));
            }
        }

        Ok(Dispatch::Merged(channel))
    }

    fn request_mode<H>(mode_id: u8, host: &mut H) -> Dispatch
    where
        H: FlightHost + ?Sized,
    {
        let Some(vessel) = host.active_vessel() else {
            debug!("Ignoring autopilot mode {}: no active vessel", mode_id);
            return Dispatch::NoActiveVehicle;
        };
        let Some(autopilot) = vessel.autopilot() else {
            debug!("Ignoring autopilot mode {}: vessel has no autopilot", mode_id);
            return Dispatch::NoAutopilot;
        };

        match AutopilotMode::try_from(mode_id) {
            Ok(mode) if autopilot.can_set_mode(mode) => {
                autopilot.set_mode(mode);
                info!("Autopilot mode set to {:?}", mode);
                Dispatch::ModeSet(mode)
            }
            Ok(mode) => {
                warn!("Unable to set autopilot mode to {:?}", mode);
                Dispatch::ModeRejected(mode_id)
            }
            Err(id) => {
                warn!("Unable to set unknown autopilot mode {}", id);
                Dispatch::ModeRejected(id)
            }
        }
    }
}
