//! # Outbound Change Publisher
//!
//! Reports simulator state back to the hardware, gated on change.
//!
//! Publishers are polled by the host at their own interval. A packet is
//! queued only when the freshly sampled record differs from the last one
//! actually handed to the transport, which bounds outbound traffic to state
//! transitions.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Result, SimpitError};
use crate::simpit::encoder::{axis_to_raw, encode};
use crate::simpit::protocol::{
    AutopilotMode, OutboundChannel, Packet, RotationCommand, RotationMask, SasStatus,
    ThrottleCommand, TranslationCommand, TranslationMask, WheelCommand, WheelMask, WireRecord,
    SAS_MODE_DISABLED,
};
use crate::vessel::{Autopilot, FlightCtrlState, FlightHost};

/// Destination for outbound packets
///
/// Implementations hand packets to the transport; the core never retries.
pub trait PacketSink {
    fn transmit(&mut self, packet: Packet) -> Result<()>;
}

impl PacketSink for Vec<Packet> {
    fn transmit(&mut self, packet: Packet) -> Result<()> {
        self.push(packet);
        Ok(())
    }
}

impl PacketSink for mpsc::UnboundedSender<Packet> {
    fn transmit(&mut self, packet: Packet) -> Result<()> {
        self.send(packet).map_err(|_| SimpitError::QueueClosed)
    }
}

/// Encode `record` and transmit it on `channel`
fn transmit_record<S, T>(sink: &mut S, channel: OutboundChannel, record: &T) -> Result<()>
where
    S: PacketSink + ?Sized,
    T: WireRecord,
{
    sink.transmit(Packet::new(channel, encode(record)))
}

/// Sample the autopilot into a status record
///
/// Availability has bit `i` set for every mode id `i` the autopilot reports as
/// settable.
pub fn sample_sas_status(autopilot: &dyn Autopilot) -> SasStatus {
    let current_mode = if autopilot.is_enabled() {
        autopilot.mode().id()
    } else {
        SAS_MODE_DISABLED
    };

    let availability = AutopilotMode::ALL
        .iter()
        .filter(|mode| autopilot.can_set_mode(**mode))
        .fold(0u16, |mask, mode| mask | (1 << mode.id()));

    SasStatus {
        current_mode,
        availability,
    }
}

/// Publishes autopilot status when it changes
#[derive(Debug, Clone)]
pub struct SasPublisher {
    last_sent: SasStatus,
}

impl Default for SasPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SasPublisher {
    /// Creates a publisher that assumes the hardware shows "disabled".
    pub fn new() -> Self {
        Self {
            last_sent: SasStatus::DISABLED,
        }
    }

    /// Last status handed to the transport
    pub fn last_sent(&self) -> SasStatus {
        self.last_sent
    }

    /// Sample the active autopilot and transmit its status if it changed
    ///
    /// Without an active vessel or autopilot nothing is sampled and the
    /// last-sent record is kept.
    ///
    /// # Returns
    ///
    /// * `Result<bool>` - Whether a packet was transmitted
    ///
    /// # Errors
    ///
    /// Returns error if the sink rejects the packet; the status is then sent
    /// again on the next poll.
    pub fn poll<H, S>(&mut self, host: &mut H, sink: &mut S) -> Result<bool>
    where
        H: FlightHost + ?Sized,
        S: PacketSink + ?Sized,
    {
        let Some(vessel) = host.active_vessel() else {
            debug!("Skipping SAS status: no active vessel");
            return Ok(false);
        };
        let Some(autopilot) = vessel.autopilot() else {
            debug!("Skipping SAS status: vessel has no autopilot");
            return Ok(false);
        };

        let status = sample_sas_status(autopilot);
        if status == self.last_sent {
            return Ok(false);
        }

        transmit_record(sink, OutboundChannel::SasInfo, &status).inspect_err(|e| {
            warn!("Failed to queue SAS status: {}", e);
        })?;
        debug!(
            "SAS status changed: mode {} availability 0b{:b}",
            status.current_mode, status.availability
        );
        self.last_sent = status;

        Ok(true)
    }
}

/// Echoes the last applied control record back to the hardware
///
/// Each of the rotation, translation, wheel and throttle channels is gated
/// independently. Echo records are sent with an empty mask; the receiver
/// takes every field as reported.
#[derive(Debug, Clone, Default)]
pub struct CommandEcho {
    last_rotation: Option<RotationCommand>,
    last_translation: Option<TranslationCommand>,
    last_wheel: Option<WheelCommand>,
    last_throttle: Option<ThrottleCommand>,
}

impl CommandEcho {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transmit every echo record that changed since it was last sent
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of packets transmitted
    pub fn poll<S>(&mut self, applied: &FlightCtrlState, sink: &mut S) -> Result<usize>
    where
        S: PacketSink + ?Sized,
    {
        let rotation = RotationCommand {
            pitch: axis_to_raw(applied.pitch),
            roll: axis_to_raw(applied.roll),
            yaw: axis_to_raw(applied.yaw),
            mask: RotationMask::empty(),
        };
        let translation = TranslationCommand {
            x: axis_to_raw(applied.x),
            y: axis_to_raw(applied.y),
            z: axis_to_raw(applied.z),
            mask: TranslationMask::empty(),
        };
        let wheel = WheelCommand {
            steer: axis_to_raw(applied.wheel_steer),
            throttle: axis_to_raw(applied.wheel_throttle),
            mask: WheelMask::empty(),
        };
        let throttle = ThrottleCommand {
            throttle: axis_to_raw(applied.main_throttle),
        };

        let mut sent = 0;
        sent += Self::publish(
            sink,
            OutboundChannel::RotationCmd,
            rotation,
            &mut self.last_rotation,
        )?;
        sent += Self::publish(
            sink,
            OutboundChannel::TranslationCmd,
            translation,
            &mut self.last_translation,
        )?;
        sent += Self::publish(sink, OutboundChannel::WheelCmd, wheel, &mut self.last_wheel)?;
        sent += Self::publish(
            sink,
            OutboundChannel::ThrottleCmd,
            throttle,
            &mut self.last_throttle,
        )?;

        Ok(sent)
    }

    fn publish<S, T>(
        sink: &mut S,
        channel: OutboundChannel,
        record: T,
        last: &mut Option<T>,
    ) -> Result<usize>
    where
        S: PacketSink + ?Sized,
        T: WireRecord + PartialEq + Copy,
    {
        if last.as_ref() == Some(&record) {
            return Ok(0);
        }

        transmit_record(sink, channel, &record)?;
        *last = Some(record);
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simpit::decoder::decode;
    use crate::vessel::mocks::TestHost;
    use crate::vessel::MockAutopilot;

    fn autopilot(enabled: bool, mode: AutopilotMode, settable: &'static [u8]) -> MockAutopilot {
        let mut autopilot = MockAutopilot::new();
        autopilot.expect_is_enabled().return_const(enabled);
        autopilot.expect_mode().return_const(mode);
        autopilot
            .expect_can_set_mode()
            .returning(move |m| settable.contains(&m.id()));
        autopilot
    }

    /// Sink that refuses every packet
    struct ClosedSink;

    impl PacketSink for ClosedSink {
        fn transmit(&mut self, _packet: Packet) -> Result<()> {
            Err(SimpitError::QueueClosed)
        }
    }

    #[test]
    fn test_availability_mask_construction() {
        let autopilot = autopilot(true, AutopilotMode::StabilityAssist, &[0, 2, 5]);
        let status = sample_sas_status(&autopilot);
        assert_eq!(status.availability, 0b100101);
        assert_eq!(status.current_mode, 0);
    }

    #[test]
    fn test_disabled_autopilot_reports_sentinel() {
        let autopilot = autopilot(false, AutopilotMode::Prograde, &[0, 1]);
        let status = sample_sas_status(&autopilot);
        assert_eq!(status.current_mode, SAS_MODE_DISABLED);
        assert_eq!(status.availability, 0b11);
    }

    #[test]
    fn test_identical_samples_transmit_once() {
        let mut host =
            TestHost::with_autopilot(autopilot(true, AutopilotMode::Retrograde, &[1, 2]));
        let mut publisher = SasPublisher::new();
        let mut sink: Vec<Packet> = Vec::new();

        assert!(publisher.poll(&mut host, &mut sink).unwrap());
        assert!(!publisher.poll(&mut host, &mut sink).unwrap());

        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].channel, OutboundChannel::SasInfo as u8);
        let status: SasStatus = decode(&sink[0].payload).unwrap();
        assert_eq!(
            status,
            SasStatus {
                current_mode: 2,
                availability: 0b0110
            }
        );
        assert_eq!(publisher.last_sent(), status);
    }

    #[test]
    fn test_change_in_either_field_transmits() {
        let mut publisher = SasPublisher::new();
        let mut sink: Vec<Packet> = Vec::new();

        let mut host = TestHost::with_autopilot(autopilot(true, AutopilotMode::Normal, &[3]));
        assert!(publisher.poll(&mut host, &mut sink).unwrap());

        // Same mode, different availability
        let mut host = TestHost::with_autopilot(autopilot(true, AutopilotMode::Normal, &[3, 4]));
        assert!(publisher.poll(&mut host, &mut sink).unwrap());

        // Same availability, different mode
        let mut host =
            TestHost::with_autopilot(autopilot(true, AutopilotMode::Antinormal, &[3, 4]));
        assert!(publisher.poll(&mut host, &mut sink).unwrap());

        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn test_initial_disabled_state_is_not_resent() {
        let mut host = TestHost::with_autopilot(autopilot(false, AutopilotMode::Prograde, &[]));
        let mut publisher = SasPublisher::new();
        let mut sink: Vec<Packet> = Vec::new();

        assert!(!publisher.poll(&mut host, &mut sink).unwrap());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_no_vessel_leaves_last_sent_untouched() {
        let mut publisher = SasPublisher::new();
        let mut sink: Vec<Packet> = Vec::new();

        let mut host = TestHost::with_autopilot(autopilot(true, AutopilotMode::Target, &[7]));
        publisher.poll(&mut host, &mut sink).unwrap();
        let before = publisher.last_sent();

        let mut empty = TestHost::default();
        assert!(!publisher.poll(&mut empty, &mut sink).unwrap());
        let mut no_autopilot = TestHost::with_axis_groups();
        assert!(!publisher.poll(&mut no_autopilot, &mut sink).unwrap());

        assert_eq!(publisher.last_sent(), before);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_failed_transmit_retried_next_poll() {
        let mut host = TestHost::with_autopilot(autopilot(true, AutopilotMode::Maneuver, &[9]));
        let mut publisher = SasPublisher::new();

        assert!(publisher.poll(&mut host, &mut ClosedSink).is_err());
        assert_eq!(publisher.last_sent(), SasStatus::DISABLED);

        let mut sink: Vec<Packet> = Vec::new();
        assert!(publisher.poll(&mut host, &mut sink).unwrap());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_unbounded_sender_sink() {
        let (mut tx, mut rx) = mpsc::unbounded_channel();
        let packet = Packet::new(OutboundChannel::ThrottleCmd, vec![1, 2]);

        tx.transmit(packet.clone()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), packet);

        drop(rx);
        assert!(matches!(tx.transmit(packet), Err(SimpitError::QueueClosed)));
    }

    #[test]
    fn test_command_echo_sends_all_channels_once() {
        let mut echo = CommandEcho::new();
        let mut sink: Vec<Packet> = Vec::new();
        let applied = FlightCtrlState {
            pitch: 1.0,
            yaw: -1.0,
            main_throttle: 0.5,
            ..FlightCtrlState::default()
        };

        assert_eq!(echo.poll(&applied, &mut sink).unwrap(), 4);
        assert_eq!(echo.poll(&applied, &mut sink).unwrap(), 0);

        let channels: Vec<u8> = sink.iter().map(|p| p.channel).collect();
        assert_eq!(channels, vec![47, 48, 49, 50]);

        let rotation: RotationCommand = decode(&sink[0].payload).unwrap();
        assert_eq!(rotation.pitch, 32767);
        assert_eq!(rotation.roll, 0);
        assert_eq!(rotation.yaw, -32767);
        assert_eq!(rotation.mask, RotationMask::empty());

        let throttle: ThrottleCommand = decode(&sink[3].payload).unwrap();
        assert_eq!(throttle.throttle, 16383);
    }

    #[test]
    fn test_command_echo_only_changed_channels() {
        let mut echo = CommandEcho::new();
        let mut sink: Vec<Packet> = Vec::new();
        let mut applied = FlightCtrlState::default();
        echo.poll(&applied, &mut sink).unwrap();
        sink.clear();

        applied.wheel_steer = -0.5;
        assert_eq!(echo.poll(&applied, &mut sink).unwrap(), 1);
        assert_eq!(sink[0].channel, OutboundChannel::WheelCmd as u8);

        let wheel: WheelCommand = decode(&sink[0].payload).unwrap();
        assert_eq!(wheel.steer, -16383);
        assert_eq!(wheel.throttle, 0);
        assert!(wheel.mask.is_empty());
    }
}
