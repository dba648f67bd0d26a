//! # Simpit Protocol Constants and Types
//!
//! Channel ids and fixed-layout records exchanged with cockpit hardware.
//!
//! Every record is packed (no padding) and little-endian. Axis magnitudes are
//! signed 16-bit values; the normalized value is `raw / 32767`.

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes};

/// First frame header byte
pub const SIMPIT_HEADER_0: u8 = 0xAA;

/// Second frame header byte
pub const SIMPIT_HEADER_1: u8 = 0x50;

/// Frame overhead: header(2) + size(1) + channel(1)
pub const SIMPIT_FRAME_OVERHEAD: usize = 4;

/// Maximum payload carried by a single frame
pub const SIMPIT_MAX_PAYLOAD_SIZE: usize = 32;

/// Raw axis value mapped to a normalized magnitude of 1.0
pub const AXIS_FULL_SCALE: f32 = i16::MAX as f32;

/// `SasStatus::current_mode` value meaning "autopilot disabled"
pub const SAS_MODE_DISABLED: u8 = 255;

/// Channels carrying hardware-originated updates into the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InboundChannel {
    Rotation = 16,
    Translation = 17,
    Wheel = 18,
    Throttle = 19,
    AutopilotMode = 20,
    CustomAxis = 27,
}

impl InboundChannel {
    /// Fixed payload size expected on this channel
    pub fn payload_size(self) -> usize {
        match self {
            InboundChannel::Rotation => RotationCommand::SIZE,
            InboundChannel::Translation => TranslationCommand::SIZE,
            InboundChannel::Wheel => WheelCommand::SIZE,
            InboundChannel::Throttle => ThrottleCommand::SIZE,
            InboundChannel::AutopilotMode => AutopilotModeCommand::SIZE,
            InboundChannel::CustomAxis => CustomAxisCommand::SIZE,
        }
    }
}

impl TryFrom<u8> for InboundChannel {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            16 => Ok(InboundChannel::Rotation),
            17 => Ok(InboundChannel::Translation),
            18 => Ok(InboundChannel::Wheel),
            19 => Ok(InboundChannel::Throttle),
            20 => Ok(InboundChannel::AutopilotMode),
            27 => Ok(InboundChannel::CustomAxis),
            other => Err(other),
        }
    }
}

/// Channels carrying simulator state out to the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OutboundChannel {
    SasInfo = 42,
    RotationCmd = 47,
    TranslationCmd = 48,
    WheelCmd = 49,
    ThrottleCmd = 50,
}

impl From<OutboundChannel> for u8 {
    fn from(channel: OutboundChannel) -> u8 {
        channel as u8
    }
}

/// Autopilot (SAS) modes, numbered as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AutopilotMode {
    StabilityAssist = 0,
    Prograde = 1,
    Retrograde = 2,
    Normal = 3,
    Antinormal = 4,
    RadialIn = 5,
    RadialOut = 6,
    Target = 7,
    AntiTarget = 8,
    Maneuver = 9,
}

impl AutopilotMode {
    /// Every mode, in id order
    pub const ALL: [AutopilotMode; 10] = [
        AutopilotMode::StabilityAssist,
        AutopilotMode::Prograde,
        AutopilotMode::Retrograde,
        AutopilotMode::Normal,
        AutopilotMode::Antinormal,
        AutopilotMode::RadialIn,
        AutopilotMode::RadialOut,
        AutopilotMode::Target,
        AutopilotMode::AntiTarget,
        AutopilotMode::Maneuver,
    ];

    /// Wire id of this mode
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for AutopilotMode {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        AutopilotMode::ALL.get(id as usize).copied().ok_or(id)
    }
}

bitflags! {
    /// Valid-field mask of a [`RotationCommand`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RotationMask: u8 {
        const PITCH = 1;
        const ROLL = 1 << 1;
        const YAW = 1 << 2;
    }
}

bitflags! {
    /// Valid-field mask of a [`TranslationCommand`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TranslationMask: u8 {
        const X = 1;
        const Y = 1 << 1;
        const Z = 1 << 2;
    }
}

bitflags! {
    /// Valid-field mask of a [`WheelCommand`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WheelMask: u8 {
        const STEER = 1;
        const THROTTLE = 1 << 1;
    }
}

bitflags! {
    /// Valid-field mask of a [`CustomAxisCommand`]; bit `n - 1` covers custom axis `n`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CustomAxisMask: u8 {
        const CUSTOM1 = 1;
        const CUSTOM2 = 1 << 1;
        const CUSTOM3 = 1 << 2;
        const CUSTOM4 = 1 << 3;
    }
}

/// A packed, fixed-size record with a layout-faithful little-endian encoding.
pub trait WireRecord: Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Append the record to `buf`
    fn put<B: BufMut>(&self, buf: &mut B);

    /// Read the record from `buf`, which holds at least `SIZE` bytes
    fn get<B: Buf>(buf: &mut B) -> Self;
}

/// Rotation update: pitch, roll and yaw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationCommand {
    pub pitch: i16,
    pub roll: i16,
    pub yaw: i16,
    pub mask: RotationMask,
}

impl WireRecord for RotationCommand {
    const SIZE: usize = 7;

    fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_i16_le(self.pitch);
        buf.put_i16_le(self.roll);
        buf.put_i16_le(self.yaw);
        buf.put_u8(self.mask.bits());
    }

    fn get<B: Buf>(buf: &mut B) -> Self {
        Self {
            pitch: buf.get_i16_le(),
            roll: buf.get_i16_le(),
            yaw: buf.get_i16_le(),
            mask: RotationMask::from_bits_retain(buf.get_u8()),
        }
    }
}

/// Translation update: X, Y and Z
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationCommand {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub mask: TranslationMask,
}

impl WireRecord for TranslationCommand {
    const SIZE: usize = 7;

    fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_i16_le(self.x);
        buf.put_i16_le(self.y);
        buf.put_i16_le(self.z);
        buf.put_u8(self.mask.bits());
    }

    fn get<B: Buf>(buf: &mut B) -> Self {
        Self {
            x: buf.get_i16_le(),
            y: buf.get_i16_le(),
            z: buf.get_i16_le(),
            mask: TranslationMask::from_bits_retain(buf.get_u8()),
        }
    }
}

/// Wheel update: steering and wheel throttle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelCommand {
    pub steer: i16,
    pub throttle: i16,
    pub mask: WheelMask,
}

impl WireRecord for WheelCommand {
    const SIZE: usize = 5;

    fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_i16_le(self.steer);
        buf.put_i16_le(self.throttle);
        buf.put_u8(self.mask.bits());
    }

    fn get<B: Buf>(buf: &mut B) -> Self {
        Self {
            steer: buf.get_i16_le(),
            throttle: buf.get_i16_le(),
            mask: WheelMask::from_bits_retain(buf.get_u8()),
        }
    }
}

/// Custom axis update: `custom[n - 1]` carries custom axis `n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomAxisCommand {
    pub custom: [i16; 4],
    pub mask: CustomAxisMask,
}

impl WireRecord for CustomAxisCommand {
    const SIZE: usize = 9;

    fn put<B: BufMut>(&self, buf: &mut B) {
        for value in self.custom {
            buf.put_i16_le(value);
        }
        buf.put_u8(self.mask.bits());
    }

    fn get<B: Buf>(buf: &mut B) -> Self {
        let mut custom = [0i16; 4];
        for value in custom.iter_mut() {
            *value = buf.get_i16_le();
        }
        Self {
            custom,
            mask: CustomAxisMask::from_bits_retain(buf.get_u8()),
        }
    }
}

/// Main throttle update (no mask, always fully valid)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleCommand {
    pub throttle: i16,
}

impl WireRecord for ThrottleCommand {
    const SIZE: usize = 2;

    fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_i16_le(self.throttle);
    }

    fn get<B: Buf>(buf: &mut B) -> Self {
        Self {
            throttle: buf.get_i16_le(),
        }
    }
}

/// Autopilot mode request, carried as a raw mode id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutopilotModeCommand {
    pub mode: u8,
}

impl WireRecord for AutopilotModeCommand {
    const SIZE: usize = 1;

    fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.mode);
    }

    fn get<B: Buf>(buf: &mut B) -> Self {
        Self { mode: buf.get_u8() }
    }
}

/// Autopilot status reported to the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SasStatus {
    /// Active mode id, or [`SAS_MODE_DISABLED`]
    pub current_mode: u8,
    /// Bit `i` set iff mode `i` can currently be selected
    pub availability: u16,
}

impl SasStatus {
    /// Status reported before any autopilot has been sampled
    pub const DISABLED: SasStatus = SasStatus {
        current_mode: SAS_MODE_DISABLED,
        availability: 0,
    };
}

impl WireRecord for SasStatus {
    const SIZE: usize = 3;

    fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.current_mode);
        buf.put_u16_le(self.availability);
    }

    fn get<B: Buf>(buf: &mut B) -> Self {
        Self {
            current_mode: buf.get_u8(),
            availability: buf.get_u16_le(),
        }
    }
}

/// A channel id paired with its undecoded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub channel: u8,
    pub payload: Bytes,
}

impl Packet {
    pub fn new(channel: impl Into<u8>, payload: impl Into<Bytes>) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_constants() {
        assert_eq!(SIMPIT_HEADER_0, 0xAA);
        assert_eq!(SIMPIT_HEADER_1, 0x50);
        assert_eq!(SIMPIT_FRAME_OVERHEAD, 4);
        assert_eq!(SIMPIT_MAX_PAYLOAD_SIZE, 32);
    }

    #[test]
    fn test_record_sizes() {
        assert_eq!(RotationCommand::SIZE, 7);
        assert_eq!(TranslationCommand::SIZE, 7);
        assert_eq!(WheelCommand::SIZE, 5);
        assert_eq!(CustomAxisCommand::SIZE, 9);
        assert_eq!(ThrottleCommand::SIZE, 2);
        assert_eq!(AutopilotModeCommand::SIZE, 1);
        assert_eq!(SasStatus::SIZE, 3);
    }

    #[test]
    fn test_inbound_channel_ids() {
        for channel in [
            InboundChannel::Rotation,
            InboundChannel::Translation,
            InboundChannel::Wheel,
            InboundChannel::Throttle,
            InboundChannel::AutopilotMode,
            InboundChannel::CustomAxis,
        ] {
            assert_eq!(InboundChannel::try_from(channel as u8), Ok(channel));
        }
        assert_eq!(InboundChannel::try_from(0xFF), Err(0xFF));
        assert_eq!(InboundChannel::try_from(42), Err(42));
    }

    #[test]
    fn test_inbound_payload_sizes() {
        assert_eq!(InboundChannel::Rotation.payload_size(), 7);
        assert_eq!(InboundChannel::Wheel.payload_size(), 5);
        assert_eq!(InboundChannel::CustomAxis.payload_size(), 9);
        assert_eq!(InboundChannel::Throttle.payload_size(), 2);
    }

    #[test]
    fn test_autopilot_mode_ids() {
        for (id, mode) in AutopilotMode::ALL.iter().enumerate() {
            assert_eq!(mode.id() as usize, id);
            assert_eq!(AutopilotMode::try_from(id as u8), Ok(*mode));
        }
        assert_eq!(AutopilotMode::try_from(10), Err(10));
        assert_eq!(AutopilotMode::try_from(SAS_MODE_DISABLED), Err(255));
    }

    #[test]
    fn test_mask_bits() {
        assert_eq!(RotationMask::all().bits(), 0b111);
        assert_eq!(TranslationMask::all().bits(), 0b111);
        assert_eq!(WheelMask::all().bits(), 0b11);
        assert_eq!(CustomAxisMask::all().bits(), 0b1111);
        assert_eq!(CustomAxisMask::CUSTOM3.bits(), 1 << 2);
    }

    #[test]
    fn test_rotation_layout_is_packed_little_endian() {
        let cmd = RotationCommand {
            pitch: 0x0102,
            roll: -2,
            yaw: 0x7FFF,
            mask: RotationMask::PITCH | RotationMask::YAW,
        };
        let mut buf: Vec<u8> = Vec::new();
        cmd.put(&mut buf);
        assert_eq!(buf, vec![0x02, 0x01, 0xFE, 0xFF, 0xFF, 0x7F, 0b101]);
    }

    #[test]
    fn test_sas_status_layout() {
        let status = SasStatus {
            current_mode: 2,
            availability: 0x0106,
        };
        let mut buf: Vec<u8> = Vec::new();
        status.put(&mut buf);
        assert_eq!(buf, vec![0x02, 0x06, 0x01]);
    }

    #[test]
    fn test_unknown_mask_bits_are_retained() {
        let mut bytes: &[u8] = &[0, 0, 0, 0, 0, 0, 0xF9];
        let cmd = RotationCommand::get(&mut bytes);
        assert_eq!(cmd.mask.bits(), 0xF9);
        assert!(cmd.mask.contains(RotationMask::PITCH));
        assert!(!cmd.mask.contains(RotationMask::ROLL));
    }

    #[test]
    fn test_sas_disabled_sentinel() {
        assert_eq!(SasStatus::DISABLED.current_mode, 255);
        assert_eq!(SasStatus::DISABLED.availability, 0);
    }
}
