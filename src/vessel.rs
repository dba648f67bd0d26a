//! # Vessel Interfaces
//!
//! Seams between the synchronization core and the host simulator.
//!
//! The host owns the active vessel and hands it to the core on every call, so
//! a vessel switch needs no re-registration. A missing vessel, autopilot or
//! axis-group module is a normal transient condition, not an error.

use crate::simpit::protocol::AutopilotMode;

/// Named axis-group actuator channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisGroup {
    Pitch,
    Roll,
    Yaw,
    TranslateX,
    TranslateY,
    TranslateZ,
    WheelSteer,
    WheelThrottle,
    Custom01,
    Custom02,
    Custom03,
    Custom04,
}

impl AxisGroup {
    /// Custom axis groups, indexed like `CustomAxes::values`
    pub const CUSTOM: [AxisGroup; 4] = [
        AxisGroup::Custom01,
        AxisGroup::Custom02,
        AxisGroup::Custom03,
        AxisGroup::Custom04,
    ];
}

/// Control-output record for one control cycle
///
/// Every field is a normalized magnitude in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlightCtrlState {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub wheel_steer: f32,
    pub wheel_throttle: f32,
    pub main_throttle: f32,
}

impl FlightCtrlState {
    /// Control-surface field driven by `group`, if it has one
    ///
    /// Custom axis groups only exist on the actuator path.
    pub fn axis_mut(&mut self, group: AxisGroup) -> Option<&mut f32> {
        match group {
            AxisGroup::Pitch => Some(&mut self.pitch),
            AxisGroup::Roll => Some(&mut self.roll),
            AxisGroup::Yaw => Some(&mut self.yaw),
            AxisGroup::TranslateX => Some(&mut self.x),
            AxisGroup::TranslateY => Some(&mut self.y),
            AxisGroup::TranslateZ => Some(&mut self.z),
            AxisGroup::WheelSteer => Some(&mut self.wheel_steer),
            AxisGroup::WheelThrottle => Some(&mut self.wheel_throttle),
            AxisGroup::Custom01
            | AxisGroup::Custom02
            | AxisGroup::Custom03
            | AxisGroup::Custom04 => None,
        }
    }
}

/// Vessel autopilot (SAS)
#[cfg_attr(test, mockall::automock)]
pub trait Autopilot {
    /// Whether the autopilot is currently engaged
    fn is_enabled(&self) -> bool;

    /// Mode the autopilot is holding
    fn mode(&self) -> AutopilotMode;

    /// Whether `mode` can be selected right now
    fn can_set_mode(&self, mode: AutopilotMode) -> bool;

    /// Request a mode change
    fn set_mode(&mut self, mode: AutopilotMode);
}

/// Parallel actuator path keyed by axis group
pub trait AxisGroupSink {
    fn update_axis_group(&mut self, group: AxisGroup, value: f32);
}

/// A controllable vessel
pub trait Vessel {
    fn autopilot(&mut self) -> Option<&mut dyn Autopilot>;

    fn axis_groups(&mut self) -> Option<&mut dyn AxisGroupSink>;
}

/// Host simulator
pub trait FlightHost {
    /// Vessel currently under control, if any
    fn active_vessel(&mut self) -> Option<&mut dyn Vessel>;
}
