//! # Per-tick Control Applier
//!
//! Writes the canonical axis state into a control cycle's outputs.
//!
//! Every non-zero axis is normalized and driven through both the control
//! record and the named axis-group actuators. Zero means "no input" for every
//! axis except main throttle, where zero is an intentional stop that has to be
//! written once before the applier goes quiet.

use tracing::trace;

use crate::simpit::decoder::normalize_axis;
use crate::store::AxisSnapshot;
use crate::vessel::{AxisGroup, AxisGroupSink, FlightCtrlState};

/// The two output paths driven by one axis value
struct AxisOutputs<'c, 'g> {
    ctrl: &'c mut FlightCtrlState,
    groups: Option<&'g mut dyn AxisGroupSink>,
}

impl AxisOutputs<'_, '_> {
    /// Drive a raw axis value on both paths; zero leaves both untouched.
    fn drive(&mut self, group: AxisGroup, raw: i16) {
        if raw == 0 {
            return;
        }

        let value = normalize_axis(raw);
        if let Some(field) = self.ctrl.axis_mut(group) {
            *field = value;
        }
        if let Some(groups) = self.groups.as_mut() {
            groups.update_axis_group(group, value);
        }
    }
}

/// Applies canonical axis state once per control cycle
#[derive(Debug, Clone, Default)]
pub struct ControlApplier {
    last_throttle_sent_is_zero: bool,
    last_applied: FlightCtrlState,
}

impl ControlApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a snapshot to this cycle's control record
    ///
    /// # Arguments
    ///
    /// * `snapshot` - Canonical axis state for this cycle
    /// * `ctrl` - Control record the host will consume after this call
    /// * `groups` - Axis-group actuators of the active vessel, if present
    pub fn apply(
        &mut self,
        snapshot: &AxisSnapshot,
        ctrl: &mut FlightCtrlState,
        groups: Option<&mut dyn AxisGroupSink>,
    ) {
        let mut outputs = AxisOutputs { ctrl, groups };

        outputs.drive(AxisGroup::Pitch, snapshot.rotation.pitch);
        outputs.drive(AxisGroup::Roll, snapshot.rotation.roll);
        outputs.drive(AxisGroup::Yaw, snapshot.rotation.yaw);

        outputs.drive(AxisGroup::TranslateX, snapshot.translation.x);
        outputs.drive(AxisGroup::TranslateY, snapshot.translation.y);
        outputs.drive(AxisGroup::TranslateZ, snapshot.translation.z);

        outputs.drive(AxisGroup::WheelSteer, snapshot.wheel.steer);
        outputs.drive(AxisGroup::WheelThrottle, snapshot.wheel.throttle);

        for (group, raw) in AxisGroup::CUSTOM.into_iter().zip(snapshot.custom.values) {
            outputs.drive(group, raw);
        }

        // Unset throttle keeps its previous value on the host side, so the
        // transition to zero is written exactly once.
        let throttle = snapshot.throttle;
        if throttle != 0 || !self.last_throttle_sent_is_zero {
            outputs.ctrl.main_throttle = normalize_axis(throttle);
            self.last_throttle_sent_is_zero = throttle == 0;
            trace!("Main throttle written: {}", outputs.ctrl.main_throttle);
        }

        self.last_applied = *outputs.ctrl;
    }

    /// Control record produced by the most recent cycle
    pub fn last_applied(&self) -> &FlightCtrlState {
        &self.last_applied
    }

    #[cfg(test)]
    fn last_throttle_sent_is_zero(&self) -> bool {
        self.last_throttle_sent_is_zero
    }
}
