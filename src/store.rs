//! # Axis State Store
//!
//! Canonical value of every control axis group.
//!
//! Inbound updates are merged field by field: a field changes only when its
//! mask bit is set, otherwise it keeps its previous value until a later update
//! overrides it. Main throttle carries no mask and is always replaced.
//!
//! All groups live behind a single lock, so a merge is atomic with respect to
//! [`AxisStore::snapshot`] and the per-tick applier never sees a torn record.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::simpit::protocol::{
    CustomAxisCommand, CustomAxisMask, RotationCommand, RotationMask, TranslationCommand,
    TranslationMask, WheelCommand, WheelMask,
};

/// Canonical pitch, roll and yaw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationAxes {
    pub pitch: i16,
    pub roll: i16,
    pub yaw: i16,
}

impl RotationAxes {
    pub fn merge(&mut self, update: &RotationCommand) {
        if update.mask.contains(RotationMask::PITCH) {
            self.pitch = update.pitch;
        }
        if update.mask.contains(RotationMask::ROLL) {
            self.roll = update.roll;
        }
        if update.mask.contains(RotationMask::YAW) {
            self.yaw = update.yaw;
        }
    }
}

/// Canonical translation X, Y and Z
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationAxes {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl TranslationAxes {
    pub fn merge(&mut self, update: &TranslationCommand) {
        if update.mask.contains(TranslationMask::X) {
            self.x = update.x;
        }
        if update.mask.contains(TranslationMask::Y) {
            self.y = update.y;
        }
        if update.mask.contains(TranslationMask::Z) {
            self.z = update.z;
        }
    }
}

/// Canonical wheel steering and wheel throttle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WheelAxes {
    pub steer: i16,
    pub throttle: i16,
}

impl WheelAxes {
    pub fn merge(&mut self, update: &WheelCommand) {
        if update.mask.contains(WheelMask::STEER) {
            self.steer = update.steer;
        }
        if update.mask.contains(WheelMask::THROTTLE) {
            self.throttle = update.throttle;
        }
    }
}

/// Canonical custom axes 1 to 4
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomAxes {
    pub values: [i16; 4],
}

impl CustomAxes {
    const FLAGS: [CustomAxisMask; 4] = [
        CustomAxisMask::CUSTOM1,
        CustomAxisMask::CUSTOM2,
        CustomAxisMask::CUSTOM3,
        CustomAxisMask::CUSTOM4,
    ];

    pub fn merge(&mut self, update: &CustomAxisCommand) {
        for (i, flag) in Self::FLAGS.iter().enumerate() {
            if update.mask.contains(*flag) {
                self.values[i] = update.custom[i];
            }
        }
    }
}

/// Immutable copy of every canonical axis group
///
/// The default value is the idle state: every magnitude zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisSnapshot {
    pub rotation: RotationAxes,
    pub translation: TranslationAxes,
    pub wheel: WheelAxes,
    pub custom: CustomAxes,
    pub throttle: i16,
}

/// Shared, single-writer-at-a-time canonical axis state
#[derive(Debug, Default)]
pub struct AxisStore {
    state: Mutex<AxisSnapshot>,
}

impl AxisStore {
    /// Creates a store in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a field half written, so a
    // poisoned lock still guards a consistent record.
    fn lock(&self) -> MutexGuard<'_, AxisSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn merge_rotation(&self, update: &RotationCommand) {
        self.lock().rotation.merge(update);
    }

    pub fn merge_translation(&self, update: &TranslationCommand) {
        self.lock().translation.merge(update);
    }

    pub fn merge_wheel(&self, update: &WheelCommand) {
        self.lock().wheel.merge(update);
    }

    pub fn merge_custom(&self, update: &CustomAxisCommand) {
        self.lock().custom.merge(update);
    }

    /// Replaces main throttle unconditionally.
    pub fn replace_throttle(&self, value: i16) {
        self.lock().throttle = value;
    }

    /// Returns a consistent copy of the whole canonical state.
    pub fn snapshot(&self) -> AxisSnapshot {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn rotation(pitch: i16, roll: i16, yaw: i16, mask: RotationMask) -> RotationCommand {
        RotationCommand {
            pitch,
            roll,
            yaw,
            mask,
        }
    }

    #[test]
    fn test_new_store_is_idle() {
        let store = AxisStore::new();
        assert_eq!(store.snapshot(), AxisSnapshot::default());
        assert_eq!(store.snapshot().throttle, 0);
    }

    #[test]
    fn test_rotation_merge_only_masked_fields() {
        let store = AxisStore::new();
        store.merge_rotation(&rotation(10, 20, 30, RotationMask::all()));
        store.merge_rotation(&rotation(99, 0, 0, RotationMask::PITCH));

        let snapshot = store.snapshot();
        assert_eq!(
            snapshot.rotation,
            RotationAxes {
                pitch: 99,
                roll: 20,
                yaw: 30
            }
        );
    }

    #[test]
    fn test_translation_mask_combination() {
        let store = AxisStore::new();
        store.merge_translation(&TranslationCommand {
            x: 1,
            y: 2,
            z: 3,
            mask: TranslationMask::all(),
        });
        store.merge_translation(&TranslationCommand {
            x: 5,
            y: 0x5A5A, // Garbage, not masked
            z: 7,
            mask: TranslationMask::from_bits_retain(0b101),
        });

        let snapshot = store.snapshot();
        assert_eq!(snapshot.translation, TranslationAxes { x: 5, y: 2, z: 7 });
    }

    #[test]
    fn test_empty_mask_changes_nothing() {
        let store = AxisStore::new();
        store.merge_rotation(&rotation(1, 2, 3, RotationMask::all()));
        store.merge_rotation(&rotation(7, 7, 7, RotationMask::empty()));
        assert_eq!(
            store.snapshot().rotation,
            RotationAxes {
                pitch: 1,
                roll: 2,
                yaw: 3
            }
        );
    }

    #[test]
    fn test_unknown_mask_bits_are_ignored() {
        let store = AxisStore::new();
        store.merge_wheel(&WheelCommand {
            steer: 4,
            throttle: 5,
            mask: WheelMask::from_bits_retain(0b1111_1100),
        });
        assert_eq!(store.snapshot().wheel, WheelAxes::default());
    }

    #[test]
    fn test_wheel_merge() {
        let store = AxisStore::new();
        store.merge_wheel(&WheelCommand {
            steer: -300,
            throttle: 400,
            mask: WheelMask::STEER,
        });
        assert_eq!(
            store.snapshot().wheel,
            WheelAxes {
                steer: -300,
                throttle: 0
            }
        );

        store.merge_wheel(&WheelCommand {
            steer: 0,
            throttle: 400,
            mask: WheelMask::THROTTLE,
        });
        assert_eq!(
            store.snapshot().wheel,
            WheelAxes {
                steer: -300,
                throttle: 400
            }
        );
    }

    #[test]
    fn test_custom_axis_merge_by_bit() {
        let store = AxisStore::new();
        store.merge_custom(&CustomAxisCommand {
            custom: [11, 22, 33, 44],
            mask: CustomAxisMask::CUSTOM2 | CustomAxisMask::CUSTOM4,
        });
        assert_eq!(store.snapshot().custom.values, [0, 22, 0, 44]);

        store.merge_custom(&CustomAxisCommand {
            custom: [1, 2, 3, 4],
            mask: CustomAxisMask::CUSTOM1,
        });
        assert_eq!(store.snapshot().custom.values, [1, 22, 0, 44]);
    }

    #[test]
    fn test_throttle_always_replaced() {
        let store = AxisStore::new();
        store.replace_throttle(1200);
        assert_eq!(store.snapshot().throttle, 1200);
        store.replace_throttle(0);
        assert_eq!(store.snapshot().throttle, 0);
        store.replace_throttle(-5);
        assert_eq!(store.snapshot().throttle, -5);
    }

    #[test]
    fn test_groups_are_independent() {
        let store = AxisStore::new();
        store.merge_rotation(&rotation(1, 1, 1, RotationMask::all()));
        store.replace_throttle(9);
        store.merge_translation(&TranslationCommand {
            x: 2,
            y: 2,
            z: 2,
            mask: TranslationMask::all(),
        });

        let snapshot = store.snapshot();
        assert_eq!(snapshot.rotation.pitch, 1);
        assert_eq!(snapshot.translation.x, 2);
        assert_eq!(snapshot.throttle, 9);
        assert_eq!(snapshot.wheel, WheelAxes::default());
    }

    #[test]
    fn test_snapshot_never_torn() {
        let store = Arc::new(AxisStore::new());
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..2000i16 {
                    store.merge_rotation(&rotation(i, i, i, RotationMask::all()));
                }
            })
        };

        for _ in 0..2000 {
            let r = store.snapshot().rotation;
            assert!(r.pitch == r.roll && r.roll == r.yaw, "Torn snapshot: {:?}", r);
        }
        writer.join().unwrap();
    }
}
