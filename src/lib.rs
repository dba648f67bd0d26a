//! # Simpit Bridge Library
//!
//! Keeps a simulated vessel's control axes in sync with an external hardware
//! controller speaking the Simpit serial protocol.
//!
//! Inbound axis updates are merged into a canonical store, applied to the
//! vessel once per control cycle, and autopilot status changes are published
//! back to the hardware.

pub mod applier;
pub mod bridge;
pub mod config;
pub mod error;
pub mod inbound;
pub mod outbound;
pub mod serial;
pub mod simpit;
pub mod store;
pub mod vessel;
