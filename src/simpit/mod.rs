//! # Simpit Protocol Module
//!
//! Wire protocol spoken with Simpit cockpit hardware.
//!
//! This module handles:
//! - Channel ids for inbound commands and outbound status/echo packets
//! - Fixed-layout, packed little-endian records with masked fields
//! - Record encoding/decoding with strict length checks
//! - Serial frame building and stream resynchronisation

pub mod protocol;
pub mod encoder;
pub mod decoder;
