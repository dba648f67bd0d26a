//! # Simpit Packet Encoder
//!
//! Encodes records into payloads and payloads into serial frames.

use bytes::{Bytes, BytesMut};

use super::protocol::*;
use crate::error::{Result, SimpitError};

/// Encode a record into its fixed-size payload
///
/// This is the exact inverse of [`decode`](super::decoder::decode).
///
/// # Examples
///
/// ```
/// use simpit_bridge::simpit::encoder::encode;
/// use simpit_bridge::simpit::protocol::ThrottleCommand;
///
/// let payload = encode(&ThrottleCommand { throttle: 0x1234 });
/// assert_eq!(&payload[..], &[0x34, 0x12]);
/// ```
pub fn encode<T: WireRecord>(record: &T) -> Bytes {
    let mut buf = BytesMut::with_capacity(T::SIZE);
    record.put(&mut buf);
    buf.freeze()
}

/// Encode a packet into a complete serial frame
///
/// # Arguments
///
/// * `packet` - Channel id and payload (max 32 bytes)
///
/// # Returns
///
/// * `Result<Vec<u8>>` - Frame bytes: header(2) + size(1) + channel(1) + payload
///
/// # Errors
///
/// Returns error if the payload exceeds `SIMPIT_MAX_PAYLOAD_SIZE`
pub fn encode_frame(packet: &Packet) -> Result<Vec<u8>> {
    let size = packet.payload.len();
    if size > SIMPIT_MAX_PAYLOAD_SIZE {
        return Err(SimpitError::Protocol(format!(
            "Payload size {} exceeds maximum {}",
            size, SIMPIT_MAX_PAYLOAD_SIZE
        )));
    }

    let mut frame = Vec::with_capacity(SIMPIT_FRAME_OVERHEAD + size);
    frame.push(SIMPIT_HEADER_0);
    frame.push(SIMPIT_HEADER_1);
    frame.push(size as u8);
    frame.push(packet.channel);
    frame.extend_from_slice(&packet.payload);

    Ok(frame)
}

/// Convert a normalized axis value back to its raw wire value
///
/// The value is clamped to [-1, 1] and truncated toward zero.
pub fn axis_to_raw(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * AXIS_FULL_SCALE) as i16
}
