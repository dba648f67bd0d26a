//! # Simpit Packet Decoder
//!
//! Decodes payloads into records and serial byte streams into packets.

use bytes::{Buf, BytesMut};
use tracing::{debug, warn};

use super::protocol::*;
use crate::error::{Result, SimpitError};

/// Decode a fixed-size payload into a record
///
/// # Arguments
///
/// * `payload` - Exactly `T::SIZE` bytes
///
/// # Returns
///
/// * `Result<T>` - Decoded record
///
/// # Errors
///
/// Returns `MalformedPayload` if the payload length differs from `T::SIZE`
///
/// # Examples
///
/// ```
/// use simpit_bridge::simpit::decoder::decode;
/// use simpit_bridge::simpit::protocol::ThrottleCommand;
///
/// let cmd: ThrottleCommand = decode(&[0x34, 0x12])?;
/// assert_eq!(cmd.throttle, 0x1234);
/// # Ok::<(), simpit_bridge::error::SimpitError>(())
/// ```
pub fn decode<T: WireRecord>(payload: &[u8]) -> Result<T> {
    if payload.len() != T::SIZE {
        return Err(SimpitError::MalformedPayload {
            expected: T::SIZE,
            actual: payload.len(),
        });
    }

    let mut buf = payload;
    Ok(T::get(&mut buf))
}

/// Normalize a raw axis value to [-1, 1]
///
/// `i16::MIN` is the only raw value outside the symmetric range and clamps to -1.
pub fn normalize_axis(raw: i16) -> f32 {
    (raw as f32 / AXIS_FULL_SCALE).clamp(-1.0, 1.0)
}

/// Streaming frame decoder
///
/// Accumulates raw serial bytes and yields complete packets. Bytes before a
/// header are discarded, and a header announcing an oversize payload is
/// skipped so the decoder can resynchronise on the next one.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes received from the transport
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet consumed
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Take the next complete packet, if one is buffered
    pub fn next_packet(&mut self) -> Option<Packet> {
        loop {
            let header = self
                .buf
                .windows(2)
                .position(|w| w[0] == SIMPIT_HEADER_0 && w[1] == SIMPIT_HEADER_1);

            match header {
                Some(0) => {}
                Some(pos) => {
                    debug!("Discarding {} bytes before frame header", pos);
                    self.buf.advance(pos);
                }
                None => {
                    // A trailing first header byte may be completed by the next read
                    let keep = usize::from(self.buf.last() == Some(&SIMPIT_HEADER_0));
                    let discard = self.buf.len() - keep;
                    if discard > 0 {
                        debug!("Discarding {} bytes without frame header", discard);
                        self.buf.advance(discard);
                    }
                    return None;
                }
            }

            if self.buf.len() < SIMPIT_FRAME_OVERHEAD {
                return None;
            }

            let size = self.buf[2] as usize;
            if size > SIMPIT_MAX_PAYLOAD_SIZE {
                warn!("Skipping frame with oversize payload ({} bytes)", size);
                self.buf.advance(2);
                continue;
            }

            if self.buf.len() < SIMPIT_FRAME_OVERHEAD + size {
                return None;
            }

            let mut frame = self.buf.split_to(SIMPIT_FRAME_OVERHEAD + size);
            frame.advance(3);
            let channel = frame.get_u8();

            return Some(Packet::new(channel, frame.freeze()));
        }
    }
}
