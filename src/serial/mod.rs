//! # Serial Communication Module
//!
//! Handles serial communication with the Simpit controller board.
//!
//! This module handles:
//! - Opening the configured serial port (8N1, no flow control)
//! - Writing framed Simpit packets
//! - Reassembling inbound packets from the byte stream

pub mod port_trait;

use std::time::Duration;

use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, trace, warn};

use crate::config::SerialConfig;
use crate::error::{Result, SimpitError};
use crate::simpit::decoder::FrameDecoder;
use crate::simpit::encoder::encode_frame;
use crate::simpit::protocol::Packet;
use port_trait::{SerialPortIO, TokioSerialPort};

/// Fallback device paths tried after the configured one
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // Native USB boards
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// Size of a single read from the port
const READ_CHUNK_SIZE: usize = 64;

/// Packet link over a serial port
pub struct SimpitLink<P: SerialPortIO> {
    port: P,
    decoder: FrameDecoder,
    device_path: String,
}

/// Link over a real tokio-serial port
pub type SimpitSerial = SimpitLink<TokioSerialPort>;

impl<P: SerialPortIO> std::fmt::Debug for SimpitLink<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpitLink")
            .field("device_path", &self.device_path)
            .field("buffered", &self.decoder.buffered())
            .finish_non_exhaustive()
    }
}

impl SimpitSerial {
    /// Open the configured port, falling back to common device paths
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` if no candidate path could be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use simpit_bridge::config::SerialConfig;
    /// use simpit_bridge::serial::SimpitSerial;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let serial = SimpitSerial::open(&SerialConfig::default())?;
    ///     println!("Connected to: {}", serial.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let mut paths = vec![config.port.as_str()];
        paths.extend(
            DEFAULT_DEVICE_PATHS
                .iter()
                .copied()
                .filter(|p| *p != config.port),
        );

        Self::open_with_paths(
            &paths,
            config.baud_rate,
            Duration::from_millis(config.timeout_ms),
        )
    }

    /// Open the first path in `paths` that succeeds
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try in order
    /// * `baud_rate` - Line speed
    /// * `timeout` - Port I/O timeout
    pub fn open_with_paths(paths: &[&str], baud_rate: u32, timeout: Duration) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate, timeout) {
                Ok(port) => {
                    info!("Opened Simpit device at {} ({} baud)", path, baud_rate);
                    return Ok(Self::new(TokioSerialPort::new(port), *path));
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(SimpitError::SerialPortNotFound(paths.join(", ")))
    }

    fn open_port(
        path: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .timeout(timeout)
            .open_native_async()
            .map_err(|e| SimpitError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }
}

impl<P: SerialPortIO> SimpitLink<P> {
    /// Wrap an already opened port
    pub fn new(port: P, device_path: impl Into<String>) -> Self {
        Self {
            port,
            decoder: FrameDecoder::new(),
            device_path: device_path.into(),
        }
    }

    /// Frame and write one packet
    ///
    /// # Errors
    ///
    /// Returns `Protocol` for an oversize payload, `Serial` if the write fails
    pub async fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        let frame = encode_frame(packet)?;

        self.port
            .write_all(&frame)
            .await
            .map_err(|e| SimpitError::Serial(format!("Failed to write packet: {}", e)))?;

        self.port
            .flush()
            .await
            .map_err(|e| SimpitError::Serial(format!("Failed to flush serial port: {}", e)))?;

        trace!("Sent packet on channel {} ({} bytes)", packet.channel, frame.len());
        Ok(())
    }

    /// Wait for the next complete inbound packet
    ///
    /// Partially received frames stay buffered, so dropping this future
    /// between reads loses no data.
    ///
    /// # Errors
    ///
    /// Returns `Serial` if the read fails or the port reports end of stream
    pub async fn recv_packet(&mut self) -> Result<Packet> {
        let mut buf = [0u8; READ_CHUNK_SIZE];

        loop {
            if let Some(packet) = self.decoder.next_packet() {
                trace!("Received packet on channel {}", packet.channel);
                return Ok(packet);
            }

            let n = self
                .port
                .read(&mut buf)
                .await
                .map_err(|e| SimpitError::Serial(format!("Failed to read: {}", e)))?;

            if n == 0 {
                return Err(SimpitError::Serial(format!(
                    "{} closed",
                    self.device_path
                )));
            }

            self.decoder.push(&buf[..n]);
        }
    }

    /// Device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}
