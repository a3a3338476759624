use std::fmt;

use thiserror::Error;
use tracing::{instrument, trace};

use super::FanState;
use crate::protocol::{CHECKSUM_SPAN, FRAME_LEN, SYNC_BYTE};
use crate::utils::format_hex;

/// Errors returned when validating a received frame.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum FrameCodecError {
    /// Fewer than the mandatory 10 bytes were received.
    #[error("frame is too short: expected at least {FRAME_LEN} bytes, got {actual}")]
    TooShort { actual: usize },
    /// The first byte is not the `0x53` sync byte.
    #[error("frame sync byte is {found:#04x}, expected {SYNC_BYTE:#04x}")]
    BadSync { found: u8 },
    /// The command byte does not match the command the caller expects.
    #[error("frame command is {found:#04x}, expected {expected}")]
    UnexpectedCommand { expected: CommandCode, found: u8 },
    /// The trailing checksum does not match the sum of the first nine bytes.
    #[error("frame checksum is {found:#04x}, computed {computed:#04x}")]
    ChecksumMismatch { computed: u8, found: u8 },
}

/// Command codes carried in frame byte `1`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, derive_more::Display)]
pub enum CommandCode {
    /// Host asks the device for its status (`0x30`).
    #[display("GET (0x30)")]
    Get,
    /// Host pushes a complete new status (`0x31`).
    #[display("SET (0x31)")]
    Control,
    /// Device reports its current status (`0x32`).
    #[display("REPORT (0x32)")]
    Report,
}

impl CommandCode {
    /// Returns the raw protocol byte.
    ///
    /// ```
    /// use fansync::CommandCode;
    ///
    /// assert_eq!(0x30, CommandCode::Get.as_byte());
    /// assert_eq!(0x32, CommandCode::Report.as_byte());
    /// ```
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Get => 0x30,
            Self::Control => 0x31,
            Self::Report => 0x32,
        }
    }
}

impl TryFrom<u8> for CommandCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x30 => Ok(Self::Get),
            0x31 => Ok(Self::Control),
            0x32 => Ok(Self::Report),
            other => Err(other),
        }
    }
}

/// The seven status bytes carried between the command byte and the checksum.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, serde::Serialize)]
pub struct FrameFields {
    pub speed: u8,
    pub direction: u8,
    pub up: u8,
    pub down: u8,
    pub timer_low: u8,
    pub timer_high: u8,
    pub fan_type: u8,
}

impl FrameFields {
    /// Builds fields from wider integers, keeping only the low 8 bits of each.
    ///
    /// ```
    /// use fansync::FrameFields;
    ///
    /// let fields = FrameFields::wrapping([256, 1, -1, 300, 0x1234, 0, 9]);
    /// assert_eq!(0, fields.speed);
    /// assert_eq!(0xFF, fields.up);
    /// assert_eq!(44, fields.down);
    /// assert_eq!(0x34, fields.timer_low);
    /// ```
    #[must_use]
    pub fn wrapping(values: [i64; 7]) -> Self {
        let [speed, direction, up, down, timer_low, timer_high, fan_type] = values.map(wrap_byte);
        Self {
            speed,
            direction,
            up,
            down,
            timer_low,
            timer_high,
            fan_type,
        }
    }

    fn as_array(self) -> [u8; 7] {
        [
            self.speed,
            self.direction,
            self.up,
            self.down,
            self.timer_low,
            self.timer_high,
            self.fan_type,
        ]
    }
}

/// A complete, checksummed 10-byte frame.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// Returns the raw frame bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Returns the raw command byte.
    #[must_use]
    pub fn command_byte(&self) -> u8 {
        self.0[1]
    }

    /// Returns the status fields carried by this frame.
    #[must_use]
    pub fn fields(&self) -> FrameFields {
        FrameFields {
            speed: self.0[2],
            direction: self.0[3],
            up: self.0[4],
            down: self.0[5],
            timer_low: self.0[6],
            timer_high: self.0[7],
            fan_type: self.0[8],
        }
    }

    /// Returns the trailing checksum byte.
    #[must_use]
    pub fn checksum(&self) -> u8 {
        self.0[CHECKSUM_SPAN]
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", format_hex(&self.0))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_hex(&self.0))
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Encoder and validator for FanSync frames.
pub struct FrameCodec;

impl FrameCodec {
    /// Computes the checksum over the first nine bytes of `bytes`.
    ///
    /// Shorter inputs are summed as far as they go.
    #[must_use]
    pub fn checksum(bytes: &[u8]) -> u8 {
        bytes
            .iter()
            .take(CHECKSUM_SPAN)
            .fold(0u8, |sum, byte| sum.wrapping_add(*byte))
    }

    /// Encodes one frame and appends its checksum.
    ///
    /// ```
    /// use fansync::{CommandCode, FrameCodec, FrameFields};
    ///
    /// let frame = FrameCodec::encode(CommandCode::Get, FrameFields::default());
    /// assert_eq!(
    ///     &[0x53, 0x30, 0, 0, 0, 0, 0, 0, 0, 0x83],
    ///     frame.as_bytes()
    /// );
    /// ```
    #[must_use]
    pub fn encode(command: CommandCode, fields: FrameFields) -> Frame {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = SYNC_BYTE;
        bytes[1] = command.as_byte();
        bytes[2..CHECKSUM_SPAN].copy_from_slice(&fields.as_array());
        bytes[CHECKSUM_SPAN] = Self::checksum(&bytes);
        Frame(bytes)
    }

    /// Validates `bytes` as a frame carrying `expected` and returns its first ten bytes.
    ///
    /// # Errors
    ///
    /// Returns an error when the buffer is short, the sync byte or command is wrong, or the
    /// checksum does not match.
    pub fn parse(bytes: &[u8], expected: CommandCode) -> Result<Frame, FrameCodecError> {
        let Some(head) = bytes.get(..FRAME_LEN) else {
            return Err(FrameCodecError::TooShort {
                actual: bytes.len(),
            });
        };
        if head[0] != SYNC_BYTE {
            return Err(FrameCodecError::BadSync { found: head[0] });
        }
        if head[1] != expected.as_byte() {
            return Err(FrameCodecError::UnexpectedCommand {
                expected,
                found: head[1],
            });
        }
        let computed = Self::checksum(head);
        if computed != head[CHECKSUM_SPAN] {
            return Err(FrameCodecError::ChecksumMismatch {
                computed,
                found: head[CHECKSUM_SPAN],
            });
        }

        let mut frame = [0u8; FRAME_LEN];
        frame.copy_from_slice(head);
        Ok(Frame(frame))
    }

    /// Decodes a REPORT frame into a valid state, or returns the placeholder.
    ///
    /// ```
    /// use fansync::FrameCodec;
    ///
    /// let state = FrameCodec::decode(&[0x00; 10]);
    /// assert!(!state.is_valid());
    /// ```
    #[instrument(skip(bytes), level = "trace", fields(len = bytes.len()))]
    #[must_use]
    pub fn decode(bytes: &[u8]) -> FanState {
        match Self::parse(bytes, CommandCode::Report) {
            Ok(frame) => FanState::reported(frame.fields()),
            Err(error) => {
                trace!(%error, payload = %format_hex(bytes), "rejected status frame");
                FanState::placeholder()
            }
        }
    }
}

fn wrap_byte(value: i64) -> u8 {
    (value & 0xFF) as u8
}
