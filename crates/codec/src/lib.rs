//! ## RTCM Standard 10403.x Differential GNSS Services
//!
//! RTCM 3 is the binary framing protocol used to carry differential
//! GNSS correction messages from reference stations to rovers. Every
//! frame starts with the preamble byte `0xD3`, followed by 6 reserved
//! bits, a 10 bit payload length, the payload itself and a trailing
//! 24 bit CRC (CRC-24Q) computed over everything before it. The first
//! 12 bits of the payload carry the message type.
//!
//! This crate implements the frame seal/unseal, the CRC-24Q, a generic
//! bit reader/writer, and schema driven decoding of the legacy
//! observation messages (1001-1004, 1009-1012), the Unicode text
//! message (1029), and the Multiple Signal Messages (MSM 1-7) for the
//! GPS, GLONASS, Galileo, SBAS, QZSS and BeiDou constellations.

pub mod bits;
pub mod crc;
pub mod frame;
pub mod message;
pub mod msm;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The bit stream ended before the schema was satisfied.
    UnexpectedEnd,
    /// A field width outside 1..=64 was requested.
    InvalidBitWidth(usize),
    /// The first byte of a frame is not the `0xD3` preamble.
    InvalidPreamble,
    /// A payload larger than the 10 bit length field can express.
    PayloadTooLarge(usize),
    /// An MSM cell mask of more than 64 bits is not representable.
    CellMaskTooLarge(usize),
    /// Message 1029 carries a byte sequence that is not valid UTF-8.
    InvalidUtf8,
    /// No schema is registered for this message type.
    NotImplemented(u16),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
