use bytes::{BufMut, BytesMut};

use super::{Error, crc::crc24q};

/// Every RTCM 3 frame starts with this byte. It can also occur inside
/// payloads, so finding it is never a commitment: only a matching CRC
/// is.
pub const PREAMBLE: u8 = 0xD3;

/// The payload length field is 10 bits wide.
pub const MAX_PAYLOAD_SIZE: usize = 1023;

/// Bytes of preamble + reserved + length before the payload.
const HEADER_SIZE: usize = 3;

/// Bytes of trailing CRC-24Q.
const CRC_SIZE: usize = 3;

/// Total frame size in bytes as declared by the 10 bit payload length
/// field: `payload + 6`. Needs the first 3 bytes of the frame.
///
/// # Test
///
/// ```
/// use ntrip_client_codec::frame::frame_size;
///
/// assert_eq!(frame_size(&[0xD3, 0x00, 0x13]).unwrap(), 25);
/// assert!(frame_size(&[0xD2, 0x00, 0x13]).is_err());
/// assert!(frame_size(&[0xD3, 0x00]).is_err());
/// ```
pub fn frame_size(bytes: &[u8]) -> Result<usize, Error> {
    if bytes.len() < HEADER_SIZE {
        return Err(Error::UnexpectedEnd);
    }

    if bytes[0] != PREAMBLE {
        return Err(Error::InvalidPreamble);
    }

    let payload_size = ((bytes[1] as usize & 0x03) << 8) | bytes[2] as usize;
    Ok(payload_size + HEADER_SIZE + CRC_SIZE)
}

/// Whether the leading frame in `bytes` carries a valid CRC-24Q over
/// its first `payload + 3` bytes.
pub fn verify(bytes: &[u8]) -> bool {
    match frame_size(bytes) {
        Ok(size) if bytes.len() >= size => {
            let crc = u32::from_be_bytes([0, bytes[size - 3], bytes[size - 2], bytes[size - 1]]);
            crc24q(&bytes[..size - CRC_SIZE]) == crc
        }
        _ => false,
    }
}

/// The payload slice of a complete frame.
pub fn payload(frame: &[u8]) -> Result<&[u8], Error> {
    let size = frame_size(frame)?;
    if frame.len() < size {
        return Err(Error::UnexpectedEnd);
    }

    Ok(&frame[HEADER_SIZE..size - CRC_SIZE])
}

/// The 12 bit message type leading the payload.
pub fn message_type(frame: &[u8]) -> Result<u16, Error> {
    let payload = payload(frame)?;
    if payload.len() < 2 {
        return Err(Error::UnexpectedEnd);
    }

    Ok(((payload[0] as u16) << 4) | (payload[1] >> 4) as u16)
}

/// Seals a payload into a full frame: preamble, 6 reserved bits, the
/// 10 bit payload length, the payload and the CRC-24Q.
///
/// # Test
///
/// ```
/// use ntrip_client_codec::frame::{seal, verify, message_type, payload};
///
/// let body = [0x40u8, 0x50, 0x00];
/// let frame = seal(&body).unwrap();
///
/// assert!(verify(&frame));
/// assert_eq!(message_type(&frame).unwrap(), 1029);
/// assert_eq!(payload(&frame).unwrap(), &body);
/// ```
pub fn seal(payload: &[u8]) -> Result<BytesMut, Error> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(Error::PayloadTooLarge(payload.len()));
    }

    let mut bytes = BytesMut::with_capacity(payload.len() + HEADER_SIZE + CRC_SIZE);
    bytes.put_u8(PREAMBLE);
    bytes.put_u16(payload.len() as u16);
    bytes.extend_from_slice(payload);

    let crc = crc24q(&bytes);
    bytes.put_u8((crc >> 16) as u8);
    bytes.put_u8((crc >> 8) as u8);
    bytes.put_u8(crc as u8);

    Ok(bytes)
}
