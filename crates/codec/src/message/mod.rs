pub mod schema;

pub use self::schema::describe;

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::BytesMut;

use crate::{
    Error,
    bits::{BitReader, BitWriter},
    msm::{self, MsmMessage},
};

/// How a schema field is interpreted by the bit reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Uint,
    Int,
    Bool,
}

/// One field descriptor of a bit packed message layout: name, kind and
/// width in bits. Schemas are ordered arrays of these, compiled into
/// the binary as constants.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: Kind,
    pub width: usize,
}

pub(crate) const fn uint(name: &'static str, width: usize) -> Field {
    Field {
        name,
        kind: Kind::Uint,
        width,
    }
}

pub(crate) const fn int(name: &'static str, width: usize) -> Field {
    Field {
        name,
        kind: Kind::Int,
        width,
    }
}

pub(crate) const fn flag(name: &'static str) -> Field {
    Field {
        name,
        kind: Kind::Bool,
        width: 1,
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Uint(u64),
    Int(i64),
    Bool(bool),
}

impl Value {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Uint(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

/// A named decoded field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub name: &'static str,
    pub value: Value,
}

/// Legacy RTK observation message (1001-1004 GPS, 1009-1012 GLONASS):
/// a common header followed by one row per observed satellite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationMessage {
    pub message_type: u16,
    pub header: Vec<FieldValue>,
    pub satellites: Vec<Vec<FieldValue>>,
}

/// Message 1029, Unicode Text String. The only message type this crate
/// can also encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub ref_station_id: u16,
    /// Modified julian day of the transmission.
    pub mjd_day: u16,
    /// Seconds of day in UTC.
    pub utc_seconds: u32,
    /// Number of unicode scalar values in `text` as transmitted.
    pub utf_chars: u8,
    pub text: String,
}

impl Default for TextMessage {
    fn default() -> Self {
        let now = unix_now();
        Self {
            ref_station_id: 0,
            mjd_day: mjd(now) as u16,
            utc_seconds: (now % 86400) as u32,
            utf_chars: 0,
            text: String::new(),
        }
    }
}

impl TextMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// The UTF-8 size of the text, as carried by the `charBytes` field.
    pub fn char_bytes(&self) -> usize {
        self.text.len()
    }

    /// Packs the message into a frame payload (message type included).
    /// `utfChars` and `charBytes` are recomputed from the text, not
    /// taken from the struct.
    ///
    /// # Test
    ///
    /// ```
    /// use ntrip_client_codec::message::{Message, TextMessage, decode};
    ///
    /// let mut message = TextMessage::new("A test message");
    /// message.ref_station_id = 1234;
    ///
    /// let payload = message.encode();
    /// if let Message::Text(decoded) = decode(&payload).unwrap() {
    ///     assert_eq!(decoded.ref_station_id, 1234);
    ///     assert_eq!(decoded.utf_chars, 14);
    ///     assert_eq!(decoded.text, "A test message");
    /// } else {
    ///     panic!("expected a text message");
    /// }
    /// ```
    pub fn encode(&self) -> BytesMut {
        assert!(self.text.len() <= 255, "1029 text exceeds 255 utf-8 bytes");

        let mut writer = BitWriter::default();
        writer.put(12, 1029);
        writer.put(12, self.ref_station_id as u64);
        writer.put(16, self.mjd_day as u64);
        writer.put(17, self.utc_seconds as u64);
        writer.put(7, self.text.chars().count() as u64);
        writer.put(8, self.text.len() as u64);
        writer.put_bytes(self.text.as_bytes());
        writer.finish()
    }

    fn decode(reader: &mut BitReader) -> Result<Self, Error> {
        let ref_station_id = reader.read(12)? as u16;
        let mjd_day = reader.read(16)? as u16;
        let utc_seconds = reader.read(17)? as u32;
        let utf_chars = reader.read(7)? as u8;
        let char_bytes = reader.read(8)? as usize;
        let text =
            String::from_utf8(reader.read_bytes(char_bytes)?).map_err(|_| Error::InvalidUtf8)?;

        Ok(Self {
            ref_station_id,
            mjd_day,
            utc_seconds,
            utf_chars,
            text,
        })
    }
}

/// Modified julian date of a unix timestamp.
///
/// # Test
///
/// ```
/// use ntrip_client_codec::message::mjd;
///
/// assert_eq!(mjd(0), 40587);
/// assert_eq!(mjd(86400), 40588);
/// ```
pub fn mjd(unix_seconds: u64) -> u64 {
    unix_seconds / 86400 + 40587
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// A decoded RTCM 3 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Observations(ObservationMessage),
    Text(TextMessage),
    Msm(MsmMessage),
    /// The type was read but no schema is registered for it. Not an
    /// error: the stream carries many message types a client is free
    /// to skip.
    NotImplemented(u16),
}

impl Message {
    pub fn message_type(&self) -> u16 {
        match self {
            Self::Observations(message) => message.message_type,
            Self::Text(_) => 1029,
            Self::Msm(message) => message.header.message_type,
            Self::NotImplemented(message_type) => *message_type,
        }
    }
}

/// Decodes a frame payload (as returned by [`crate::frame::payload`])
/// into a typed message.
pub fn decode(payload: &[u8]) -> Result<Message, Error> {
    let mut reader = BitReader::new(payload);
    let message_type = reader.read(12)? as u16;

    Ok(match message_type {
        1001..=1004 | 1009..=1012 => {
            Message::Observations(decode_observations(message_type, &mut reader)?)
        }
        1029 => Message::Text(TextMessage::decode(&mut reader)?),
        // Subtypes 0, 8 and 9 inside the MSM range are reserved.
        1071..=1127 if (1..=7).contains(&(message_type % 10)) => {
            Message::Msm(msm::decode(message_type, &mut reader)?)
        }
        _ => Message::NotImplemented(message_type),
    })
}

fn decode_observations(
    message_type: u16,
    reader: &mut BitReader,
) -> Result<ObservationMessage, Error> {
    let (header_schema, row_schema) =
        schema::observation(message_type).ok_or(Error::NotImplemented(message_type))?;

    let header = read_fields(reader, header_schema)?;
    let count = header
        .iter()
        .find(|field| field.name == "numSignalsObs")
        .and_then(|field| field.value.as_u64())
        .unwrap_or(0);

    let satellites = (0..count)
        .map(|_| read_fields(reader, row_schema))
        .collect::<Result<_, _>>()?;

    Ok(ObservationMessage {
        message_type,
        header,
        satellites,
    })
}

pub(crate) fn read_fields(
    reader: &mut BitReader,
    schema: &'static [Field],
) -> Result<Vec<FieldValue>, Error> {
    schema
        .iter()
        .map(|field| {
            Ok(FieldValue {
                name: field.name,
                value: read_value(reader, field)?,
            })
        })
        .collect()
}

pub(crate) fn read_value(reader: &mut BitReader, field: &Field) -> Result<Value, Error> {
    Ok(match field.kind {
        Kind::Uint => Value::Uint(reader.read(field.width)?),
        Kind::Int => Value::Int(reader.read_signed(field.width)?),
        Kind::Bool => Value::Bool(reader.read_bool()?),
    })
}
