//! ## Multiple Signal Messages (MSM)
//!
//! Types 1071-1127 carry per-satellite and per-signal observables for
//! six constellations. The body layout is not fixed: a 64 bit
//! satellite mask and a 32 bit signal mask in the header span a cell
//! mask of `satellites x signals` bits, and only masked-in cells are
//! present on the wire. Satellite and signal blocks are transmitted
//! column-major: one field across all rows, then the next field.

use num_enum::TryFromPrimitive;

use crate::{
    Error,
    bits::BitReader,
    message::{Field, FieldValue, read_value, schema},
};

/// The constellation of an MSM type, keyed by `(type / 10) % 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u16)]
pub enum Constellation {
    Gps = 7,
    Glonass = 8,
    Galileo = 9,
    Sbas = 10,
    Qzss = 11,
    Beidou = 12,
}

impl std::fmt::Display for Constellation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Gps => "GPS",
            Self::Glonass => "GLONASS",
            Self::Galileo => "GALILEO",
            Self::Sbas => "SBAS",
            Self::Qzss => "QZSS",
            Self::Beidou => "BEIDOU",
        })
    }
}

/// Maps an MSM message type to its constellation.
///
/// # Test
///
/// ```
/// use ntrip_client_codec::msm::{Constellation, constellation};
///
/// assert_eq!(constellation(1077).unwrap(), Constellation::Gps);
/// assert_eq!(constellation(1124).unwrap(), Constellation::Beidou);
/// assert!(constellation(1001).is_err());
/// ```
pub fn constellation(message_type: u16) -> Result<Constellation, Error> {
    Constellation::try_from((message_type / 10) % 100)
        .map_err(|_| Error::NotImplemented(message_type))
}

/// The fixed 169 bit MSM header (message type included), plus the
/// variable length cell mask that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsmHeader {
    pub message_type: u16,
    pub ref_station_id: u16,
    /// GNSS epoch time; for GLONASS this is the 27 bit time of day,
    /// with the day number split into `glonass_day_of_week`.
    pub epoch_time: u32,
    pub multi_message: bool,
    pub iods: u8,
    pub clock_steering: u8,
    pub ext_clock: u8,
    pub div_free_smoothing: bool,
    pub smooth_interval: u8,
    pub satellite_mask: u64,
    pub signal_mask: u32,
    pub cell_mask: u64,
    pub glonass_day_of_week: Option<u8>,
}

impl MsmHeader {
    pub fn n_satellites(&self) -> usize {
        self.satellite_mask.count_ones() as usize
    }

    pub fn n_signals(&self) -> usize {
        self.signal_mask.count_ones() as usize
    }

    pub fn n_cells(&self) -> usize {
        self.cell_mask.count_ones() as usize
    }
}

/// A decoded MSM: header plus one record per satellite and one record
/// per masked-in cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsmMessage {
    pub header: MsmHeader,
    pub satellites: Vec<Vec<FieldValue>>,
    pub signals: Vec<Vec<FieldValue>>,
}

pub(crate) fn decode(message_type: u16, reader: &mut BitReader) -> Result<MsmMessage, Error> {
    let ref_station_id = reader.read(12)? as u16;
    let gnss_epoch_time = reader.read(30)? as u32;
    let multi_message = reader.read_bool()?;
    let iods = reader.read(3)? as u8;
    reader.read(7)?; // reserved
    let clock_steering = reader.read(2)? as u8;
    let ext_clock = reader.read(2)? as u8;
    let div_free_smoothing = reader.read_bool()?;
    let smooth_interval = reader.read(3)? as u8;
    let satellite_mask = reader.read(64)?;
    let signal_mask = reader.read(32)? as u32;

    // GLONASS epochs carry the day of week in the top 3 bits.
    let (epoch_time, glonass_day_of_week) = if (1081..=1087).contains(&message_type) {
        (gnss_epoch_time & 0x7FFFFFF, Some((gnss_epoch_time >> 27) as u8))
    } else {
        (gnss_epoch_time, None)
    };

    let n_satellites = satellite_mask.count_ones() as usize;
    let n_signals = signal_mask.count_ones() as usize;

    let cell_bits = n_satellites * n_signals;
    if cell_bits > 64 {
        return Err(Error::CellMaskTooLarge(cell_bits));
    }

    let cell_mask = if cell_bits > 0 { reader.read(cell_bits)? } else { 0 };
    let n_cells = cell_mask.count_ones() as usize;

    let subtype = message_type % 10;
    let satellite_schema: &[Field] = match subtype {
        1..=3 => schema::MSM123_SATELLITE,
        4 | 6 => schema::MSM46_SATELLITE,
        5 | 7 => schema::MSM57_SATELLITE,
        _ => return Err(Error::NotImplemented(message_type)),
    };

    let signal_schema: &[Field] = match subtype {
        1 => schema::MSM1_SIGNAL,
        2 => schema::MSM2_SIGNAL,
        3 => schema::MSM3_SIGNAL,
        4 => schema::MSM4_SIGNAL,
        5 => schema::MSM5_SIGNAL,
        6 => schema::MSM6_SIGNAL,
        7 => schema::MSM7_SIGNAL,
        _ => return Err(Error::NotImplemented(message_type)),
    };

    let satellites = read_columns(reader, satellite_schema, n_satellites)?;
    let signals = read_columns(reader, signal_schema, n_cells)?;

    Ok(MsmMessage {
        header: MsmHeader {
            message_type,
            ref_station_id,
            epoch_time,
            multi_message,
            iods,
            clock_steering,
            ext_clock,
            div_free_smoothing,
            smooth_interval,
            satellite_mask,
            signal_mask,
            cell_mask,
            glonass_day_of_week,
        },
        satellites,
        signals,
    })
}

/// Reads a block in wire order (one field across all rows, field by
/// field) and materialises it row per record.
fn read_columns(
    reader: &mut BitReader,
    schema: &'static [Field],
    rows: usize,
) -> Result<Vec<Vec<FieldValue>>, Error> {
    let mut columns = Vec::with_capacity(schema.len());
    for field in schema {
        let mut column = Vec::with_capacity(rows);
        for _ in 0..rows {
            column.push(read_value(reader, field)?);
        }

        columns.push(column);
    }

    Ok((0..rows)
        .map(|row| {
            schema
                .iter()
                .zip(&columns)
                .map(|(field, column)| FieldValue {
                    name: field.name,
                    value: column[row].clone(),
                })
                .collect()
        })
        .collect())
}

/// The names of the signals selected by a 32 bit MSM signal mask, in
/// mask index order. Positions tagged `"Res"` are reserved by the
/// standard but still selectable.
///
/// # Test
///
/// ```
/// use ntrip_client_codec::msm::signal_types;
///
/// let mask = u32::from_str_radix("10000000010000000000000000000000", 2).unwrap();
///
/// assert_eq!(signal_types(1077, mask).unwrap(), vec!["L1C", "L2P"]);
/// ```
pub fn signal_types(message_type: u16, signal_mask: u32) -> Result<Vec<&'static str>, Error> {
    let table = match constellation(message_type)? {
        Constellation::Gps => &GPS_SIGNALS,
        Constellation::Glonass => &GLONASS_SIGNALS,
        Constellation::Galileo => &GALILEO_SIGNALS,
        Constellation::Sbas => &SBAS_SIGNALS,
        Constellation::Qzss => &QZSS_SIGNALS,
        Constellation::Beidou => &BEIDOU_SIGNALS,
    };

    Ok((0..32)
        .filter(|index| signal_mask >> (31 - index) & 1 == 1)
        .map(|index| table[index])
        .collect())
}

#[rustfmt::skip]
const GPS_SIGNALS: [&str; 32] = [
    "L1C", "L1P", "L1W", "L1Y", "L1M", "Res", "L2C", "L2D",
    "L2S", "L2P", "L2W", "L2Y", "L2M", "L2N", "L2CM", "L2CL",
    "L2CX", "Res", "L5I", "L5Q", "L5X", "Res", "Res", "Res",
    "Res", "L1CD", "L1CP", "L1CX", "Res", "Res", "Res", "Res",
];

#[rustfmt::skip]
const GLONASS_SIGNALS: [&str; 32] = [
    "G1C", "G1P", "Res", "Res", "Res", "Res", "G2C", "G2P",
    "Res", "Res", "Res", "Res", "Res", "Res", "Res", "Res",
    "G3I", "G3Q", "G3X", "Res", "Res", "Res", "Res", "Res",
    "Res", "Res", "Res", "Res", "Res", "Res", "Res", "Res",
];

#[rustfmt::skip]
const GALILEO_SIGNALS: [&str; 32] = [
    "E1C", "E1A", "E1B", "E1X", "E1Z", "Res", "E6C", "E6A",
    "E6B", "E6X", "E6Z", "Res", "E5bI", "E5bQ", "E5bX", "Res",
    "E5abI", "E5abQ", "E5abX", "Res", "E5aI", "E5aQ", "E5aX", "Res",
    "Res", "Res", "Res", "Res", "Res", "Res", "Res", "Res",
];

#[rustfmt::skip]
const SBAS_SIGNALS: [&str; 32] = [
    "L1C", "Res", "Res", "Res", "Res", "Res", "Res", "Res",
    "Res", "Res", "Res", "Res", "Res", "Res", "Res", "Res",
    "Res", "Res", "L5I", "L5Q", "L5X", "Res", "Res", "Res",
    "Res", "Res", "Res", "Res", "Res", "Res", "Res", "Res",
];

#[rustfmt::skip]
const QZSS_SIGNALS: [&str; 32] = [
    "L1C", "Res", "Res", "Res", "Res", "L6S", "L6L", "L6X",
    "Res", "L2CM", "L2CL", "L2CX", "Res", "Res", "Res", "Res",
    "Res", "Res", "L5I", "L5Q", "L5X", "Res", "Res", "Res",
    "Res", "L1CD", "L1CP", "L1CX", "Res", "Res", "Res", "Res",
];

#[rustfmt::skip]
const BEIDOU_SIGNALS: [&str; 32] = [
    "B1I", "B1Q", "B1X", "Res", "Res", "Res", "B3I", "B3Q",
    "B3X", "Res", "B2I", "B2Q", "B2X", "Res", "Res", "Res",
    "Res", "Res", "Res", "Res", "Res", "Res", "Res", "Res",
    "Res", "Res", "Res", "Res", "Res", "Res", "Res", "Res",
];
