// Territory markers as delivered by the marker store.

use super::errors::MarkerError;

/// Length of one raw marker record: owner (8), x (2), y (2), type (1), reserved (3).
pub const RECORD_LEN: usize = 16;

// Owner, x, y and type; anything after is reserved.
const DECODED_LEN: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerType {
    Land,
    Water,
}

impl MarkerType {
    pub fn from_code(code: u8) -> Result<Self, MarkerError> {
        match code {
            0 => Ok(MarkerType::Land),
            1 => Ok(MarkerType::Water),
            other => Err(MarkerError::UnknownType(other)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            MarkerType::Land => 0,
            MarkerType::Water => 1,
        }
    }
}

/// One ownership claim point, positioned relative to its server cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub cell_x: u32,
    pub cell_y: u32,
    pub owner_id: u64,
    pub rel_x: f64,
    pub rel_y: f64,
    pub kind: MarkerType,
}

impl Marker {
    /// Builds a marker, rejecting relative positions outside `[0, 1]`.
    pub fn new(
        cell_x: u32,
        cell_y: u32,
        owner_id: u64,
        rel_x: f64,
        rel_y: f64,
        kind: MarkerType,
    ) -> Result<Self, MarkerError> {
        for value in [rel_x, rel_y] {
            if !value.is_finite() {
                return Err(MarkerError::NonFinite);
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(MarkerError::OutOfRange(value));
            }
        }

        Ok(Self {
            cell_x,
            cell_y,
            owner_id,
            rel_x,
            rel_y,
            kind,
        })
    }

    /// Decodes a raw store record for the given cell. Trailing reserved bytes are ignored.
    pub fn from_record(cell_x: u32, cell_y: u32, bytes: &[u8]) -> Result<Self, MarkerError> {
        if bytes.len() < DECODED_LEN {
            return Err(MarkerError::ShortRecord(bytes.len()));
        }

        let mut owner = [0u8; 8];
        owner.copy_from_slice(&bytes[0..8]);
        let owner_id = u64::from_le_bytes(owner);
        let raw_x = u16::from_le_bytes([bytes[8], bytes[9]]);
        let raw_y = u16::from_le_bytes([bytes[10], bytes[11]]);
        let kind = MarkerType::from_code(bytes[12])?;

        Self::new(
            cell_x,
            cell_y,
            owner_id,
            f64::from(raw_x) / f64::from(u16::MAX),
            f64::from(raw_y) / f64::from(u16::MAX),
            kind,
        )
    }
}

/// Encodes a record in the store layout, reserved bytes zeroed.
pub fn encode_record(owner_id: u64, raw_x: u16, raw_y: u16, kind: MarkerType) -> [u8; RECORD_LEN] {
    let mut record = [0u8; RECORD_LEN];
    record[0..8].copy_from_slice(&owner_id.to_le_bytes());
    record[8..10].copy_from_slice(&raw_x.to_le_bytes());
    record[10..12].copy_from_slice(&raw_y.to_le_bytes());
    record[12] = kind.code();
    record
}

/// Packs a cell position into the store's server id (`x` in the high half).
pub fn pack_server_id(cell_x: u32, cell_y: u32) -> u32 {
    (cell_x << 16) | (cell_y & 0xffff)
}
