// Order-independent digest over a marker snapshot.

use crc32fast::Hasher;

/// CRC-32 (IEEE) of one raw record exactly as the store delivered it.
pub fn record_checksum(record: &[u8]) -> u32 {
    crc32fast::hash(record)
}

/// Digest of a marker multiset: per-record checksums sorted ascending, then checksummed as
/// little-endian `u32`s. Ingestion order does not affect the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u32);

impl Fingerprint {
    pub fn from_checksums(mut checksums: Vec<u32>) -> Self {
        checksums.sort_unstable();
        let mut hasher = Hasher::new();
        for checksum in checksums {
            hasher.update(&checksum.to_le_bytes());
        }
        Self(hasher.finalize())
    }
}

#[cfg(test)]
impl Fingerprint {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a [u8]>) -> Self {
        Self::from_checksums(records.into_iter().map(record_checksum).collect())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}
