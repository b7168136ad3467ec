//! Field view over the packed 64-bit identifier.

pub const SEQUENCE_BITS: u64 = 8;
pub const TIME_BUCKET_BITS: u64 = 32;
pub const MACHINE_ID_BITS: u64 = 24;

pub const TIME_BUCKET_SHIFT: u64 = SEQUENCE_BITS;
pub const MACHINE_ID_SHIFT: u64 = SEQUENCE_BITS + TIME_BUCKET_BITS;

pub const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;
pub const MAX_TIME_BUCKET: u64 = (1 << TIME_BUCKET_BITS) - 1;
pub const MAX_MACHINE_ID: u64 = (1 << MACHINE_ID_BITS) - 1;

/// The three fields of an identifier.
///
/// ```
/// use hostflake::FlakeId;
///
/// let id = FlakeId::new(1, 5, 0);
/// assert_eq!(id.to_u64(), 1_099_511_629_056);
/// assert_eq!(FlakeId::from_u64(1_099_511_629_057), FlakeId::new(1, 5, 1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlakeId {
    pub machine_id: u32,
    pub time_bucket: u32,
    pub sequence: u8,
}

impl FlakeId {
    /// Builds an id from its fields. Bits of `machine_id` above the 24-bit
    /// field are dropped.
    pub fn new(machine_id: u32, time_bucket: u32, sequence: u8) -> Self {
        Self {
            machine_id: (u64::from(machine_id) & MAX_MACHINE_ID) as u32,
            time_bucket,
            sequence,
        }
    }

    pub fn from_u64(id: u64) -> Self {
        Self {
            machine_id: ((id >> MACHINE_ID_SHIFT) & MAX_MACHINE_ID) as u32,
            time_bucket: ((id >> TIME_BUCKET_SHIFT) & MAX_TIME_BUCKET) as u32,
            sequence: (id & MAX_SEQUENCE) as u8,
        }
    }

    pub fn to_u64(self) -> u64 {
        pack(
            u64::from(self.machine_id),
            u64::from(self.time_bucket),
            u64::from(self.sequence),
        )
    }
}

impl From<u64> for FlakeId {
    fn from(id: u64) -> Self {
        Self::from_u64(id)
    }
}

impl From<FlakeId> for u64 {
    fn from(id: FlakeId) -> Self {
        id.to_u64()
    }
}

/// Packs raw fields, truncating each to its width.
pub(crate) fn pack(machine_id: u64, time_bucket: u64, sequence: u64) -> u64 {
    ((machine_id & MAX_MACHINE_ID) << MACHINE_ID_SHIFT)
        | ((time_bucket & MAX_TIME_BUCKET) << TIME_BUCKET_SHIFT)
        | (sequence & MAX_SEQUENCE)
}
