use crate::error::{CorruptKind, Result};

pub const SIGNATURE: [u8; 8] = *b"RHHHKSLP";

/// Bytes this reader needs to understand a header
pub const HEADER_SIZE: usize = 40;

/// Header size as written, padded to 8-byte alignment
pub const HEADER_SIZE_ALIGNED: usize = (HEADER_SIZE + 7) & !7;

/// Feature bits that older readers may safely ignore
///
/// No compatible flags are defined yet. Unknown bits are preserved on read
/// and never cause a rejection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompatibleFlags(u32);

impl CompatibleFlags {
    pub const KNOWN: u32 = 0;

    pub fn from_bits_retain(bits: u32) -> Self {
        CompatibleFlags(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Bits set by a newer writer that this reader has no meaning for
    pub fn unknown(&self) -> u32 {
        self.0 & !Self::KNOWN
    }
}

/// Feature bits a reader must understand before touching the file
///
/// No incompatible flags are defined yet, so any set bit makes the file
/// unreadable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncompatibleFlags(u32);

impl IncompatibleFlags {
    pub const KNOWN: u32 = 0;

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Reject bits this reader does not support
    pub fn from_bits(bits: u32) -> Result<Self> {
        if bits & !Self::KNOWN != 0 {
            return Err(CorruptKind::UnsupportedFlags(bits).into());
        }
        Ok(IncompatibleFlags(bits))
    }
}

/// Catalog database header
///
/// Sits at offset 0 of the database file. `header_size` and
/// `item_record_size` let newer writers grow either structure: readers skip
/// the bytes they do not know, and step through items by the declared size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogHeader {
    /// Signature: "RHHHKSLP"
    pub signature: [u8; 8],

    pub compatible_flags: CompatibleFlags,

    pub incompatible_flags: IncompatibleFlags,

    /// Offset of the first item record
    pub header_size: u64,

    /// Number of item records
    pub n_items: u64,

    /// Size of one item record in bytes
    pub item_record_size: u64,
}

impl CatalogHeader {
    /// Header for a database this crate writes
    pub fn new(n_items: u64) -> Self {
        CatalogHeader {
            signature: SIGNATURE,
            compatible_flags: CompatibleFlags::default(),
            incompatible_flags: IncompatibleFlags::default(),
            header_size: HEADER_SIZE_ALIGNED as u64,
            n_items,
            item_record_size: crate::item::ITEM_SIZE as u64,
        }
    }

    /// Offset of the string blob, relative to the start of the file
    ///
    /// `None` when the declared sizes overflow.
    pub fn strings_offset(&self) -> Option<u64> {
        self.n_items
            .checked_mul(self.item_record_size)?
            .checked_add(self.header_size)
    }

    /// Check the header against a file of `file_len` bytes
    pub fn validate(&self, file_len: u64) -> Result<()> {
        if self.signature != SIGNATURE {
            return Err(CorruptKind::BadSignature.into());
        }

        if self.header_size < HEADER_SIZE as u64 {
            return Err(CorruptKind::HeaderTooSmall(self.header_size).into());
        }

        if self.item_record_size < crate::item::ITEM_SIZE as u64 {
            return Err(CorruptKind::RecordTooSmall(self.item_record_size).into());
        }

        if self.n_items == 0 {
            return Err(CorruptKind::NoItems.into());
        }

        match self.strings_offset() {
            Some(needed) if needed <= file_len => Ok(()),
            Some(needed) => Err(CorruptKind::ItemsOutOfBounds {
                needed,
                len: file_len,
            }
            .into()),
            None => Err(CorruptKind::ItemsOutOfBounds {
                needed: u64::MAX,
                len: file_len,
            }
            .into()),
        }
    }

    /// Serialize header to bytes, padded to the aligned header size
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE_ALIGNED);

        bytes.extend_from_slice(&self.signature);
        bytes.extend_from_slice(&self.compatible_flags.bits().to_le_bytes());
        bytes.extend_from_slice(&self.incompatible_flags.bits().to_le_bytes());
        bytes.extend_from_slice(&self.header_size.to_le_bytes());
        bytes.extend_from_slice(&self.n_items.to_le_bytes());
        bytes.extend_from_slice(&self.item_record_size.to_le_bytes());

        bytes.resize(HEADER_SIZE_ALIGNED, 0);

        bytes
    }

    /// Deserialize and validate a header from the start of a database image
    ///
    /// `bytes` is the whole file, so the item array bounds can be checked.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(CorruptKind::Truncated {
                len: bytes.len() as u64,
            }
            .into());
        }

        let mut signature = [0u8; 8];
        signature.copy_from_slice(&bytes[0..8]);
        if signature != SIGNATURE {
            return Err(CorruptKind::BadSignature.into());
        }

        let header = CatalogHeader {
            signature,
            compatible_flags: CompatibleFlags::from_bits_retain(read_u32(bytes, 8)),
            incompatible_flags: IncompatibleFlags::from_bits(read_u32(bytes, 12))?,
            header_size: read_u64(bytes, 16),
            n_items: read_u64(bytes, 24),
            item_record_size: read_u64(bytes, 32),
        };

        header.validate(bytes.len() as u64)?;

        Ok(header)
    }
}

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

pub(crate) fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(buf)
}
