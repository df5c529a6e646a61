//! Small MSB-first bit buffer
//!
//! Only what the table functions need: append right-aligned integers of a
//! given width, export the populated bytes, and cut bit windows back out.
//! Widths never exceed 128 bits per value and 512 bits per buffer.

/// Capacity of a [`Bits`] buffer in bytes
pub const BITS_CAPACITY: usize = 64;

#[derive(Clone, PartialEq, Eq)]
pub struct Bits {
    bytes: [u8; BITS_CAPACITY],
    len: usize,
}

impl Default for Bits {
    fn default() -> Self {
        Self {
            bytes: [0; BITS_CAPACITY],
            len: 0,
        }
    }
}

impl std::fmt::Debug for Bits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bits({}: {})", self.len, hex::encode(self.as_bytes()))
    }
}

impl Bits {
    pub fn new() -> Self {
        Self::default()
    }

    /// The low `bits` bits of `value`
    pub fn from_value(value: u128, bits: usize) -> Self {
        let mut out = Self::new();
        out.append(value, bits);
        out
    }

    /// All bits of `bytes`, first byte most significant
    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() <= BITS_CAPACITY);
        let mut out = Self::new();
        out.bytes[..bytes.len()].copy_from_slice(bytes);
        out.len = bytes.len() * 8;
        out
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append the low `bits` bits of `value`
    pub fn append(&mut self, value: u128, bits: usize) {
        debug_assert!(bits <= 128);
        debug_assert!(self.len + bits <= BITS_CAPACITY * 8);
        let mut remaining = bits;
        while remaining > 0 {
            let used = self.len % 8;
            let free = 8 - used;
            let take = free.min(remaining);
            let chunk = ((value >> (remaining - take)) & ((1u128 << take) - 1)) as u8;
            self.bytes[self.len / 8] |= chunk << (free - take);
            self.len += take;
            remaining -= take;
        }
    }

    pub fn extend(&mut self, other: &Bits) {
        let mut start = 0;
        while start < other.len {
            let take = (other.len - start).min(128);
            self.append(other.read(start, take), take);
            start += take;
        }
    }

    /// Bits `[start, start + len)` as a right-aligned integer
    pub fn read(&self, start: usize, len: usize) -> u128 {
        read_bits(&self.bytes, start, len)
    }

    /// Bits `[start, end)` as a new buffer
    pub fn slice(&self, start: usize, end: usize) -> Bits {
        Bits::from_value(self.read(start, end - start), end - start)
    }

    /// Populated bytes; the last one is zero padded
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len.div_ceil(8)]
    }

    /// Whole buffer as an integer; only valid up to 128 bits
    pub fn to_u128(&self) -> u128 {
        self.read(0, self.len)
    }
}

/// Read `len` (<= 128) bits starting at bit `start` of `bytes`, MSB first.
/// Bits past the end of `bytes` read as zero.
pub fn read_bits(bytes: &[u8], start: usize, len: usize) -> u128 {
    debug_assert!(len <= 128);
    let mut out = 0u128;
    let mut pos = start;
    let mut remaining = len;
    while remaining > 0 {
        let byte = bytes.get(pos / 8).copied().unwrap_or(0);
        let avail = 8 - pos % 8;
        let take = avail.min(remaining);
        let chunk = (byte >> (avail - take)) & (((1u16 << take) - 1) as u8);
        // `take` is at most 8, so a 128-bit accumulator never loses bits we keep
        out = (out << take) | u128::from(chunk);
        pos += take;
        remaining -= take;
    }
    out
}
