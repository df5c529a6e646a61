//! Table 1: keystream-driven `y` values
//!
//! The ChaCha8 key is the plot id with the table index (1) prepended; the
//! nonce is all zero. Keystream block `i` yields the sixteen entries with
//! `x` in `[16 * i, 16 * i + 16)`.

use chacha20::cipher::{KeyIvInit, StreamCipher, StreamCipherSeek};
use chacha20::{ChaCha8, Key, Nonce};

use crate::config::{Phase1Config, ENTRIES_PER_BLOCK};
use crate::entry::{PlotId, Table1Entry};

/// Bytes of keystream per block
pub const KEYSTREAM_BLOCK_BYTES: usize = 64;

/// Index of the table whose function keys the cipher
const TABLE_1_INDEX: u8 = 1;

pub struct F1Calculator {
    cipher: ChaCha8,
    k: u8,
    extra_bits: u8,
}

impl F1Calculator {
    pub fn new(config: &Phase1Config, id: &PlotId) -> Self {
        let mut enc_key = [0u8; 32];
        enc_key[0] = TABLE_1_INDEX;
        enc_key[1..].copy_from_slice(&id.0[..31]);

        let key = Key::from(enc_key);
        let nonce = Nonce::default();

        Self {
            cipher: ChaCha8::new(&key, &nonce),
            k: config.k,
            extra_bits: config.extra_bits,
        }
    }

    /// Raw keystream block `index`
    pub fn keystream_block(&mut self, index: u64) -> [u8; KEYSTREAM_BLOCK_BYTES] {
        let mut buf = [0u8; KEYSTREAM_BLOCK_BYTES];
        self.cipher.seek(index * KEYSTREAM_BLOCK_BYTES as u64);
        self.cipher.apply_keystream(&mut buf);
        buf
    }

    /// `y` for one `x`, given the 32-bit keystream word assigned to it
    #[inline]
    pub fn compute_y(&self, x: u64, word: u32) -> u64 {
        let k = u32::from(self.k);
        let extra_bits = u32::from(self.extra_bits);
        let high = u64::from(word >> (32 - k));
        (high << extra_bits) | (x >> (k - extra_bits))
    }

    /// The sixteen entries of block `index`
    pub fn generate_block(&mut self, index: u64) -> [Table1Entry; ENTRIES_PER_BLOCK as usize] {
        let buf = self.keystream_block(index);
        let mut block = [Table1Entry::default(); ENTRIES_PER_BLOCK as usize];
        for (i, (entry, word)) in block.iter_mut().zip(buf.chunks_exact(4)).enumerate() {
            let word = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
            let x = index * ENTRIES_PER_BLOCK + i as u64;
            entry.x = x as u32;
            entry.y = self.compute_y(x, word);
        }
        block
    }

    /// Append blocks `[first, first + count)` to `out`
    pub fn generate_blocks(&mut self, first: u64, count: u64, out: &mut Vec<Table1Entry>) {
        out.reserve((count * ENTRIES_PER_BLOCK) as usize);
        for index in first..first + count {
            out.extend_from_slice(&self.generate_block(index));
        }
    }
}
