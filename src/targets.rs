//! Precomputed right-bucket targets
//!
//! For a left entry with residue `r = yl mod BC` and parity
//! `(yl / BC) mod 2`, offset candidate `m` can only be satisfied by a right
//! entry whose residue is
//!
//! ```text
//! ((r / C + m) mod B) * C + ((2m + parity)^2 + r) mod C
//! ```
//!
//! The table is built once per configuration and shared read-only by every
//! matcher.

use crate::config::Phase1Config;

#[derive(Debug, Clone)]
pub struct TargetTable {
    bc: usize,
    extra_bits_pow: usize,
    /// `[parity][r][m]`, flattened
    targets: Vec<u32>,
}

impl TargetTable {
    pub fn new(config: &Phase1Config) -> Self {
        let b = config.b as usize;
        let c = config.c as usize;
        let bc = config.bc() as usize;
        let extra_bits_pow = config.extra_bits_pow() as usize;

        let mut targets = Vec::with_capacity(2 * bc * extra_bits_pow);
        for parity in 0..2usize {
            for r in 0..bc {
                let ind_j = r / c;
                for m in 0..extra_bits_pow {
                    let sq = (2 * m + parity) * (2 * m + parity);
                    let yr = ((ind_j + m) % b) * c + (sq + r) % c;
                    targets.push(yr as u32);
                }
            }
        }

        Self {
            bc,
            extra_bits_pow,
            targets,
        }
    }

    /// The `extra_bits_pow` candidate right residues for left residue `r`
    #[inline]
    pub fn row(&self, parity: usize, r: usize) -> &[u32] {
        let start = (parity * self.bc + r) * self.extra_bits_pow;
        &self.targets[start..start + self.extra_bits_pow]
    }

    #[inline]
    pub fn target(&self, parity: usize, r: usize, m: usize) -> u32 {
        self.row(parity, r)[m]
    }

    pub fn bc(&self) -> usize {
        self.bc
    }

    pub fn extra_bits_pow(&self) -> usize {
        self.extra_bits_pow
    }
}
