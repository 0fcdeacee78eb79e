use crate::Generator;
use std::sync::atomic::{AtomicU64, Ordering};
use twurl_core::shortcode::{ALPHABET, LENGTH};
use twurl_core::ShortCode;

/// 62^6, the number of distinct codes.
const CODE_SPACE: u64 = 56_800_235_584;

/// A short code generator using a sequential counter.
///
/// The counter is rendered as a zero-padded base62 number ("000000",
/// "000001", ...), wrapping around after the last code. Two generators with
/// the same offset produce the same sequence, so separate nodes need
/// disjoint offsets.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
        }
    }
}

impl SeqGenerator {
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// Creates a generator starting from a specific counter value.
    ///
    /// Useful for resuming from a known state or distributing
    /// counter ranges across nodes (e.g., node 1 starts at 0, node 2 at 1_000_000).
    pub fn with_offset(offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
        }
    }

    fn encode(mut value: u64) -> String {
        value %= CODE_SPACE;
        let mut digits = [ALPHABET[0]; LENGTH];
        for slot in digits.iter_mut().rev() {
            *slot = ALPHABET[(value % 62) as usize];
            value /= 62;
        }
        digits.iter().map(|&b| b as char).collect()
    }
}

impl Default for SeqGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for SeqGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        ShortCode::new_unchecked(Self::encode(count))
    }
}
