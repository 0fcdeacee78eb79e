use crate::Generator;
use rand::Rng;
use twurl_core::shortcode::{ALPHABET, LENGTH};
use twurl_core::ShortCode;

/// Draws every character uniformly from the base62 alphabet.
///
/// 62^6 (about 5.7e10) possible codes keeps collisions rare; the ones that
/// do happen are resolved by retrying the insert.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for RandomGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let mut rng = rand::rng();
        let code: String = (0..LENGTH)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        ShortCode::new_unchecked(code)
    }
}
