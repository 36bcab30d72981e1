use rand::{thread_rng, Rng, RngCore};

use crate::stream::LINE_TERMINATOR;

/// Produces delimiters used to separate messages and items in messages.
///
/// A delimiter must never contain the line terminator (`0x0A`);
/// implementations strip or avoid it.
pub trait DelimiterGen {
    /// Create a delimiter.
    fn make_delimiter(&mut self) -> Vec<u8>;
}

/// A delimiter generator for use when debugging message traffic.
///
/// Output is a fixed run of dashes followed by a unique identifier, which
/// is easy to spot in a debugger or a wireshark capture. Not intended for
/// collision resistance under adversarial payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugDelimiterGen;

const DEBUG_FILLER_LEN: usize = 29;

impl DelimiterGen for DebugDelimiterGen {
    fn make_delimiter(&mut self) -> Vec<u8> {
        let mut id = [0u8; 16];
        thread_rng().fill_bytes(&mut id);
        let mut delim = Vec::with_capacity(DEBUG_FILLER_LEN + 36);
        delim.extend(std::iter::repeat(b'-').take(DEBUG_FILLER_LEN));
        // Hyphenated hex in the familiar 8-4-4-4-12 layout.
        for (i, byte) in id.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                delim.push(b'-');
            }
            delim.extend(format!("{byte:02x}").into_bytes());
        }
        delim
    }
}

/// A generator for cryptographically random delimiters of slightly random
/// length. Use this (or similar) when the traffic is encrypted.
#[derive(Debug, Clone, Copy)]
pub struct RandomDelimiterGen {
    /// Maximum length of generated delimiters, in bytes.
    pub max_len: usize,
}

impl RandomDelimiterGen {
    pub const DEFAULT_MAX_LEN: usize = 64;

    /// Create a generator producing delimiters of up to `max_len` bytes.
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }
}

impl Default for RandomDelimiterGen {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_LEN)
    }
}

impl DelimiterGen for RandomDelimiterGen {
    /// Generates a delimiter of random length, normally up to 10 bytes
    /// shorter than the maximum. The result can be slightly shorter again
    /// because line-terminator bytes are removed from it, but never
    /// empty: a draw that loses all its bytes is retried. An empty
    /// delimiter line would be indistinguishable from the blank padding
    /// lines a receiver skips.
    fn make_delimiter(&mut self) -> Vec<u8> {
        let mut rng = thread_rng();
        loop {
            let length =
                rng.gen_range(self.max_len.saturating_sub(10).max(1)..self.max_len.max(2));
            let mut delim = vec![0u8; length];
            rng.fill_bytes(&mut delim);
            delim.retain(|b| *b != LINE_TERMINATOR);
            if !delim.is_empty() {
                return delim;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_delimiter_shape() {
        let delim = DebugDelimiterGen.make_delimiter();
        assert_eq!(&delim[..DEBUG_FILLER_LEN], vec![b'-'; DEBUG_FILLER_LEN]);
        assert_eq!(delim.len(), DEBUG_FILLER_LEN + 36);
        assert!(!delim.contains(&LINE_TERMINATOR));
    }

    #[test]
    fn debug_delimiters_are_unique() {
        let a = DebugDelimiterGen.make_delimiter();
        let b = DebugDelimiterGen.make_delimiter();
        assert_ne!(a, b);
    }

    #[test]
    fn random_delimiter_length_range() {
        let mut gen = RandomDelimiterGen::default();
        for _ in 0..100 {
            let delim = gen.make_delimiter();
            // Up to 10 shorter than max by the draw, possibly shorter
            // again after terminator removal.
            assert!(delim.len() < gen.max_len);
            assert!(!delim.is_empty());
            assert!(!delim.contains(&LINE_TERMINATOR));
        }
    }

    #[test]
    fn random_delimiter_small_max() {
        let mut gen = RandomDelimiterGen::new(4);
        for _ in 0..100 {
            let delim = gen.make_delimiter();
            assert!(delim.len() < 4);
            assert!(!delim.is_empty());
            assert!(!delim.contains(&LINE_TERMINATOR));
        }
    }

    #[test]
    fn random_delimiter_is_never_empty() {
        // max_len 1 forces single-byte draws; roughly one in 256 comes
        // out as the terminator and must be redrawn rather than emptied.
        let mut gen = RandomDelimiterGen::new(1);
        for _ in 0..2000 {
            let delim = gen.make_delimiter();
            assert_eq!(delim.len(), 1);
            assert_ne!(delim[0], LINE_TERMINATOR);
        }
    }
}
