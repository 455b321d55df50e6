//! Interned short strings.
//!
//! Row decoding produces many one to three character strings (codes, flags,
//! abbreviations). With the `value-cache` feature those come from a shared
//! table instead of a fresh allocation per row.

use std::sync::Arc;

#[cfg(feature = "value-cache")]
mod table {
    use std::sync::{Arc, LazyLock, OnceLock};

    const ASCII: usize = 128;
    const ALPHABET: &[u8; 64] =
        b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz -";

    type Slots = Box<[OnceLock<Arc<str>>]>;

    fn slots(n: usize) -> Slots {
        (0..n).map(|_| OnceLock::new()).collect()
    }

    static ONE: LazyLock<Slots> = LazyLock::new(|| slots(ASCII));
    static TWO: LazyLock<Slots> = LazyLock::new(|| slots(ASCII * ASCII));
    static THREE: LazyLock<Slots> = LazyLock::new(|| slots(ALPHABET.len().pow(3)));

    fn alphabet_index(b: u8) -> Option<usize> {
        match b {
            b'0'..=b'9' => Some(usize::from(b - b'0')),
            b'A'..=b'Z' => Some(usize::from(b - b'A') + 10),
            b'a'..=b'z' => Some(usize::from(b - b'a') + 36),
            b' ' => Some(62),
            b'-' => Some(63),
            _ => None,
        }
    }

    fn ascii_index(b: u8) -> Option<usize> {
        b.is_ascii().then_some(usize::from(b))
    }

    pub(super) fn lookup(s: &str) -> Option<Arc<str>> {
        let (table, index): (&Slots, usize) = match *s.as_bytes() {
            [a] => (&ONE, ascii_index(a)?),
            [a, b] => (&TWO, ascii_index(a)? * ASCII + ascii_index(b)?),
            [a, b, c] => {
                let n = ALPHABET.len();
                let index = (alphabet_index(a)? * n + alphabet_index(b)?) * n + alphabet_index(c)?;
                (&THREE, index)
            }
            _ => return None,
        };
        let slot = table.get(index)?;
        Some(Arc::clone(slot.get_or_init(|| Arc::from(s))))
    }
}

/// Interned instance of `s`, if `s` is short enough to be cached
#[cfg(feature = "value-cache")]
pub fn cached_str(s: &str) -> Option<Arc<str>> {
    table::lookup(s)
}

#[cfg(not(feature = "value-cache"))]
pub fn cached_str(_s: &str) -> Option<Arc<str>> {
    None
}

/// Shared string for `s`: the interned instance if cached, a new allocation otherwise
pub fn shared_str(s: &str) -> Arc<str> {
    cached_str(s).unwrap_or_else(|| Arc::from(s))
}
