//! Zigzag (frequency) order of an 8x8 coefficient block.
//!
//! Blocks are kept in natural (row-major) order everywhere in this crate.
//! Zigzag order only appears at the edges: inside the entropy-coded data,
//! inside DQT segments and in the coefficient dump.

/// Zigzag position to natural (row-major) index.
///
/// `ZIGZAG_TO_NATURAL[i]` is the natural index of the `i`-th coefficient in
/// frequency order, lowest spatial frequency first.
pub const ZIGZAG_TO_NATURAL: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// Natural (row-major) index to zigzag position, the inverse of [`ZIGZAG_TO_NATURAL`].
pub const NATURAL_TO_ZIGZAG: [usize; 64] = [
    0, 1, 5, 6, 14, 15, 27, 28, 2, 4, 7, 13, 16, 26, 29, 42, 3, 8, 12, 17, 25, 30, 41, 43, 9, 11,
    18, 24, 31, 40, 44, 53, 10, 19, 23, 32, 39, 45, 52, 54, 20, 22, 33, 38, 46, 51, 55, 60, 21, 34,
    37, 47, 50, 56, 59, 61, 35, 36, 48, 49, 57, 58, 62, 63,
];

/// Reorder natural-order values into frequency order: `out[i] = natural[ZIGZAG_TO_NATURAL[i]]`.
pub fn to_zigzag<T: Copy + Default>(natural: &[T; 64]) -> [T; 64] {
    let mut out = [T::default(); 64];
    for (slot, &n) in out.iter_mut().zip(ZIGZAG_TO_NATURAL.iter()) {
        *slot = natural[n];
    }
    out
}

/// Reorder frequency-order values back into natural order.
pub fn to_natural<T: Copy + Default>(zigzag: &[T; 64]) -> [T; 64] {
    let mut out = [T::default(); 64];
    for (i, &n) in ZIGZAG_TO_NATURAL.iter().enumerate() {
        out[n] = zigzag[i];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag_is_a_permutation() {
        let mut seen = [false; 64];
        for &n in ZIGZAG_TO_NATURAL.iter() {
            assert!(!seen[n], "natural index {} appears twice", n);
            seen[n] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_zigzag_mapping_inverse() {
        for i in 0..64 {
            assert_eq!(NATURAL_TO_ZIGZAG[ZIGZAG_TO_NATURAL[i]], i);
            assert_eq!(ZIGZAG_TO_NATURAL[NATURAL_TO_ZIGZAG[i]], i);
        }
    }

    #[test]
    fn test_known_positions() {
        assert_eq!(ZIGZAG_TO_NATURAL[0], 0);
        assert_eq!(ZIGZAG_TO_NATURAL[1], 1);
        assert_eq!(ZIGZAG_TO_NATURAL[2], 8);
        assert_eq!(ZIGZAG_TO_NATURAL[3], 16);
        assert_eq!(ZIGZAG_TO_NATURAL[63], 63);
    }

    #[test]
    fn test_reorder_and_back() {
        let mut natural = [0i16; 64];
        for (i, v) in natural.iter_mut().enumerate() {
            *v = i as i16 * 3 - 90;
        }

        let zz = to_zigzag(&natural);
        assert_eq!(zz[2], natural[8]);
        assert_eq!(zz[5], natural[2]);
        assert_eq!(to_natural(&zz), natural);
    }
}
