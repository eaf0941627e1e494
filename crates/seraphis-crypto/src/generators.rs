//! Curve generators for the Seraphis generator set {G, X, U, H} and the
//! X25519 base point xG.
//!
//! `G` is the Ed25519 basepoint and `H` is the fixed Pedersen commitment
//! generator. `X` and `U` are derived once by try-and-increment
//! hash-to-point (keccak, decompress, clear cofactor) so their discrete
//! logs relative to G are unknown.

use std::sync::OnceLock;

use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::traits::Identity;

use crate::hash::keccak256;

/// Pedersen commitment generator H (compressed).
pub const H_BYTES: [u8; 32] = [
    0x8b, 0x65, 0x59, 0x70, 0x15, 0x37, 0x99, 0xaf, 0x2a, 0xea, 0xdc, 0x9f, 0xf1, 0xad, 0xd0,
    0xea, 0x6c, 0x72, 0x51, 0xd5, 0x41, 0x54, 0xcf, 0xa9, 0x2c, 0x17, 0x3a, 0x0d, 0xd3, 0x9c,
    0x1f, 0x94,
];

/// X25519 base point (u = 9).
pub const XG_BYTES: [u8; 32] = [
    9, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0,
];

const X_GEN_SEED: &[u8] = b"seraphis_generator_X";
const U_GEN_SEED: &[u8] = b"seraphis_generator_U";

fn hash_to_point(seed: &[u8]) -> EdwardsPoint {
    let mut candidate = keccak256(&[seed]);
    loop {
        if let Some(point) = CompressedEdwardsY(candidate).decompress() {
            let point = point.mul_by_cofactor();
            if point != EdwardsPoint::identity() {
                return point;
            }
        }
        candidate = keccak256(&[&candidate]);
    }
}

/// G.
pub fn g_gen() -> EdwardsPoint {
    ED25519_BASEPOINT_POINT
}

/// H.
pub fn h_gen() -> EdwardsPoint {
    static H: OnceLock<EdwardsPoint> = OnceLock::new();
    *H.get_or_init(|| {
        CompressedEdwardsY(H_BYTES)
            .decompress()
            .expect("H generator bytes are a valid point")
    })
}

/// X.
pub fn x_gen() -> EdwardsPoint {
    static X: OnceLock<EdwardsPoint> = OnceLock::new();
    *X.get_or_init(|| hash_to_point(X_GEN_SEED))
}

/// U.
pub fn u_gen() -> EdwardsPoint {
    static U: OnceLock<EdwardsPoint> = OnceLock::new();
    *U.get_or_init(|| hash_to_point(U_GEN_SEED))
}

/// xG.
pub fn xg_gen() -> MontgomeryPoint {
    MontgomeryPoint(XG_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_are_distinct() {
        let gens = [g_gen(), h_gen(), x_gen(), u_gen()];
        for (i, a) in gens.iter().enumerate() {
            for b in &gens[i + 1..] {
                assert_ne!(a.compress(), b.compress());
            }
        }
    }

    #[test]
    fn derived_generators_are_stable() {
        assert_eq!(x_gen().compress(), x_gen().compress());
        assert_eq!(u_gen().compress(), u_gen().compress());
    }

    #[test]
    fn derived_generators_are_torsion_free() {
        assert!(x_gen().is_torsion_free());
        assert!(u_gen().is_torsion_free());
    }
}
