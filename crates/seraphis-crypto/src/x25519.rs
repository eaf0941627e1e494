//! X25519 scalar multiplication helpers.
//!
//! Jamtis X25519 privkeys are Ed25519 scalars reduced mod l, so they stay
//! invertible and no RFC 7748 clamping is applied anywhere; the raw
//! Montgomery ladder from `curve25519-dalek` does the point work.

use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;

use crate::generators::xg_gen;

/// `s * xG`.
pub fn scmul_base(scalar: &Scalar) -> MontgomeryPoint {
    xg_gen() * scalar
}

/// `s * P`.
pub fn scmul_key(scalar: &Scalar, point: &MontgomeryPoint) -> MontgomeryPoint {
    *point * scalar
}

/// `(1 / (f_1 * f_2 * ...)) * P` — inverts the product of all factors.
///
/// Every factor must be nonzero; callers derive them from hash outputs
/// where a zero is a negligible-probability invariant violation.
pub fn invmul_key(factors: &[&Scalar], point: &MontgomeryPoint) -> MontgomeryPoint {
    let mut product = Scalar::ONE;
    for factor in factors {
        product *= *factor;
    }
    *point * product.invert()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invmul_undoes_scmul() {
        let a = Scalar::from(1234567u64);
        let b = Scalar::from(89u64);

        let point = scmul_base(&Scalar::from(42u64));
        let ab_point = scmul_key(&b, &scmul_key(&a, &point));
        assert_eq!(invmul_key(&[&a, &b], &ab_point), point);
    }

    #[test]
    fn scmul_is_commutative_in_the_exponent() {
        let a = Scalar::from(777u64);
        let b = Scalar::from(919u64);
        let ab = scmul_key(&b, &scmul_base(&a));
        let ba = scmul_key(&a, &scmul_base(&b));
        assert_eq!(ab, ba);
    }
}
