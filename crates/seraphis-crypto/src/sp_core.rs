//! Seraphis core operations: spendkey composition, enote squashing, key
//! images, and enote images.
//!
//! Spend keys compose over the {X, U} generators; the squashed-enote model
//! folds an enote's `(Ko, C)` into a single point before masking so one
//! membership proof covers both.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;

use crate::enote::EnoteImage;
use crate::generators::{g_gen, u_gen, x_gen};
use crate::hash::hash_scalar;
use crate::CryptoError;

const DOMAIN_SQUASHED_ENOTE: &str = "seraphis_squashed_enote";

/// `k_b U` — spendbase from the master component.
pub fn make_seraphis_spendbase(spendbase_privkey: &Scalar) -> EdwardsPoint {
    spendbase_privkey * u_gen()
}

/// `K + k_ext X`.
pub fn extend_seraphis_spendkey(extension: &Scalar, spendkey: &EdwardsPoint) -> EdwardsPoint {
    extension * x_gen() + spendkey
}

/// `K - k_a X` — strips a view component, e.g. `K_s - k_vb X = k_m U`.
pub fn reduce_seraphis_spendkey(k_view: &Scalar, spendkey: &EdwardsPoint) -> EdwardsPoint {
    spendkey - k_view * x_gen()
}

/// `KI = (z / y) U` from `y` and the point `z U`.
pub fn make_seraphis_key_image(y: &Scalar, z_u: &EdwardsPoint) -> Result<EdwardsPoint, CryptoError> {
    if *y == Scalar::ZERO {
        return Err(CryptoError::ZeroScalar);
    }
    if *z_u == EdwardsPoint::identity() {
        return Err(CryptoError::ZeroScalar);
    }
    Ok(y.invert() * z_u)
}

/// `KI = (z / y) U` from both privkeys.
pub fn make_seraphis_key_image_from_privkeys(
    y: &Scalar,
    z: &Scalar,
) -> Result<EdwardsPoint, CryptoError> {
    make_seraphis_key_image(y, &(z * u_gen()))
}

/// `H_n(Ko, C)` — squash prefix.
pub fn make_squash_prefix(onetime_address: &[u8; 32], amount_commitment: &[u8; 32]) -> Scalar {
    hash_scalar(DOMAIN_SQUASHED_ENOTE, &[onetime_address, amount_commitment])
}

/// `Ko^t = H_n(Ko, C) Ko` — squashed address.
pub fn squash_address(
    onetime_address: &EdwardsPoint,
    amount_commitment: &EdwardsPoint,
) -> EdwardsPoint {
    let prefix = make_squash_prefix(
        onetime_address.compress().as_bytes(),
        amount_commitment.compress().as_bytes(),
    );
    prefix * onetime_address
}

/// `Q = Ko^t + C` — fully squashed enote (the membership-proof element).
pub fn squash_enote(
    onetime_address: &EdwardsPoint,
    amount_commitment: &EdwardsPoint,
) -> EdwardsPoint {
    squash_address(onetime_address, amount_commitment) + amount_commitment
}

/// Build the enote image for spending: masked squashed address, masked
/// commitment, and the key image.
pub fn make_enote_image(
    onetime_address: &EdwardsPoint,
    amount_commitment: &EdwardsPoint,
    address_mask: &Scalar,
    commitment_mask: &Scalar,
    key_image: &EdwardsPoint,
) -> EnoteImage {
    let masked_address = address_mask * g_gen() + squash_address(onetime_address, amount_commitment);
    let masked_commitment = commitment_mask * g_gen() + amount_commitment;

    EnoteImage {
        masked_address: masked_address.compress().to_bytes(),
        masked_commitment: masked_commitment.compress().to_bytes(),
        key_image: key_image.compress().to_bytes(),
    }
}
