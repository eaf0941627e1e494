//! Wallet key hierarchy.
//!
//! Deterministic, stateless derivation rooted at the master spend scalar:
//!
//! ```text
//! k_m ─┬─ k_vb ─┬─ xk_ua ── xK_ua = xk_ua * xG
//!      │        ├─ xk_fr ── xK_fr = xk_fr * xK_ua
//!      │        └─ s_ga ─── s_ct
//!      └─ K_s = k_vb * X + k_m * U
//! ```
//!
//! Each child is a single domain-separated hash of its parent; revealing a
//! child never reveals a sibling. The aggregate [`JamtisKeys`] owns every
//! secret and wipes them on drop.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::VartimeMultiscalarMul;
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::generators::{u_gen, x_gen};
use crate::hash::{hash32, hash_scalar};
use crate::random_scalar;
use crate::x25519;

const DOMAIN_VIEW_BALANCE_KEY: &str = "jamtis_view_balance_key";
const DOMAIN_UNLOCK_AMOUNTS_KEY: &str = "jamtis_unlock_amounts_key";
const DOMAIN_FIND_RECEIVED_KEY: &str = "jamtis_find_received_key";
const DOMAIN_GENERATE_ADDRESS_SECRET: &str = "jamtis_generate_address_secret";
const DOMAIN_CIPHER_TAG_SECRET: &str = "jamtis_cipher_tag_secret";

/// `k_vb = H_n("view-balance", k_m)` — enables full recovery.
pub fn make_viewbalance_key(k_master: &Scalar) -> Scalar {
    hash_scalar(DOMAIN_VIEW_BALANCE_KEY, &[k_master.as_bytes()])
}

/// `xk_ua = H_n_x25519("unlock-amounts", k_vb)` — for decrypting amounts and
/// reconstructing amount commitments.
pub fn make_unlockamounts_key(k_view_balance: &Scalar) -> Scalar {
    hash_scalar(DOMAIN_UNLOCK_AMOUNTS_KEY, &[k_view_balance.as_bytes()])
}

/// `xk_fr = H_n_x25519("find-received", k_vb)` — for view tags and nominal
/// spend keys.
pub fn make_findreceived_key(k_view_balance: &Scalar) -> Scalar {
    hash_scalar(DOMAIN_FIND_RECEIVED_KEY, &[k_view_balance.as_bytes()])
}

/// `s_ga = H_32("generate-address", k_vb)` — for generating addresses.
pub fn make_generateaddress_secret(k_view_balance: &Scalar) -> [u8; 32] {
    hash32(DOMAIN_GENERATE_ADDRESS_SECRET, &[k_view_balance.as_bytes()])
}

/// `s_ct = H_32("cipher-tag", s_ga)` — the address-tag cipher key.
pub fn make_ciphertag_secret(s_generate_address: &[u8; 32]) -> [u8; 32] {
    hash32(DOMAIN_CIPHER_TAG_SECRET, &[s_generate_address])
}

/// `K_s = k_vb * X + k_m * U` — wallet spend base.
pub fn make_seraphis_spendkey(k_view_balance: &Scalar, k_master: &Scalar) -> EdwardsPoint {
    EdwardsPoint::vartime_multiscalar_mul(&[*k_view_balance, *k_master], &[x_gen(), u_gen()])
}

/// Full wallet key material.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct JamtisKeys {
    /// Master spend scalar `k_m`.
    pub k_master: Scalar,
    /// View-balance scalar `k_vb`.
    pub k_view_balance: Scalar,
    /// Unlock-amounts X25519 scalar `xk_ua`.
    pub xk_unlock_amounts: Scalar,
    /// Find-received X25519 scalar `xk_fr`.
    pub xk_find_received: Scalar,
    /// Generate-address secret `s_ga`.
    pub s_generate_address: [u8; 32],
    /// Cipher-tag secret `s_ct` (the Twofish key).
    pub s_cipher_tag: [u8; 32],
    /// Wallet spend base `K_s = k_vb * X + k_m * U`.
    #[zeroize(skip)]
    pub spend_pubkey: EdwardsPoint,
    /// Advertised unlock-amounts pubkey `xK_ua = xk_ua * xG`.
    #[zeroize(skip)]
    pub unlockamounts_pubkey: MontgomeryPoint,
    /// Advertised find-received pubkey `xK_fr = xk_fr * xk_ua * xG`.
    #[zeroize(skip)]
    pub findreceived_pubkey: MontgomeryPoint,
}

impl JamtisKeys {
    /// Derive the full hierarchy from a master scalar.
    pub fn derive(k_master: Scalar) -> JamtisKeys {
        let k_view_balance = make_viewbalance_key(&k_master);
        let xk_unlock_amounts = make_unlockamounts_key(&k_view_balance);
        let xk_find_received = make_findreceived_key(&k_view_balance);
        let s_generate_address = make_generateaddress_secret(&k_view_balance);
        let s_cipher_tag = make_ciphertag_secret(&s_generate_address);

        let spend_pubkey = make_seraphis_spendkey(&k_view_balance, &k_master);
        let unlockamounts_pubkey = x25519::scmul_base(&xk_unlock_amounts);
        let findreceived_pubkey = x25519::scmul_key(&xk_find_received, &unlockamounts_pubkey);

        JamtisKeys {
            k_master,
            k_view_balance,
            xk_unlock_amounts,
            xk_find_received,
            s_generate_address,
            s_cipher_tag,
            spend_pubkey,
            unlockamounts_pubkey,
            findreceived_pubkey,
        }
    }

    /// Fresh random wallet (tests and fixtures).
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> JamtisKeys {
        JamtisKeys::derive(random_scalar(rng))
    }
}
