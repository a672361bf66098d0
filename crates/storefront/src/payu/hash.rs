//! PayU digest construction and verification.
//!
//! Both digests are SHA-512 over a pipe-delimited field sequence ending in
//! the merchant salt. The sequence carries a run of exactly 11 pipes
//! between the last meaningful field and the salt (the five `udf` fields
//! plus the reserved slots of the PayU v1 sequence). The run is part of
//! the wire contract: one pipe off and a legitimate callback never
//! verifies.
//!
//! Callers pass the exact strings that go into the sequence - values are
//! not trimmed or normalized here.

use sha2::{Digest, Sha512};

/// The fixed pipe run between the last meaningful field and the salt.
const PIPE_RUN: &str = "|||||||||||";

/// Compute the initiation digest:
/// `key|txnid|amount|productinfo|firstname|email|||||||||||salt`.
#[must_use]
pub fn initiation_hash(
    key: &str,
    txn_id: &str,
    amount: &str,
    product_info: &str,
    first_name: &str,
    email: &str,
    salt: &str,
) -> String {
    let payload =
        format!("{key}|{txn_id}|{amount}|{product_info}|{first_name}|{email}{PIPE_RUN}{salt}");
    sha512_hex(&payload)
}

/// Compute the expected callback digest:
/// `key|txnid|amount|productinfo|firstname|email|status|||||||||||salt`.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn callback_hash(
    key: &str,
    txn_id: &str,
    amount: &str,
    product_info: &str,
    first_name: &str,
    email: &str,
    status: &str,
    salt: &str,
) -> String {
    let payload = format!(
        "{key}|{txn_id}|{amount}|{product_info}|{first_name}|{email}|{status}{PIPE_RUN}{salt}"
    );
    sha512_hex(&payload)
}

/// Verify a supplied callback digest against the recomputed one.
///
/// Comparison is constant-time so the verifier leaks nothing about how
/// many leading characters matched.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn verify_callback(
    key: &str,
    txn_id: &str,
    amount: &str,
    product_info: &str,
    first_name: &str,
    email: &str,
    status: &str,
    salt: &str,
    supplied: &str,
) -> bool {
    let expected = callback_hash(
        key,
        txn_id,
        amount,
        product_info,
        first_name,
        email,
        status,
        salt,
    );
    constant_time_eq(expected.as_bytes(), supplied.as_bytes())
}

fn sha512_hex(payload: &str) -> String {
    hex::encode(Sha512::digest(payload.as_bytes()))
}

/// Byte-wise constant-time equality. Length mismatch returns early - the
/// digest length is public.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "gtKFFx";
    const SALT: &str = "salt123abc";
    const TXN: &str = "txn1700000000000042";

    #[test]
    fn test_initiation_hash_known_vector() {
        let hash = initiation_hash(
            KEY,
            TXN,
            "1500",
            "Order",
            "Asha Rao",
            "asha@example.com",
            SALT,
        );
        assert_eq!(
            hash,
            "56aded3b72435e2fef0540cc14008f43ea45b10f67e22571eb7cd808f0be2326\
             8c22445a93740ba1c44f3f67d4267a4cbc96e733bca99b90657e21bf3395baac"
        );
    }

    #[test]
    fn test_callback_hash_known_vector() {
        let hash = callback_hash(
            KEY,
            TXN,
            "1500",
            "Order",
            "Asha Rao",
            "asha@example.com",
            "success",
            SALT,
        );
        assert_eq!(
            hash,
            "58374beead206cb892d16aa7db6ece5c0e009e84b3176a988120198fbaeff2a8\
             5bc00fc7efb4276926d6694618c0004eca5c0103a2580f1688538adea49ce38a"
        );
    }

    #[test]
    fn test_digest_is_128_lowercase_hex() {
        let hash = initiation_hash(
            KEY,
            TXN,
            "1500",
            "Order",
            "Asha Rao",
            "asha@example.com",
            SALT,
        );
        assert_eq!(hash.len(), 128);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_verify_accepts_recomputed_digest() {
        let supplied = callback_hash(
            KEY,
            TXN,
            "1500",
            "Order",
            "Asha Rao",
            "asha@example.com",
            "success",
            SALT,
        );
        assert!(verify_callback(
            KEY,
            TXN,
            "1500",
            "Order",
            "Asha Rao",
            "asha@example.com",
            "success",
            SALT,
            &supplied,
        ));
    }

    #[test]
    fn test_verify_rejects_tampered_fields() {
        let supplied = callback_hash(
            KEY,
            TXN,
            "1500",
            "Order",
            "Asha Rao",
            "asha@example.com",
            "success",
            SALT,
        );

        // Amount changed after signing
        assert!(!verify_callback(
            KEY,
            TXN,
            "1",
            "Order",
            "Asha Rao",
            "asha@example.com",
            "success",
            SALT,
            &supplied,
        ));

        // Status flipped
        assert!(!verify_callback(
            KEY,
            TXN,
            "1500",
            "Order",
            "Asha Rao",
            "asha@example.com",
            "failure",
            SALT,
            &supplied,
        ));

        // Email swapped
        assert!(!verify_callback(
            KEY,
            TXN,
            "1500",
            "Order",
            "Asha Rao",
            "mallory@example.com",
            "success",
            SALT,
            &supplied,
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_length() {
        assert!(!verify_callback(
            KEY,
            TXN,
            "1500",
            "Order",
            "Asha Rao",
            "asha@example.com",
            "success",
            SALT,
            "deadbeef",
        ));
    }

    #[test]
    fn test_initiation_and_callback_digests_differ() {
        // The status field changes the sequence, so the two shapes can
        // never collide for the same transaction
        let init = initiation_hash(
            KEY,
            TXN,
            "1500",
            "Order",
            "Asha Rao",
            "asha@example.com",
            SALT,
        );
        let cb = callback_hash(
            KEY,
            TXN,
            "1500",
            "Order",
            "Asha Rao",
            "asha@example.com",
            "success",
            SALT,
        );
        assert_ne!(init, cb);
    }

    #[test]
    fn test_salt_changes_digest() {
        let a = initiation_hash(
            KEY,
            TXN,
            "1500",
            "Order",
            "Asha Rao",
            "asha@example.com",
            SALT,
        );
        let b = initiation_hash(
            KEY,
            TXN,
            "1500",
            "Order",
            "Asha Rao",
            "asha@example.com",
            "othersalt",
        );
        assert_ne!(a, b);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(constant_time_eq(b"", b""));
    }
}
