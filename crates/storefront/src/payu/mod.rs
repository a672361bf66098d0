//! PayU gateway integration.
//!
//! The storefront never calls PayU directly: the browser submits the
//! signed form to the gateway, and the gateway later POSTs a
//! server-to-server callback. Everything this module owns is local -
//! building transaction ids and computing/verifying the keyed digest.

pub mod hash;

use rand::Rng;

/// Fixed product label signed into every digest.
///
/// PayU echoes `productinfo` back in the callback and it participates in
/// both hash sequences, so initiation and verification must agree on it.
pub const PRODUCT_INFO: &str = "Order";

/// Gateway status value for a successful payment.
pub const STATUS_SUCCESS: &str = "success";

/// Generate a fresh transaction id: `txn` + epoch millis + 3 random digits.
///
/// Unique with extremely high probability; the primary key on
/// `payment_intents` backstops the generator, and the id stays digits-only
/// so it round-trips through gateway forms untouched.
#[must_use]
pub fn new_txn_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u16 = rand::rng().random_range(0..1000);
    format!("txn{millis}{suffix:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_txn_id_shape() {
        let id = new_txn_id();
        assert!(id.starts_with("txn"));
        let digits = id.trim_start_matches("txn");
        assert!(!digits.is_empty());
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_new_txn_id_distinct() {
        // Millisecond clock plus the random suffix makes collisions in a
        // tight loop vanishingly unlikely
        let a = new_txn_id();
        let b = new_txn_id();
        let c = new_txn_id();
        assert!(a != b || b != c);
    }
}
