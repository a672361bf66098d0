//! Address domain types.

use serde::{Deserialize, Serialize};

use vastra_core::{AddressId, UserId};

/// A user's stored shipping address.
#[derive(Debug, Clone)]
pub struct Address {
    /// Unique address ID.
    pub id: AddressId,
    /// Owning user.
    pub user_id: UserId,
    /// Recipient full name.
    pub full_name: String,
    /// Recipient mobile number.
    pub mobile_number: String,
    /// Postal code.
    pub pincode: String,
    /// Locality / neighbourhood.
    pub locality: String,
    /// Street address.
    pub address_line: String,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
    /// Nearby landmark, if given.
    pub landmark: Option<String>,
    /// Alternate contact number, if given.
    pub alternate_phone: Option<String>,
    /// Address label (home/work).
    pub address_type: String,
}

/// Shipping address copied by value onto an order at creation time.
///
/// A snapshot, not a reference: the source address may change or be
/// deleted later without affecting already-placed orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddressSnapshot {
    pub full_name: String,
    pub mobile_number: String,
    pub pincode: String,
    pub locality: String,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub landmark: Option<String>,
    pub alternate_phone: Option<String>,
    pub address_type: String,
}

impl From<&Address> for AddressSnapshot {
    fn from(addr: &Address) -> Self {
        Self {
            full_name: addr.full_name.clone(),
            mobile_number: addr.mobile_number.clone(),
            pincode: addr.pincode.clone(),
            locality: addr.locality.clone(),
            address_line: addr.address_line.clone(),
            city: addr.city.clone(),
            state: addr.state.clone(),
            landmark: addr.landmark.clone(),
            alternate_phone: addr.alternate_phone.clone(),
            address_type: addr.address_type.clone(),
        }
    }
}
