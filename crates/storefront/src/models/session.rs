//! Session-related types.
//!
//! Types stored in the session for authentication state. Login and
//! logout live outside this API surface; the payment and cart handlers
//! only ever read the session.

use serde::{Deserialize, Serialize};

use vastra_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
