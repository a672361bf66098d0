//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vastra_core::{Email, UserId};

/// A storefront buyer account.
///
/// During asynchronous payment reconciliation a user may be resolved by
/// exact email match when no payment-intent binding exists; email is
/// unique at the storage layer.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name (also the buyer first-name source for gateway forms).
    pub name: String,
    /// User's email address.
    pub email: Email,
    /// Contact phone, if provided.
    pub phone: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}
