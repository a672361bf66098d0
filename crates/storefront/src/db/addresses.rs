//! Address repository for database operations.

use sqlx::PgPool;

use vastra_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::Address;

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    full_name: String,
    mobile_number: String,
    pincode: String,
    locality: String,
    address_line: String,
    city: String,
    state: String,
    landmark: Option<String>,
    alternate_phone: Option<String>,
    address_type: String,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            full_name: row.full_name,
            mobile_number: row.mobile_number,
            pincode: row.pincode,
            locality: row.locality,
            address_line: row.address_line,
            city: row.city,
            state: row.state,
            landmark: row.landmark,
            alternate_phone: row.alternate_phone,
            address_type: row.address_type,
        }
    }
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's current address (latest row wins), if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_current_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, full_name, mobile_number, pincode, locality,
                   address_line, city, state, landmark, alternate_phone, address_type
            FROM addresses
            WHERE user_id = $1
            ORDER BY id DESC
            LIMIT 1
            ",
        )
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Address::from))
    }
}
