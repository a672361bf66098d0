//! Domain models for storefront.
//!
//! These types represent validated domain objects separate from database
//! row types. Repositories in [`crate::db`] map rows into them.

pub mod address;
pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use address::{Address, AddressSnapshot};
pub use cart::{Cart, CartItem};
pub use order::{Order, OrderItem};
pub use product::Product;
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
