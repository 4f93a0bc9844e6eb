//! Data models for the lectern backend.
//!
//! Wire names are snake_case; internal columns such as `created_at` and
//! `password_hash` are never serialized.

mod course;
mod instructor;
mod token;
mod user;

pub use course::*;
pub use instructor::*;
pub use token::*;
pub use user::*;
