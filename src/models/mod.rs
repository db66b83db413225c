//! Data models for the check-in backend.
//!
//! Documents keep the camelCase field names the scanner and dashboard already read.

mod candidate;
mod checkin;
mod entity;
mod roster;
mod team;

pub use candidate::*;
pub use checkin::*;
pub use entity::*;
pub use roster::*;
pub use team::*;
