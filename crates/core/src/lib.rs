//! Domain rules for the Grow facility subsystem.
//!
//! Everything in this crate is pure: enums, state machines, validation and
//! read-side aggregation. Persistence (and the atomicity of check-then-write
//! sequences) lives in `canopy-db`; HTTP lives in `canopy-api`.

#[macro_use]
mod text_enum;

pub mod audit;
pub mod batch;
pub mod error;
pub mod hashing;
pub mod harvest;
pub mod metrc;
pub mod observation;
pub mod pagination;
pub mod plant;
pub mod roles;
pub mod spatial;
pub mod types;
pub mod uid;
