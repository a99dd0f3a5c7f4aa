#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Core of the bark service: schedules, dogs and the registry that keeps a
//! dog's stored record and its externally scheduled task in step.

pub mod api;
pub mod error;
pub mod memory;
pub mod model;
pub mod registry;
pub mod schedule;
pub mod store;
pub mod validation;

mod util;

pub use error::{BoxError, Error, Result};
pub use util::{new_id, new_ulid, now};
