//! Domain resource services for the basin platform.
//!
//! Services in this crate layer typed entities on the raw byte-oriented
//! [`basin_kv::Store`] contract. The pattern, demonstrated by
//! [`UserService`], is an indexed resource: a primary bucket keyed by a
//! generated fixed-width identifier plus a secondary index bucket mapping a
//! unique human-readable attribute back to that identifier, maintained
//! together inside single write transactions.
//!
//! Services are engine-agnostic: any [`basin_kv::Store`] implementation
//! works, and behavior is identical across engines.

#![deny(clippy::unwrap_used)]

pub mod error;
pub mod id;
pub mod user;

pub use error::{PlatformError, PlatformResult};
pub use id::{Id, IdGenerator, SequentialIdGenerator};
pub use user::{FindOptions, User, UserFilter, UserService, UserUpdate};
