//! The backend-agnostic store contract.

mod error;
mod traits;

pub use error::{KvError, KvResult};
pub use traits::{Cursor, Store, Tx};
