pub mod error;
pub mod types;

pub use error::{Result, SaveError};
pub use types::{EntityCategory, MapId, Serial, TypeRef};
