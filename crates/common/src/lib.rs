//! Common types shared by the gdata token crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
