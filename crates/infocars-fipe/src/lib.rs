pub mod client;
pub mod error;
pub mod source;
mod types;

pub use client::FipeClient;
pub use error::{ErrorKind, FipeError};
pub use source::CatalogSource;
