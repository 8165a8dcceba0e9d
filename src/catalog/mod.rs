pub mod config;
pub mod error;
pub mod export;
pub mod io;
pub mod layout;
pub mod model;
pub mod naming;

pub use error::{CatalogError, Result};
