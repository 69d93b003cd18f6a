pub mod client;
pub mod feed;
pub mod index;
pub mod info_table;
pub mod types;
mod xml;

pub use client::{EdgarClient, FilingSource};
pub use types::{Cik, FilingRef};
