//! Product page collaborator: fetches detail pages and reads them into the
//! shape the text extractor consumes.

pub mod client;
pub mod error;
pub mod page;
mod rate_limit;

pub use client::PageClient;
pub use error::ScraperError;
pub use page::read_page;
