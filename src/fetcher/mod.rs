pub mod client;
pub mod errors;

pub use client::{FetchedPage, fetch_page, get_client};
pub use errors::FetchError;
