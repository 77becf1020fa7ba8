//! Domain entities - Requests, payloads and parsed results

mod cache_entry;
mod fetch_result;
mod payload;
mod request_descriptor;
mod response;
mod search_result;

pub use cache_entry::CacheEntry;
pub use fetch_result::FetchResult;
pub use payload::ResponsePayload;
pub use request_descriptor::{RequestDescriptor, RequestDescriptorBuilder};
pub use response::EutilsResponse;
pub use search_result::{SearchResult, Translation};
