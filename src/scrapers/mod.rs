pub mod amazon;
pub mod http;
pub mod traits;
pub mod types;

pub use http::HttpFetcher;
pub use types::ScrapeSettings;
