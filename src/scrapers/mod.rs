pub mod browser;
pub mod extract;
pub mod http;
pub mod normalize;
pub mod page;
pub mod traits;
pub mod types;

pub use browser::BrowserFetcher;
pub use http::HttpFetcher;
pub use traits::PageFetcher;
pub use types::{build_stay_queries, StayQuery};
