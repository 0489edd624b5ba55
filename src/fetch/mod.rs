mod cache;
mod clock;
#[cfg(feature = "dev")]
pub mod debug;
mod dedup;
mod transport;


pub use cache::{CacheEntry, ResponseCache, DEFAULT_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dedup::DedupFetcher;
pub use transport::{
    cache_key, FetchOptions, FetchRequest, HttpTransport, Method, ReqwestTransport,
};
