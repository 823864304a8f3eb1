pub mod model_loaders;
pub mod rate_limit;

pub use model_loaders::*;
pub use rate_limit::{RateLimiter, rate_limit};
