//! Client-side admission control: sliding-window rate limits and login lockouts.

pub mod lockout;
pub mod rate;

pub use lockout::{LockoutGuard, LockoutRecord};
pub use rate::RateLimiter;
