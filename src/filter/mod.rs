//! Request filtering: rate limiting, blocklist and custom rules.

mod blocklist;
mod clock;
mod engine;
mod limiter;
mod rules;
mod types;

pub use blocklist::Blocklist;
pub use clock::{Clock, SystemClock};
pub use engine::FilterEngine;
pub use limiter::{RateLimiter, DEFAULT_WINDOW};
pub use rules::{InMemoryRuleStore, RuleStore};
pub use types::{Decision, Request, Response, Rule};
