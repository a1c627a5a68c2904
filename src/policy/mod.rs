//! Access policy: configuration compilation, the rule chain, and the engine.
//!
//! # Evaluation Order
//!
//! ```text
//! 1. Permissive mode      → allow (optionally strip credential headers)
//! 2. User-Agent allowlist → allow, strip credential headers
//! 3. Header token         → allow (optionally strip that header)
//! 4. Bearer token         → allow (optionally strip that header)
//! 5. IP allowlist         → allow, strip credential headers
//! 6. User-Agent denylist  → 403 "... User-Agent is blacklisted"
//! 7. Default              → 403 with a hint naming the enabled methods
//! ```
//!
//! The first rule that decides wins. Token and allowlist matches beat the
//! User-Agent denylist.

pub mod allowlist;
pub mod compiled;
pub mod engine;
pub mod request;
pub mod response;
pub mod rules;
pub mod tokens;
pub mod user_agent;

pub use allowlist::{CidrRange, IpAllowlist};
pub use compiled::Policy;
pub use engine::{AccessDecisionEngine, Verdict};
pub use request::RequestInfo;
pub use response::{DenialResponse, format_timestamp};
pub use rules::{Outcome, Rule};
pub use tokens::{BearerExtractor, TokenSet};
pub use user_agent::PatternList;
