//! Compiled User-Agent pattern lists.

use regex::Regex;

use crate::error::{GateError, GateResult};

/// Ordered list of compiled User-Agent patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<Regex>,
}

impl PatternList {
    /// Compile every pattern.
    ///
    /// # Errors
    ///
    /// Returns `GateError::InvalidPattern` for the first pattern that fails.
    pub fn compile(patterns: &[String]) -> GateResult<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| GateError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<GateResult<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// True if any pattern matches somewhere in `user_agent`.
    pub fn matches(&self, user_agent: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(user_agent))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
