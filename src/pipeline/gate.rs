//! Safety Gate: the length-preservation check on recombined output.
//!
//! The gate runs exactly once per run, on the full recombined text. A short
//! segment cannot trigger a rejection on its own, and a well-behaved
//! segment cannot mask shortening elsewhere. It is the only place the
//! length policy is enforced.

use crate::error::DocEditError;
use tracing::{debug, warn};

/// Length-preservation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyGate {
    /// Minimum retained share of the input word count, in percent.
    pub min_retained_percent: u32,
}

impl Default for SafetyGate {
    fn default() -> Self {
        Self {
            min_retained_percent: 90,
        }
    }
}

impl SafetyGate {
    pub fn new(min_retained_percent: u32) -> Self {
        Self {
            min_retained_percent,
        }
    }

    /// Accept or reject a recombined result.
    ///
    /// Rejects when `allow_major_rewrite` is false and
    /// `output_words < min_retained_percent% of input_words`. The comparison
    /// is done in integers so the boundary is exact: with 90% and 1000 input
    /// words, 900 passes and 899 fails.
    pub fn check(
        &self,
        input_words: usize,
        output_words: usize,
        allow_major_rewrite: bool,
    ) -> Result<(), DocEditError> {
        if allow_major_rewrite {
            debug!(input_words, output_words, "Safety gate bypassed (major rewrite allowed)");
            return Ok(());
        }

        let floor = input_words as u128 * u128::from(self.min_retained_percent);
        if (output_words as u128) * 100 < floor {
            warn!(
                input_words,
                output_words,
                min_percent = self.min_retained_percent,
                "Safety gate rejected edit"
            );
            return Err(DocEditError::ExcessiveShortening {
                input_words,
                output_words,
                min_percent: self.min_retained_percent,
            });
        }

        debug!(input_words, output_words, "Safety gate accepted edit");
        Ok(())
    }
}
