//! Output types returned by an accepted edit run.

use serde::{Deserialize, Serialize};

/// The edited document and everything measured while producing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditOutput {
    /// Segment outputs joined in order with a blank line.
    pub text: String,
    /// Per-segment results, in dispatch order.
    pub segments: Vec<SegmentResult>,
    /// The instruction actually sent, after optional enhancement.
    pub instruction_used: String,
    pub stats: EditStats,
}

/// Result of one completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentResult {
    /// 1-indexed position of the segment.
    pub ordinal: usize,
    pub total: usize,
    pub input_words: usize,
    pub output_words: usize,
    pub text: String,
    pub duration_ms: u64,
}

/// Aggregate statistics for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditStats {
    pub input_words: usize,
    pub output_words: usize,
    pub segment_count: usize,
    /// `output_words * 100 / input_words`, or 100 for an empty input.
    pub retained_percent: u32,
    pub instruction_enhanced: bool,
    pub major_rewrite_allowed: bool,
    pub total_duration_ms: u64,
    pub llm_duration_ms: u64,
}

/// `output * 100 / input` in integer arithmetic, saturating at `u32::MAX`.
pub fn retained_percent(input_words: usize, output_words: usize) -> u32 {
    if input_words == 0 {
        return 100;
    }
    let pct = (output_words as u128 * 100) / input_words as u128;
    u32::try_from(pct).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retained_percent_rounds_down() {
        assert_eq!(retained_percent(1000, 899), 89);
        assert_eq!(retained_percent(1000, 900), 90);
        assert_eq!(retained_percent(3, 2), 66);
        assert_eq!(retained_percent(0, 10), 100);
        assert_eq!(retained_percent(10, 25), 250);
    }
}
