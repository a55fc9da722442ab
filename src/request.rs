//! The user's instruction for one edit run.

use serde::{Deserialize, Serialize};

/// Instruction plus the flags that govern how it is applied.
///
/// Immutable once built. The same request drives every segment of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    instruction: String,
    allow_major_rewrite: bool,
    enhance_instruction: bool,
}

impl EditRequest {
    /// A request that preserves length and uses the instruction verbatim.
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            allow_major_rewrite: false,
            enhance_instruction: false,
        }
    }

    /// Permit the model to shorten, restructure or summarise. Disables the
    /// Safety Gate for this run.
    pub fn allow_major_rewrite(mut self, allow: bool) -> Self {
        self.allow_major_rewrite = allow;
        self
    }

    /// Sharpen the instruction with a separate completion call first.
    pub fn enhance_instruction(mut self, enhance: bool) -> Self {
        self.enhance_instruction = enhance;
        self
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn allows_major_rewrite(&self) -> bool {
        self.allow_major_rewrite
    }

    pub fn wants_enhancement(&self) -> bool {
        self.enhance_instruction
    }

    pub fn is_blank(&self) -> bool {
        self.instruction.trim().is_empty()
    }
}
