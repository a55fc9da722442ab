//! Prompts for the edit and instruction-enhancement calls.
//!
//! Every string sent to the model is built here so prompt changes never
//! touch dispatch or error-handling code, and so tests can inspect the exact
//! payloads without a live endpoint.
//!
//! Callers can override the edit prompt via
//! [`crate::config::EditConfig::system_prompt`].

/// Default system prompt for editing a document segment.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a careful copy editor. You apply the user's instruction to their document and return the edited document.

Follow these rules precisely:

1. VOICE
   - Preserve the author's voice, tone, vocabulary and point of view
   - Change only what the instruction asks you to change

2. LENGTH AND ORDER
   - Do NOT summarise, shorten, condense or omit any content
   - Do NOT reorder sentences, paragraphs or sections
   - Keep the length of the edited text close to the original
   - These rules apply unless the request says MAJOR REWRITE ALLOWED: yes

3. STRUCTURE
   - Keep paragraph breaks, headings and list markers where they are
   - Do not add headings, titles or sign-offs that are not in the original

4. OUTPUT FORMAT
   - Output ONLY the edited text
   - Do NOT add commentary, explanations, notes or a summary of changes
   - Do NOT wrap the output in code fences or quotes"#;

/// System prompt for the optional instruction-enhancement call.
pub const ENHANCE_SYSTEM_PROMPT: &str = r#"You rewrite editing instructions so a copy editor can follow them without guessing.

Rules:
- Keep the user's intent exactly; do not add new goals or drop any
- Make vague wording concrete and resolve ambiguity conservatively
- Do not mention length changes unless the user did
- Output ONLY the rewritten instruction, with no preamble or quotes"#;

/// Build the user message for one segment.
///
/// `part` is `Some((ordinal, total))` when the document was split into more
/// than one segment; the model is then told which part it is editing so it
/// treats truncated openings and endings as continuations.
pub fn edit_payload(
    segment_text: &str,
    instruction: &str,
    allow_major_rewrite: bool,
    part: Option<(usize, usize)>,
) -> String {
    let mut payload = String::with_capacity(segment_text.len() + instruction.len() + 256);

    payload.push_str("INSTRUCTION:\n");
    payload.push_str(instruction.trim());
    payload.push_str("\n\nMAJOR REWRITE ALLOWED: ");
    payload.push_str(if allow_major_rewrite { "yes" } else { "no" });
    payload.push('\n');

    if let Some((ordinal, total)) = part {
        payload.push_str(&segment_context(ordinal, total));
        payload.push('\n');
    }

    payload.push_str("\nDOCUMENT:\n\"\"\"\n");
    payload.push_str(segment_text);
    payload.push_str("\n\"\"\"");
    payload
}

/// Continuity note for a segment of a split document.
pub fn segment_context(ordinal: usize, total: usize) -> String {
    format!(
        "PART: {ordinal} of {total}. This is one consecutive part of a longer document. \
         It may begin or end mid-sentence; edit it as a continuation and do not \
         add an introduction or conclusion."
    )
}

/// Build the user message for the instruction-enhancement call.
pub fn enhance_payload(instruction: &str) -> String {
    format!("Rewrite this editing instruction:\n\n\"\"\"{}\"\"\"", instruction.trim())
}
