//! Dispatch: one completion request per segment, strictly in order.
//!
//! Requests are never issued concurrently. Order of results therefore
//! matches order of segments by construction, and a failure in segment `k`
//! means segments `k + 1..` are never sent. Completed segments of a failed
//! run are dropped with it.

use crate::config::EditConfig;
use crate::document::word_count;
use crate::error::DocEditError;
use crate::output::SegmentResult;
use crate::pipeline::chunk::Segment;
use crate::pipeline::llm::{ChatMessage, CompletionClient, CompletionOptions};
use crate::pipeline::postprocess::clean_reply;
use crate::prompts::{edit_payload, enhance_payload, DEFAULT_SYSTEM_PROMPT, ENHANCE_SYSTEM_PROMPT};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Separator placed between edited segments when recombining.
pub const SEGMENT_SEPARATOR: &str = "\n\n";

/// Sharpen the wording of `instruction` with a separate completion call.
///
/// Never fails: on an endpoint error or a blank reply the original
/// instruction is returned unchanged.
pub async fn enhance_instruction<C: CompletionClient>(
    client: &C,
    instruction: &str,
    config: &EditConfig,
) -> String {
    let messages = [
        ChatMessage::system(ENHANCE_SYSTEM_PROMPT),
        ChatMessage::user(enhance_payload(instruction)),
    ];
    let options = CompletionOptions::for_enhancement(config);

    match client.complete(&messages, &options).await {
        Ok(reply) => {
            let enhanced = clean_reply(&reply);
            if enhanced.trim().is_empty() {
                warn!("Instruction enhancement returned nothing; using the original");
                instruction.to_string()
            } else {
                debug!("Instruction enhanced: {:?} → {:?}", instruction, enhanced);
                enhanced
            }
        }
        Err(e) => {
            warn!("Instruction enhancement failed ({e}); using the original");
            instruction.to_string()
        }
    }
}

/// Build the message list for one segment.
pub fn build_messages(
    segment: &Segment,
    instruction: &str,
    allow_major_rewrite: bool,
    config: &EditConfig,
) -> Vec<ChatMessage> {
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(edit_payload(
            &segment.text,
            instruction,
            allow_major_rewrite,
            segment.part(),
        )),
    ]
}

/// Send every segment in order and collect the edited text.
///
/// # Errors
/// The first failing segment's error, after which no further segment is sent.
pub async fn dispatch_segments<C: CompletionClient>(
    client: &C,
    segments: &[Segment],
    instruction: &str,
    allow_major_rewrite: bool,
    config: &EditConfig,
) -> Result<Vec<SegmentResult>, DocEditError> {
    let options = CompletionOptions::for_edit(config);
    let mut results = Vec::with_capacity(segments.len());

    for segment in segments {
        let (ordinal, total) = (segment.ordinal, segment.total);
        if let Some(ref cb) = config.progress_callback {
            cb.on_segment_start(ordinal, total);
        }

        let start = Instant::now();
        let messages = build_messages(segment, instruction, allow_major_rewrite, config);
        let reply = match client.complete(&messages, &options).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Segment {}/{} failed: {}", ordinal, total, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_segment_error(ordinal, total, &e.to_string());
                }
                return Err(e);
            }
        };

        let text = clean_reply(&reply);
        let output_words = word_count(&text);
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Segment {}/{}: {} → {} words in {}ms",
            ordinal, total, segment.word_count, output_words, duration_ms
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_segment_complete(ordinal, total, output_words);
        }

        results.push(SegmentResult {
            ordinal,
            total,
            input_words: segment.word_count,
            output_words,
            text,
            duration_ms,
        });
    }

    Ok(results)
}

/// Join segment outputs in order with [`SEGMENT_SEPARATOR`].
pub fn recombine(results: &[SegmentResult]) -> String {
    results
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(SEGMENT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::chunk::split;

    fn result(ordinal: usize, text: &str) -> SegmentResult {
        SegmentResult {
            ordinal,
            total: 2,
            input_words: 1,
            output_words: 1,
            text: text.into(),
            duration_ms: 0,
        }
    }

    #[test]
    fn recombine_preserves_order() {
        let joined = recombine(&[result(1, "first"), result(2, "second")]);
        assert_eq!(joined, "first\n\nsecond");
    }

    #[test]
    fn messages_use_default_prompt() {
        let segs = split("a b c", 10);
        let msgs = build_messages(&segs[0], "Fix", false, &EditConfig::default());
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].content, DEFAULT_SYSTEM_PROMPT);
        assert!(msgs[1].content.contains("a b c"));
        assert!(!msgs[1].content.contains("PART:"));
    }

    #[test]
    fn messages_honour_custom_prompt_and_parts() {
        let config = EditConfig::builder()
            .system_prompt("Be brief.")
            .build()
            .unwrap();
        let segs = split("a b c", 2);
        let msgs = build_messages(&segs[1], "Fix", false, &config);
        assert_eq!(msgs[0].content, "Be brief.");
        assert!(msgs[1].content.contains("PART: 2 of 2"));
    }
}
