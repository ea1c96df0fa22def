/// ChatML end-of-turn marker; generation stops there.
pub const END_OF_TURN: &str = "<|im_end|>";

/// Wrap `post` in a ChatML conversation ending on the assistant turn.
pub fn format_prompt(system: &str, post: &str) -> String {
    format!(
        "<|im_start|>system\n{system}{END_OF_TURN}\n\
         <|im_start|>user\n{post}{END_OF_TURN}\n\
         <|im_start|>assistant\n"
    )
}

/// The usable part of a completion, or `None` when it is too thin to keep.
pub fn postprocess(raw: &str, min_chars: usize, min_sentences: usize) -> Option<String> {
    let text = raw.split(END_OF_TURN).next().unwrap_or_default().trim();
    if text.chars().count() < min_chars || text.matches('.').count() < min_sentences {
        return None;
    }
    Some(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_prompt_layout() {
        let prompt = format_prompt("be brief", "the post");
        assert_eq!(
            prompt,
            "<|im_start|>system\nbe brief<|im_end|>\n<|im_start|>user\nthe post<|im_end|>\n<|im_start|>assistant\n"
        );
    }

    #[test]
    fn test_postprocess_cuts_at_end_marker() {
        let raw = format!("  {}<|im_end|>garbage after", "문장입니다. ".repeat(60));
        let text = postprocess(&raw, 300, 5).unwrap();
        assert!(!text.contains("garbage"));
        assert!(text.ends_with('.'));
    }

    #[test]
    fn test_postprocess_rejects_short_text() {
        assert_eq!(postprocess("너무 짧다. 정말. 짧다. 응. 끝.", 300, 5), None);
    }

    #[test]
    fn test_postprocess_rejects_few_sentences() {
        let raw = "가".repeat(400) + ". 끝.";
        assert_eq!(postprocess(&raw, 300, 5), None);
    }
}
