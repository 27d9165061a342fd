//! Code extraction from model responses
//!
//! The model is instructed to put runnable code in fenced blocks tagged
//! `repl`. Everything else in the response is prose and is ignored.

/// Opening fence line for a runnable code block
const FENCE_OPEN: &str = "```repl";
/// Closing fence line
const FENCE_CLOSE: &str = "```";

/// Extract all ` ```repl ` fenced code blocks from a response, in order.
///
/// Policy: a block counts only if its opening fence has a matching closing
/// fence. An unterminated fence at the end of the response yields nothing
/// (no partial extraction). Zero blocks is a normal outcome - the model may
/// answer with prose only.
pub fn extract_code_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in text.lines() {
        match current.as_mut() {
            None => {
                if line.trim() == FENCE_OPEN {
                    current = Some(Vec::new());
                }
            }
            Some(buf) => {
                if line.trim() == FENCE_CLOSE {
                    blocks.push(buf.join("\n"));
                    current = None;
                } else {
                    buf.push(line);
                }
            }
        }
    }

    // A dangling open fence in `current` is dropped here.
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_block() {
        let text = "Let me check.\n```repl\nprint(2 + 2)\n```\nDone.";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks, vec!["print(2 + 2)"]);
    }

    #[test]
    fn test_multiple_blocks_preserve_order() {
        let text = "```repl\nfirst\n```\nprose\n```repl\nsecond\nline\n```";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks, vec!["first", "second\nline"]);
    }

    #[test]
    fn test_prose_only_yields_nothing() {
        let blocks = extract_code_blocks("I think the answer is 4.");
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_unterminated_fence_is_dropped() {
        let text = "```repl\nprint('never closed')";
        assert!(extract_code_blocks(text).is_empty());

        // A closed block followed by an unterminated one keeps only the first
        let text = "```repl\nok\n```\n```repl\ndangling";
        assert_eq!(extract_code_blocks(text), vec!["ok"]);
    }

    #[test]
    fn test_other_languages_ignored() {
        let text = "```python\nprint('no')\n```\n```repl\nprint('yes')\n```";
        assert_eq!(extract_code_blocks(text), vec!["print('yes')"]);
    }

    #[test]
    fn test_indented_fences_accepted() {
        let text = "  ```repl\n  x = 1\n  ```";
        assert_eq!(extract_code_blocks(text), vec!["  x = 1"]);
    }

    #[test]
    fn test_empty_block() {
        let text = "```repl\n```";
        assert_eq!(extract_code_blocks(text), vec![""]);
    }
}
