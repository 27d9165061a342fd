//! Observation formatting for model consumption
//!
//! Renders an execution observation as a deterministic text block that goes
//! back to the model as part of the next user turn.

use super::session::Observation;

/// Maximum stdout characters surfaced to the model per observation
pub const MAX_STDOUT_CHARS: usize = 2000;
/// Maximum stderr characters surfaced to the model per observation
pub const MAX_STDERR_CHARS: usize = 1000;

/// Render an observation as a text block for the next user turn.
///
/// Surfaces success/failure, truncated stdout/stderr and the iteration
/// counter against the budget. Empty stdout/stderr sections are omitted
/// rather than rendered as errors.
pub fn format_observation(obs: &Observation) -> String {
    let status = if obs.result.success { "ok" } else { "error" };

    let mut out = format!(
        "REPL execution result (iteration {}/{})\nstatus: {}",
        obs.iteration, obs.max_iterations, status
    );

    if !obs.result.stdout.is_empty() {
        out.push_str("\nstdout:\n");
        out.push_str(&truncate(&obs.result.stdout, MAX_STDOUT_CHARS));
    }

    if !obs.result.stderr.is_empty() {
        out.push_str("\nstderr:\n");
        out.push_str(&truncate(&obs.result.stderr, MAX_STDERR_CHARS));
    }

    out
}

/// Truncate on a char boundary, appending a marker with the dropped length
fn truncate(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated {} chars]", &s[..end], s.len() - end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repl::session::ExecutionResult;

    fn obs(success: bool, stdout: &str, stderr: &str) -> Observation {
        Observation {
            result: ExecutionResult {
                success,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
            iteration: 2,
            max_iterations: 10,
            context_length: 1000,
        }
    }

    #[test]
    fn test_success_with_stdout() {
        let text = format_observation(&obs(true, "4\n", ""));
        assert!(text.contains("iteration 2/10"));
        assert!(text.contains("status: ok"));
        assert!(text.contains("stdout:\n4"));
        assert!(!text.contains("stderr"));
    }

    #[test]
    fn test_failure_surfaces_stderr() {
        let text = format_observation(&obs(false, "", "NameError: x"));
        assert!(text.contains("status: error"));
        assert!(text.contains("stderr:\nNameError: x"));
        assert!(!text.contains("stdout"));
    }

    #[test]
    fn test_empty_streams_omitted() {
        let text = format_observation(&obs(true, "", ""));
        assert_eq!(text, "REPL execution result (iteration 2/10)\nstatus: ok");
    }

    #[test]
    fn test_stdout_truncated() {
        let long = "x".repeat(MAX_STDOUT_CHARS + 500);
        let text = format_observation(&obs(true, &long, ""));
        assert!(text.contains("[truncated 500 chars]"));
        assert!(text.len() < long.len());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // 'é' is two bytes; cutting at an odd byte offset must not panic
        let s = "é".repeat(10);
        let out = truncate(&s, 5);
        assert!(out.starts_with("éé"));
        assert!(out.contains("[truncated"));
    }

    #[test]
    fn test_deterministic() {
        let a = format_observation(&obs(true, "hello", "warn"));
        let b = format_observation(&obs(true, "hello", "warn"));
        assert_eq!(a, b);
    }
}
