//! Success/failure classification of console output
//!
//! The server console has no structured replies, so a command's outcome is
//! judged from the text it prints. Failure markers win over success markers,
//! and text matching neither is indeterminate, which callers treat as failure.

use once_cell::sync::Lazy;
use regex::Regex;

/// `[HH:MM:SS] [thread/LEVEL]: message`
static LOG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\d{2}:\d{2}:\d{2})\]\s+\[([^\]/]+)/(INFO|WARN|ERROR)\]:\s*(.*)").unwrap()
});

const FAILURE_MARKERS: &[&str] = &[
    "Error:",
    "failed",
    "Could not ",
    "Unknown command",
    "Usage:",
    "position is not loaded",
    "Expected ",
    "Not a valid ",
    "No entity was found",
    "no elements",
    "No game rule",
    "is not valid",
];

const SUCCESS_MARKERS: &[&str] = &[
    "Successfully",
    "blocks filled",
    "blocks changed",
    "blocks copied",
    "summoned",
    "Given ",
    "Teleported ",
    "players match",
    "entity was found",
    "Setting ",
];

/// Outcome judged from response text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Succeeded,
    Failed,
    Indeterminate,
}

impl Verdict {
    /// Only positive evidence counts as success
    pub fn is_success(self) -> bool {
        matches!(self, Verdict::Succeeded)
    }
}

/// Policy deciding what a command's output means
pub trait ResponseClassifier: Send + Sync {
    /// Judge the joined response text
    fn classify(&self, text: &str) -> Verdict;

    /// Human-readable message carried by the response, or empty
    fn extract_message(&self, text: &str) -> String;

    /// Whether a single line settles the outcome of a command
    fn is_conclusive(&self, line: &str) -> bool;
}

/// Ordered substring markers plus a log-line pattern
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    failure_markers: Vec<String>,
    success_markers: Vec<String>,
    log_line: Regex,
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self {
            failure_markers: FAILURE_MARKERS.iter().map(|m| m.to_string()).collect(),
            success_markers: SUCCESS_MARKERS.iter().map(|m| m.to_string()).collect(),
            log_line: LOG_LINE.clone(),
        }
    }
}

impl MarkerClassifier {
    /// Classifier with the vanilla server vocabulary
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a failure marker, checked after the existing ones
    pub fn with_failure_marker(mut self, marker: impl Into<String>) -> Self {
        self.failure_markers.push(marker.into());
        self
    }

    /// Add a success marker, checked after the existing ones
    pub fn with_success_marker(mut self, marker: impl Into<String>) -> Self {
        self.success_markers.push(marker.into());
        self
    }

    /// Replace the log-line pattern. The last capture group is the message.
    pub fn with_log_line(mut self, pattern: Regex) -> Self {
        self.log_line = pattern;
        self
    }

    fn message_of(&self, line: &str) -> Option<String> {
        let caps = self.log_line.captures(line)?;
        let message = caps.get(caps.len() - 1)?;
        Some(message.as_str().trim_end().to_string())
    }
}

impl ResponseClassifier for MarkerClassifier {
    fn classify(&self, text: &str) -> Verdict {
        if self.failure_markers.iter().any(|m| text.contains(m.as_str())) {
            return Verdict::Failed;
        }
        if self.success_markers.iter().any(|m| text.contains(m.as_str())) {
            return Verdict::Succeeded;
        }
        Verdict::Indeterminate
    }

    fn extract_message(&self, text: &str) -> String {
        // Prefer the line that carries the verdict over unrelated chatter
        let verdict_line = text
            .lines()
            .filter(|line| self.classify(line) != Verdict::Indeterminate)
            .find_map(|line| self.message_of(line));

        verdict_line
            .or_else(|| text.lines().find_map(|line| self.message_of(line)))
            .unwrap_or_default()
    }

    fn is_conclusive(&self, line: &str) -> bool {
        self.log_line.is_match(line) && self.classify(line) != Verdict::Indeterminate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_wins_over_success() {
        let c = MarkerClassifier::new();
        let verdict = c.classify("[12:00:00] [Server thread/INFO]: Could not set block, failed");
        assert_eq!(verdict, Verdict::Failed);

        let verdict = c.classify("Successfully did a thing\nError: but then not");
        assert_eq!(verdict, Verdict::Failed);
    }

    #[test]
    fn test_indeterminate_is_not_success() {
        let c = MarkerClassifier::new();
        let verdict = c.classify("[12:00:00] [Server thread/INFO]: something happened");
        assert_eq!(verdict, Verdict::Indeterminate);
        assert!(!verdict.is_success());
    }

    #[test]
    fn test_success_markers() {
        let c = MarkerClassifier::new();
        for line in [
            "[00:00:01] [Server thread/INFO]: 8 blocks filled",
            "[00:00:01] [Server thread/INFO]: Teleported Steve to 1.0, 2.0, 3.0",
            "[00:00:01] [Server thread/INFO]: Given [Diamond Sword] to Steve",
            "[00:00:01] [Server thread/INFO]: Successfully filled 3 blocks",
        ] {
            assert_eq!(c.classify(line), Verdict::Succeeded, "{line}");
        }
    }

    #[test]
    fn test_extract_message() {
        let c = MarkerClassifier::new();
        assert_eq!(
            c.extract_message("[10:01:02] [Server thread/INFO]: Filled 40 blocks"),
            "Filled 40 blocks"
        );
        assert_eq!(
            c.extract_message("[10:01:02] [Server thread/WARN]: Can't keep up!  "),
            "Can't keep up!"
        );
        assert_eq!(c.extract_message("no timestamp here"), "");
    }

    #[test]
    fn test_extract_prefers_verdict_line() {
        let c = MarkerClassifier::new();
        let text = "[00:00:00] [Server thread/INFO]: Steve joined the game\n\
                    [00:00:01] [Server thread/INFO]: 8 blocks filled";
        assert_eq!(c.extract_message(text), "8 blocks filled");
    }

    #[test]
    fn test_is_conclusive() {
        let c = MarkerClassifier::new();
        assert!(c.is_conclusive("[00:00:01] [Server thread/INFO]: 8 blocks filled"));
        assert!(c.is_conclusive("[00:00:01] [Server thread/INFO]: Unknown command"));
        assert!(!c.is_conclusive("[00:00:01] [Server thread/INFO]: Steve joined the game"));
        // Markers outside a log line do not settle anything
        assert!(!c.is_conclusive("8 blocks filled"));
    }

    #[test]
    fn test_custom_markers() {
        let c = MarkerClassifier::new()
            .with_success_marker("Done (")
            .with_failure_marker("Can't keep up");
        assert_eq!(
            c.classify("[00:00:01] [Server thread/INFO]: Done (3.2s)!"),
            Verdict::Succeeded
        );
        assert_eq!(
            c.classify("[00:00:01] [Server thread/WARN]: Can't keep up!"),
            Verdict::Failed
        );
    }

    #[test]
    fn test_custom_log_line() {
        // Paper style: level inside the timestamp bracket
        let pattern = Regex::new(r"^\[(\d{2}:\d{2}:\d{2}) (INFO|WARN|ERROR)\]:\s*(.*)").unwrap();
        let c = MarkerClassifier::new().with_log_line(pattern);

        let line = "[10:01:02 INFO]: Filled 40 blocks";
        assert_eq!(c.extract_message(line), "Filled 40 blocks");
        assert!(c.is_conclusive("[10:01:02 INFO]: Unknown command"));
        assert!(!c.is_conclusive("[10:01:02] [Server thread/INFO]: Unknown command"));
        assert!(!MarkerClassifier::new().is_conclusive(line));
    }
}
