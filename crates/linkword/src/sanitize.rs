//! User-text sanitization.

use derive_getters::Getters;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Cleans free text supplied by players and puzzle authors.
pub trait Sanitizer: Send + Sync {
    /// Returns the cleaned form of `input`.
    fn sanitize(&self, input: &str) -> String;
}

/// Strips markup, normalizes whitespace and masks banned words.
#[derive(Debug, Clone, Default, Getters)]
pub struct TextSanitizer {
    /// Lowercased words to mask.
    banned_words: HashSet<String>,
}

impl TextSanitizer {
    /// Creates a sanitizer masking `banned_words`, matched case-insensitively.
    pub fn new<I, S>(banned_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            banned_words: banned_words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    fn strip_tags(input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut in_tag = false;
        for c in input.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => {
                    in_tag = false;
                    out.push(' ');
                }
                _ if !in_tag => out.push(c),
                _ => {}
            }
        }
        out
    }

    fn mask(&self, word: &str) -> String {
        let core = word.trim_matches(|c: char| !c.is_alphanumeric());
        if core.is_empty() || !self.banned_words.contains(&core.to_lowercase()) {
            return word.to_string();
        }
        let masked = "*".repeat(core.chars().count());
        word.replacen(core, &masked, 1)
    }
}

impl Sanitizer for TextSanitizer {
    #[instrument(skip(self, input), fields(len = input.len()))]
    fn sanitize(&self, input: &str) -> String {
        let stripped = Self::strip_tags(input);
        let cleaned = stripped
            .split_whitespace()
            .map(|word| self.mask(word))
            .collect::<Vec<_>>()
            .join(" ");
        if cleaned != input {
            debug!("Text altered by sanitizer");
        }
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_collapses_whitespace() {
        let sanitizer = TextSanitizer::default();
        assert_eq!(
            sanitizer.sanitize("  <b>Greek</b>   <i>gods</i>\n"),
            "Greek gods"
        );
        assert_eq!(sanitizer.sanitize("<script>alert(1)</script>"), "alert(1)");
    }

    #[test]
    fn test_masks_whole_banned_words_only() {
        let sanitizer = TextSanitizer::new(["darn"]);
        assert_eq!(sanitizer.sanitize("Darn it, darn!"), "**** it, ****!");
        assert_eq!(sanitizer.sanitize("darned"), "darned");
    }

    #[test]
    fn test_blank_banned_words_ignored() {
        let sanitizer = TextSanitizer::new(["", "  "]);
        assert!(sanitizer.banned_words().is_empty());
        assert_eq!(sanitizer.sanitize("plain"), "plain");
    }
}
