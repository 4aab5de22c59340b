use serde::Deserialize;

pub const WORDS_PER_MINUTE: usize = 180;

/// Tokens that come from page-level script snippets rather than prose.
/// Matched against whole whitespace-separated tokens only.
pub const DENYLIST: [&str; 6] = ["\n", "export", "const", "prerender", "=", "script"];

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReadingConfig {
    pub words_per_minute: usize,
    pub denylist: Vec<String>,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: WORDS_PER_MINUTE,
            denylist: DENYLIST.iter().map(|word| word.to_string()).collect(),
        }
    }
}

impl ReadingConfig {
    /// Minutes needed to read `text`, rounded up. An empty document reads in 0.
    pub fn estimate(&self, text: &str) -> u32 {
        let words = text
            .split_whitespace()
            .filter(|token| !self.denylist.iter().any(|denied| denied == token))
            .count();

        // Validated config never carries a zero speed; treat one as "unknown".
        if self.words_per_minute == 0 {
            return 0;
        }
        words.div_ceil(self.words_per_minute) as u32
    }
}

/// Estimate with the default speed and denylist.
pub fn estimate(text: &str) -> u32 {
    ReadingConfig::default().estimate(text)
}
