//! Secret pattern library

use regex::Regex;

/// A named detection rule
#[derive(Debug, Clone)]
pub struct SecretPattern {
    /// Upper-case label written into placeholders (`EMAIL`, `AWS_KEY`, ...)
    pub label: &'static str,
    /// Compiled matcher
    pub matcher: Regex,
}

/// Ordered, immutable set of secret patterns
///
/// Patterns are applied one label at a time in list order, so an overlap between two
/// labels is resolved by whichever runs first.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    patterns: Vec<SecretPattern>,
}

const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    ("OPENAI_KEY", r"sk-[a-zA-Z0-9_-]{20,}"),
    ("EMAIL", r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"),
    ("PHONE", r"\b(\d{3}[-.]?)?\d{3}[-.]?\d{4}\b"),
    ("CREDIT_CARD", r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b"),
    ("GITHUB_TOKEN", r"ghp_[a-zA-Z0-9]{36,}"),
    ("STRIPE_KEY", r"sk_live_[a-zA-Z0-9]{24,}"),
    ("AWS_KEY", r"AKIA[0-9A-Z]{16}"),
    (
        "GENERIC_API",
        r#"(?i)(api[_-]?key|secret[_-]?key|access[_-]?token)[\s:=]+['"]?([a-zA-Z0-9_-]{20,})['"]?"#,
    ),
];

impl PatternLibrary {
    /// Build a library from `(label, regex)` pairs
    pub fn new(rules: &[(&'static str, &str)]) -> Result<Self, regex::Error> {
        let patterns = rules
            .iter()
            .map(|&(label, pattern)| {
                Ok(SecretPattern {
                    label,
                    matcher: Regex::new(pattern)?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { patterns })
    }

    /// The built-in pattern set
    pub fn default_set() -> Self {
        // Compile-time constants; covered by test_default_set_compiles
        Self::new(DEFAULT_PATTERNS).expect("built-in secret patterns are valid")
    }

    pub fn iter(&self) -> impl Iterator<Item = &SecretPattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Labels in application order
    pub fn labels(&self) -> Vec<&'static str> {
        self.patterns.iter().map(|p| p.label).collect()
    }
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::default_set()
    }
}
