//! Per-ecosystem cleanup of upstream version labels
//!
//! Rules are applied in a fixed order:
//! 1. trim whitespace
//! 2. turn `_` into `.` when the ecosystem separates with underscores
//! 3. return the first `X.Y.Z` run if the rule extracts triplets and one exists
//! 4. otherwise strip path segments, known prefixes and known suffixes until
//!    none apply, then trim again
//!
//! Every step is idempotent on its own output, so normalizing twice yields
//! the same label. The built-in table only covers the ecosystems seen so far;
//! register more with [`LabelNormalizer::with_rule`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static TRIPLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeRule {
    pub prefixes: Vec<String>,
    pub suffixes: Vec<String>,
    pub underscores_to_dots: bool,
    pub extract_triplet: bool,
    /// Drop everything up to the last `/` (`pkg/sub/v1.2` -> `v1.2`)
    pub strip_path: bool,
}

impl NormalizeRule {
    fn new(prefixes: &[&str], suffixes: &[&str]) -> Self {
        Self {
            prefixes: prefixes.iter().map(|s| s.to_string()).collect(),
            suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
            underscores_to_dots: false,
            extract_triplet: true,
            strip_path: false,
        }
    }

    fn underscores(mut self) -> Self {
        self.underscores_to_dots = true;
        self
    }

    fn keep_partial(mut self) -> Self {
        self.extract_triplet = false;
        self
    }

    fn path(mut self) -> Self {
        self.strip_path = true;
        self
    }

    fn apply(&self, raw: &str) -> String {
        let mut label = raw.trim().to_string();

        if self.underscores_to_dots {
            label = label.replace('_', ".");
        }

        if self.extract_triplet
            && let Some(m) = TRIPLET_RE.find(&label)
        {
            return m.as_str().to_string();
        }

        if self.strip_path
            && let Some((_, last)) = label.rsplit_once('/')
        {
            label = last.to_string();
        }

        loop {
            label = label.trim().to_string();
            let before = label.len();
            for prefix in &self.prefixes {
                if let Some(rest) = label.strip_prefix(prefix.as_str()) {
                    label = rest.to_string();
                }
            }
            for suffix in &self.suffixes {
                if let Some(rest) = label.strip_suffix(suffix.as_str()) {
                    label = rest.to_string();
                }
            }
            if label.len() == before {
                return label;
            }
        }
    }
}

fn builtin_rules() -> HashMap<String, NormalizeRule> {
    let v = || NormalizeRule::new(&["v"], &[]);

    [
        ("node.js", v()),
        ("typescript", v()),
        ("deno", v()),
        ("rust", v()),
        ("kotlin", v()),
        ("elixir", v()),
        ("julia", v()),
        ("zig", v()),
        ("perl", v()),
        ("lua", v()),
        ("scala", v()),
        ("gradle", NormalizeRule::new(&["v"], &["-RELEASE"]).keep_partial()),
        ("spring boot", NormalizeRule::new(&["v"], &["-RELEASE", ".RELEASE"])),
        ("bun", NormalizeRule::new(&["bun-v", "bun-", "v"], &[])),
        ("php", NormalizeRule::new(&["php-"], &[])),
        ("ruby", NormalizeRule::new(&["v"], &[]).underscores()),
        ("go", NormalizeRule::new(&["go"], &[]).keep_partial()),
        ("erlang", NormalizeRule::new(&["OTP-"], &[]).keep_partial()),
        ("swift", NormalizeRule::new(&["swift-"], &["-RELEASE"]).keep_partial()),
        ("maven", NormalizeRule::new(&["maven-"], &[])),
        (
            "haskell",
            NormalizeRule::new(&["ghc-"], &["-release"]).underscores(),
        ),
        ("angular", NormalizeRule::new(&["v"], &[]).path()),
        ("java", NormalizeRule::new(&["jdk-"], &[]).keep_partial()),
        (".net", NormalizeRule::new(&["v"], &[])),
    ]
    .into_iter()
    .map(|(key, rule)| (key.to_string(), rule))
    .collect()
}

/// Label normalizer keyed by lower-cased entity key
#[derive(Debug, Clone)]
pub struct LabelNormalizer {
    rules: HashMap<String, NormalizeRule>,
}

impl Default for LabelNormalizer {
    fn default() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }
}

impl LabelNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the rule for `entity_key`
    pub fn with_rule(mut self, entity_key: &str, rule: NormalizeRule) -> Self {
        self.rules.insert(entity_key.to_lowercase(), rule);
        self
    }

    pub fn normalize(&self, entity_key: &str, raw: &str) -> String {
        match self.rules.get(&entity_key.to_lowercase()) {
            Some(rule) => rule.apply(raw),
            None => raw.trim().to_string(),
        }
    }
}

static DEFAULT_NORMALIZER: LazyLock<LabelNormalizer> = LazyLock::new(LabelNormalizer::default);

/// Normalizes with the built-in rule table
pub fn normalize(entity_key: &str, raw: &str) -> String {
    DEFAULT_NORMALIZER.normalize(entity_key, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Node.js", "v22.11.0", "22.11.0")]
    #[case("PHP", "php-8.3.13", "8.3.13")]
    #[case("Ruby", "v3_3_6", "3.3.6")]
    #[case("Ruby", "v3_4", "3.4")]
    #[case("Go", "go1.23.3", "1.23.3")]
    #[case("Go", "go1.23", "1.23")]
    #[case("Erlang", "OTP-27.1.2", "27.1.2")]
    #[case("Erlang", "OTP-27.1", "27.1")]
    #[case("Swift", "swift-6.0.2-RELEASE", "6.0.2")]
    #[case("Swift", "swift-6.0-RELEASE", "6.0")]
    #[case("Haskell", "ghc-9.10.1-release", "9.10.1")]
    #[case("Haskell", "ghc-9_10-release", "9.10")]
    #[case("Bun", "bun-v1.1.34", "1.1.34")]
    #[case("Maven", "maven-3.9.9", "3.9.9")]
    #[case("Gradle", "v8.11.0-RELEASE", "8.11.0")]
    #[case("Gradle", "v8.11", "8.11")]
    #[case("Angular", "@angular/core/v19.0", "19.0")]
    #[case("Java", "jdk-23", "23")]
    #[case("Spring Boot", "v3.3.5", "3.3.5")]
    #[case("Unknown", "  v1.0.0 ", "v1.0.0")]
    fn normalize_applies_entity_rule(
        #[case] entity: &str,
        #[case] raw: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(normalize(entity, raw), expected);
    }

    #[rstest]
    #[case("Node.js", "vv22")]
    #[case("Node.js", " v v1")]
    #[case("Go", "gogo1.2")]
    #[case("Swift", "swift-6.0-RELEASE-RELEASE")]
    #[case("Ruby", "v3_3_6_preview1")]
    #[case("Haskell", " ghc-9_10-release ")]
    #[case("Angular", "a/b/v19")]
    #[case("Bun", "bun-bun-v1")]
    #[case("Unknown", "\tnightly\n")]
    fn normalize_is_idempotent(#[case] entity: &str, #[case] raw: &str) {
        let once = normalize(entity, raw);
        assert_eq!(normalize(entity, &once), once);
    }

    #[test]
    fn normalize_matches_entity_key_case_insensitively() {
        assert_eq!(normalize("NODE.JS", "v20.0.0"), "20.0.0");
        assert_eq!(normalize("php", "php-8.2.0"), "8.2.0");
    }

    #[test]
    fn with_rule_extends_the_table() {
        let normalizer = LabelNormalizer::new()
            .with_rule("R", NormalizeRule::new(&["R-"], &[]).underscores());

        assert_eq!(normalizer.normalize("r", "R-4_4_1"), "4.4.1");
        assert_eq!(normalize("r", "R-4_4_1"), "R-4_4_1");
    }
}
