//! Pure version pickers over lists of upstream tags and labels
//!
//! Coercion rule used throughout: a tag is coercible when it contains a
//! `major.minor[.patch]` run of digits that is not glued to a preceding digit
//! or dot. Missing patch is zero. Anything after the numeric run (pre-release
//! markers, build metadata) is dropped, so `2.1.0-beta` coerces to `2.1.0`.

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

/// C language standards, newest first
pub const C_STANDARDS: &[&str] = &["C23", "C17", "C11", "C99", "C89"];

/// C++ language standards, newest first
pub const CPP_STANDARDS: &[&str] = &["C++26", "C++23", "C++20", "C++17", "C++14", "C++11"];

static COERCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.])(\d{1,16})\.(\d{1,16})(?:\.(\d{1,16}))?").unwrap()
});

static DRAFT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^n\d{4}$").unwrap());

static FALLBACK_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^release[-_]?(\d+(?:[._]\d+)+)",
        r"^v(\d+(?:[._]\d+)+)",
        r"(\d+(?:[._]\d+)+)$",
    ]
    .iter()
    .map(|re| Regex::new(re).unwrap())
    .collect()
});

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Coerce a tag into a release version
pub fn coerce_semver(tag: &str) -> Option<Version> {
    let caps = COERCE_RE.captures(tag)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    let patch = caps
        .get(3)
        .map_or(Some(0), |m| m.as_str().parse().ok())?;
    Some(Version::new(major, minor, patch))
}

/// Greatest coercible tag, rendered as `major.minor.patch`
pub fn pick_latest_semver<S: AsRef<str>>(tags: &[S]) -> Option<String> {
    tags.iter()
        .filter_map(|tag| coerce_semver(tag.as_ref()))
        .max()
        .map(|version| version.to_string())
}

/// Greatest tag whose major (and minor, if given) matches `prefix`
///
/// `prefix` is read loosely: `"22"`, `"v22"` and `"22.x"` all select major 22,
/// `"3.12"` selects 3.12.*.
pub fn pick_lts_semver<S: AsRef<str>>(tags: &[S], prefix: &str) -> Option<String> {
    let mut parts = DIGITS_RE
        .find_iter(prefix)
        .filter_map(|m| m.as_str().parse::<u64>().ok());
    let major = parts.next()?;
    let minor = parts.next();

    tags.iter()
        .filter_map(|tag| coerce_semver(tag.as_ref()))
        .filter(|v| v.major == major && minor.is_none_or(|minor| v.minor == minor))
        .max()
        .map(|version| version.to_string())
}

/// Latest fixed-width draft tag (`n4950` style)
///
/// Drafts are numbered monotonically at a fixed width, so the lexicographic
/// maximum is also the newest.
pub fn pick_draft_tag<S: AsRef<str>>(tags: &[S]) -> Option<String> {
    tags.iter()
        .map(AsRef::as_ref)
        .filter(|tag| DRAFT_RE.is_match(tag))
        .max()
        .map(str::to_string)
}

/// Pattern-based pick for tag sets that do not coerce
///
/// Patterns are tried in order (release-prefixed, v-prefixed, bare trailing
/// numbers) and the first tag matching the earliest pattern wins. Underscore
/// separators are turned into dots.
pub fn pick_fallback_version<S: AsRef<str>>(tags: &[S]) -> Option<String> {
    FALLBACK_RES.iter().find_map(|re| {
        tags.iter().find_map(|tag| {
            re.captures(tag.as_ref())
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().replace('_', "."))
        })
    })
}

/// Labels from `known_labels` that occur in `text` as whole words, in the
/// order of `known_labels`
pub fn detect_standard_years(text: &str, known_labels: &[&str]) -> Vec<String> {
    known_labels
        .iter()
        .filter(|label| {
            let pattern = format!(
                r"(?:^|[^A-Za-z0-9_+]){}(?:$|[^A-Za-z0-9_+])",
                regex::escape(label)
            );
            Regex::new(&pattern).is_ok_and(|re| re.is_match(text))
        })
        .map(|label| label.to_string())
        .collect()
}
