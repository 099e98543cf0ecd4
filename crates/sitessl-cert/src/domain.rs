//! Domain name validation

use regex_lite::Regex;
use std::sync::LazyLock;

/// Letters, digits, hyphen and period, anchored over the whole input.
static DOMAIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9.-]+$").expect("domain pattern compiles"));

/// Validate a domain against the allowed character set.
///
/// Allowed characters are `a-z`, `A-Z`, `0-9`, `-` and `.`. The empty string
/// is rejected. Length is not bounded and label structure is not checked, so
/// inputs such as `-.-` pass; callers normalize case themselves.
pub fn validate_domain(domain: &str) -> bool {
    DOMAIN_PATTERN.is_match(domain)
}
