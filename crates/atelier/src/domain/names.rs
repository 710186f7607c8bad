//! Session name normalisation.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^a-z0-9]+").expect("valid sanitize pattern"));

/// Lower-case `value`, collapse every run of non-alphanumeric characters into a single dash,
/// and trim dashes from both ends.
///
/// Used for every session name component and for action collision detection, so the picker
/// and the session backend always agree on identifiers.
pub fn sanitize(value: &str) -> String {
    let lower = value.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Whether two names refer to the same action once sanitized.
pub fn same_name(a: &str, b: &str) -> bool {
    sanitize(a) == sanitize(b)
}
