//! URL-safe key derivation.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Longest slug we generate.
const MAX_SLUG_LEN: usize = 128;

/// Convert text into a URL-safe slug.
///
/// Lowercases, replaces every run of non-alphanumeric characters with a
/// single hyphen, and trims leading/trailing hyphens. May return an empty
/// string; see [`slug_or_random`].
pub fn slugify(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_hyphen = true; // Start true to skip leading hyphens
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_was_hyphen = false;
        } else if !prev_was_hyphen {
            result.push('-');
            prev_was_hyphen = true;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }

    if result.len() > MAX_SLUG_LEN {
        // Pure ASCII, so any index is a char boundary.
        let truncated = &result[..MAX_SLUG_LEN];
        return match truncated.rfind('-') {
            Some(last_hyphen) => truncated[..last_hyphen].to_string(),
            None => truncated.to_string(),
        };
    }

    result
}

/// Slugify, falling back to a random key when nothing alphanumeric survives.
pub fn slug_or_random(text: &str) -> String {
    let slug = slugify(text);
    if slug.is_empty() {
        random_key()
    } else {
        slug
    }
}

/// An 8-character lowercase alphanumeric key prefixed with `item-`.
pub fn random_key() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("item-{suffix}")
}
