use unicode_normalization::UnicodeNormalization;

/// Turns a display name (common or scientific) into a species slug.
///
/// The name is canonically decomposed and everything outside ASCII is
/// dropped, which strips accents (`é` becomes `e`). Apostrophes are elided so
/// possessives stay one word. Every other run of characters outside
/// `[a-z0-9]` collapses into a single hyphen, and edge hyphens are never
/// emitted. Empty or all-symbol input yields an empty slug.
pub fn normalize(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.nfd() {
        if !ch.is_ascii() || ch == '\'' {
            continue;
        }
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }

    slug
}
