use std::collections::{BTreeMap, HashMap, HashSet};

/// A collection of canonical slugs a filename token can resolve to.
pub trait KnownSlugs {
    fn contains_slug(&self, slug: &str) -> bool;
    fn is_empty(&self) -> bool;
}

impl KnownSlugs for HashSet<String> {
    fn contains_slug(&self, slug: &str) -> bool {
        self.contains(slug)
    }

    fn is_empty(&self) -> bool {
        HashSet::is_empty(self)
    }
}

impl<V> KnownSlugs for HashMap<String, V> {
    fn contains_slug(&self, slug: &str) -> bool {
        self.contains_key(slug)
    }

    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }
}

impl<V> KnownSlugs for BTreeMap<String, V> {
    fn contains_slug(&self, slug: &str) -> bool {
        self.contains_key(slug)
    }

    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }
}

/// Finds the longest hyphen-delimited prefix of `token` that is a known slug.
///
/// Image hosts append size and variant suffixes after the species slug
/// (`oscar-fish-300x200`, `guppy-thumb`), so trailing segments are dropped one
/// at a time until a match turns up. The token is returned unchanged when no
/// prefix matches.
pub fn resolve<K: KnownSlugs + ?Sized>(token: &str, known: &K) -> String {
    if known.is_empty() {
        return token.to_string();
    }

    let segments: Vec<&str> = token.split('-').collect();
    for len in (1..=segments.len()).rev() {
        let candidate = segments[..len].join("-");
        if known.contains_slug(&candidate) {
            return candidate;
        }
    }

    token.to_string()
}
