//! Derived post fields: slugs and reading time

const WORDS_PER_MINUTE: usize = 200;
const MAX_SLUG_LEN: usize = 80;

/// URL-safe slug from a title. Non-ASCII letters are transliterated, the
/// result is capped at 80 characters and never ends in a hyphen. Returns an
/// empty string when nothing usable remains.
pub fn slugify(title: &str) -> String {
    let mut slug = slug::slugify(title);
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
    }
    slug.trim_end_matches('-').to_string()
}

/// Minutes to read `content`, rounded up, never below one.
pub fn reading_time(content: &str) -> i64 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as i64
}
