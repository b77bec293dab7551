//! Slug and reading-time helpers for publishing.

use chrono::Utc;

/// Words-per-minute used for the reading-time estimate.
const READING_WPM: usize = 200;

/// Lowercase, accent-folded, alphanumeric-only slug with spaces collapsed to
/// single hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // suppress a leading hyphen

    for c in title.to_lowercase().chars().map(fold_accent) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_was_hyphen = false;
        } else if (c.is_whitespace() || c == '-') && !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
        // every other character is stripped
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Slug made unique across articles by a millisecond-timestamp suffix, so
/// publishing two items with the same title never collides.
pub fn unique_slug(title: &str) -> String {
    let base = slugify(title);
    let ts = Utc::now().timestamp_millis();
    if base.is_empty() {
        format!("article-{ts}")
    } else {
        format!("{base}-{ts}")
    }
}

/// `max(1, ceil(words / 200))` minutes.
pub fn reading_time_minutes(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    (words.div_ceil(READING_WPM)).max(1) as i32
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'ç' => 'c',
        'ñ' => 'n',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basics() {
        assert_eq!(slugify("Big News"), "big-news");
        assert_eq!(slugify("  Spaced   out  title "), "spaced-out-title");
        assert_eq!(slugify("Hello, World! (2026)"), "hello-world-2026");
    }

    #[test]
    fn slugify_strips_accents() {
        assert_eq!(slugify("Élection générale à São Paulo"), "election-generale-a-sao-paulo");
        assert_eq!(slugify("Señor Piñata"), "senor-pinata");
    }

    #[test]
    fn slugify_drops_symbols_entirely() {
        assert_eq!(slugify("100% guaranteed?!"), "100-guaranteed");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn unique_slug_has_timestamp_suffix() {
        let slug = unique_slug("Big News");
        let (base, suffix) = slug.rsplit_once('-').unwrap();
        assert_eq!(base, "big-news");
        assert!(suffix.parse::<i64>().is_ok());
    }

    #[test]
    fn unique_slug_distinct_for_identical_titles() {
        let first = unique_slug("Big News");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = unique_slug("Big News");
        assert_ne!(first, second);
    }

    #[test]
    fn unique_slug_for_symbol_only_title() {
        let slug = unique_slug("!!!");
        assert!(slug.starts_with("article-"));
    }

    #[test]
    fn reading_time_examples() {
        let body_450: String = vec!["word"; 450].join(" ");
        assert_eq!(reading_time_minutes(&body_450), 3);

        let body_200: String = vec!["word"; 200].join(" ");
        assert_eq!(reading_time_minutes(&body_200), 1);

        let body_201: String = vec!["word"; 201].join(" ");
        assert_eq!(reading_time_minutes(&body_201), 2);

        // Never below one minute.
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes("tiny"), 1);
    }
}
