use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Short form of a paper id for compact UI text, matching the six-character
/// prefix the dashboard uses for placeholders and edge captions.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(6) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_owned();
    }

    let mut truncated = label.chars().take(max_chars.saturating_sub(1)).collect::<String>();
    truncated.push('…');
    truncated
}

pub fn placeholder_label(id: &str) -> String {
    format!("Paper {}", short_id(id))
}

/// Deterministic pair in `[-1, 1]` derived from `id`, used as layout jitter so
/// that seeding is reproducible between runs.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

pub fn contains_ignore_case(haystack: &str, lowered_needle: &str) -> bool {
    lowered_needle.is_empty() || haystack.to_lowercase().contains(lowered_needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_keeps_first_six_chars() {
        assert_eq!(short_id("64f0c2aa91"), "64f0c2");
        assert_eq!(short_id("n1"), "n1");
        assert_eq!(placeholder_label("abcdefgh"), "Paper abcdef");
    }

    #[test]
    fn truncate_label_marks_cut_text() {
        assert_eq!(truncate_label("short", 36), "short");
        let cut = truncate_label("Attention Is All You Need, Revisited Again", 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let first = stable_pair("paper-42");
        let second = stable_pair("paper-42");
        assert_eq!(first, second);
        assert!((-1.0..=1.0).contains(&first.0));
        assert!((-1.0..=1.0).contains(&first.1));
    }

    #[test]
    fn contains_ignore_case_matches_mixed_case() {
        assert!(contains_ignore_case("Graph Neural Networks", "neural"));
        assert!(!contains_ignore_case("Topic Modeling", "graph"));
        assert!(contains_ignore_case("anything", ""));
    }
}
