use regex::Regex;
use std::sync::LazyLock;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit run pattern is valid"));

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Extracts the numbers embedded in a shiur title, left to right.
///
/// A run of digits counts when it stands alone as a word ("Daf 23") or when it
/// directly follows a colon or hyphen ("Perek 3:12", "Ch.4-7"). Digits glued to
/// letters ("Part2") are ignored.
pub fn extract_numbers(title: &str) -> Vec<i64> {
    DIGIT_RUN
        .find_iter(title)
        .filter(|m| {
            let before = title[..m.start()].chars().next_back();
            let after = title[m.end()..].chars().next();

            let after_separator = matches!(before, Some(':') | Some('-'));
            let word_bounded =
                !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char);

            after_separator || word_bounded
        })
        // i64 overflow: such a run can never match a calendar position
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}
