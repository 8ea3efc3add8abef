//! Flag-emoji scanning.
//!
//! A flag emoji is a pair of regional indicator symbols
//! (U+1F1E6..U+1F1FF). Only the first flag in text order matters:
//! scan order encodes the tie-break, not frequency.

const RI_FIRST: char = '\u{1F1E6}';
const RI_LAST: char = '\u{1F1FF}';

fn is_regional_indicator(c: char) -> bool {
    (RI_FIRST..=RI_LAST).contains(&c)
}

/// Return the first flag emoji in the text, if any.
pub fn first_flag(text: &str) -> Option<String> {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if !is_regional_indicator(c) {
            continue;
        }
        match chars.peek() {
            Some(&next) if is_regional_indicator(next) => {
                chars.next();
                let mut flag = String::with_capacity(8);
                flag.push(c);
                flag.push(next);
                return Some(flag);
            }
            _ => {}
        }
    }
    None
}

/// Render a flag emoji as its alpha-2 letters, for attempt-log detail.
pub fn flag_letters(flag: &str) -> String {
    flag.chars()
        .filter_map(|c| {
            is_regional_indicator(c)
                .then(|| char::from_u32('A' as u32 + (c as u32 - RI_FIRST as u32)))
                .flatten()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_flag() {
        assert_eq!(
            first_flag("\u{1F1FA}\u{1F1E6} Strike reported"),
            Some("\u{1F1FA}\u{1F1E6}".to_string())
        );
    }

    #[test]
    fn test_first_of_several_flags_wins() {
        // 🇷🇺 appears before 🇺🇦 — first occurrence wins.
        let text = "\u{1F1F7}\u{1F1FA} shelling, \u{1F1FA}\u{1F1E6} response";
        assert_eq!(first_flag(text), Some("\u{1F1F7}\u{1F1FA}".to_string()));
    }

    #[test]
    fn test_adjacent_flags_pair_correctly() {
        // 🇺🇦🇷🇺 with no separator: the first pair is 🇺🇦.
        let text = "\u{1F1FA}\u{1F1E6}\u{1F1F7}\u{1F1FA}";
        assert_eq!(first_flag(text), Some("\u{1F1FA}\u{1F1E6}".to_string()));
    }

    #[test]
    fn test_lone_regional_indicator_is_not_a_flag() {
        assert_eq!(first_flag("\u{1F1FA} alone"), None);
    }

    #[test]
    fn test_no_flag() {
        assert_eq!(first_flag("no emoji here"), None);
        assert_eq!(first_flag(""), None);
    }

    #[test]
    fn test_flag_letters() {
        assert_eq!(flag_letters("\u{1F1FA}\u{1F1E6}"), "UA");
    }
}
