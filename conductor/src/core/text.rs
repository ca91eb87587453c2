//! Small string helpers shared by the generators.

/// First `max_chars` characters of `value`, never splitting a code point.
pub fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// `my-cool-app` -> `My Cool App`.
///
/// Dashes become spaces; every letter that follows a non-letter is
/// uppercased and the rest lowercased, so `my_app` gives `My_App` and
/// repeated separators are kept.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut after_letter = false;
    for ch in name.chars() {
        if ch.is_alphabetic() {
            if after_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(if ch == '-' { ' ' } else { ch });
            after_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("short", 50), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn title_case_splits_on_dashes() {
        assert_eq!(title_case("my-cool-app"), "My Cool App");
        assert_eq!(title_case("API-server"), "Api Server");
    }

    #[test]
    fn title_case_capitalizes_after_any_non_letter() {
        assert_eq!(title_case("my_app"), "My_App");
        assert_eq!(title_case("v2app"), "V2App");
        assert_eq!(title_case("a--b"), "A  B");
        assert_eq!(title_case(""), "");
    }
}
