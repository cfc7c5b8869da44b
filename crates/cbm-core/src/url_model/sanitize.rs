//! Linux-safe filename sanitization.

/// Linux NAME_MAX.
pub const NAME_MAX: usize = 255;

/// Sanitizes a candidate filename component for safe use on Linux.
///
/// - Replaces NUL, `/`, `\`, control characters, whitespace and the
///   characters other platforms reject (`<>:"|?*`) with `_`
/// - Collapses consecutive underscores
/// - Trims leading/trailing dots and underscores
/// - Limits length to `max_len` bytes (never above NAME_MAX), on a char boundary
pub fn sanitize_component(name: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let replacement = if c == '\0'
            || c == '/'
            || c == '\\'
            || c.is_control()
            || c.is_whitespace()
            || matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*')
        {
            '_'
        } else {
            c
        };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let truncated = truncate_on_char_boundary(trimmed, max_len.min(NAME_MAX));
    truncated.trim_end_matches(|c| c == '.' || c == '_').to_string()
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char boundary.
pub fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut take = max;
    while take > 0 && !s.is_char_boundary(take) {
        take -= 1;
    }
    &s[..take]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_slash_and_backslash() {
        assert_eq!(sanitize_component("a/b\\c", 60), "a_b_c");
    }

    #[test]
    fn trims_dots_and_spaces() {
        assert_eq!(sanitize_component("  ..  lesson one  ..  ", 60), "lesson_one");
    }

    #[test]
    fn collapses_underscores() {
        assert_eq!(sanitize_component("part___two", 60), "part_two");
    }

    #[test]
    fn control_and_reserved_chars() {
        assert_eq!(sanitize_component("ep\x00<1>: intro?", 60), "ep_1_intro");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let s = sanitize_component("ééééé", 5);
        assert_eq!(s, "éé");
        assert!(s.len() <= 5);
    }

    #[test]
    fn truncation_does_not_leave_trailing_separator() {
        assert_eq!(sanitize_component("abc def", 4), "abc");
    }
}
