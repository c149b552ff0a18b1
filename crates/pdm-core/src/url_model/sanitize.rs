//! Linux-safe filename sanitization.

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Sanitizes a candidate filename for safe use on Linux.
///
/// NUL, `/`, `\`, whitespace and control characters become `_` (runs
/// collapsed), leading/trailing dots and underscores are trimmed and the
/// result is cut to 255 bytes on a char boundary.
pub fn sanitize_filename_for_linux(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let unsafe_char = c == '\0' || c == '/' || c == '\\' || c.is_control() || c.is_whitespace();
        if unsafe_char || c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut take = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_slash_and_backslash() {
        assert_eq!(sanitize_filename_for_linux("a/b\\c.txt"), "a_b_c.txt");
    }

    #[test]
    fn trims_dots_and_spaces() {
        assert_eq!(sanitize_filename_for_linux("  ..  file.txt  ..  "), "file.txt");
    }

    #[test]
    fn collapses_underscores() {
        assert_eq!(sanitize_filename_for_linux("file___name.txt"), "file_name.txt");
    }

    #[test]
    fn control_chars() {
        assert_eq!(sanitize_filename_for_linux("file\x00name.txt"), "file_name.txt");
    }

    #[test]
    fn long_names_are_cut_on_char_boundary() {
        let long = "é".repeat(200);
        let out = sanitize_filename_for_linux(&long);
        assert!(out.len() <= NAME_MAX);
        assert!(out.chars().all(|c| c == 'é'));
    }
}
