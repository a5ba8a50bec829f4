/// Lowercased, hyphen-separated form of a name for use inside derived
/// identifiers; "patient" when nothing usable survives.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::new();
    let mut last_was_sep = true;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('-');
            last_was_sep = true;
        }
    }

    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "patient".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Dela Cruz"), "dela-cruz");
        assert_eq!(slugify("O'Brien"), "o-brien");
        assert_eq!(slugify("Santos-Reyes"), "santos-reyes");
    }

    #[test]
    fn slugify_falls_back_when_nothing_survives() {
        assert_eq!(slugify(""), "patient");
        assert_eq!(slugify("!!!"), "patient");
    }
}
