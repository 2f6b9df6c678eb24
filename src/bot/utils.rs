/// Free-text fields of a payload (commit messages, titles, review bodies) are cut to this many
/// characters.
pub(crate) const MAX_CONTENT_LENGTH: usize = 200;

pub(crate) fn shorten_content(content: &str) -> String {
    if content.chars().count() <= MAX_CONTENT_LENGTH {
        content.to_owned()
    } else {
        content.chars().take(MAX_CONTENT_LENGTH).collect::<String>() + "…"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(shorten_content("fix typo"), "fix typo");
        assert_eq!(shorten_content(&"é".repeat(200)), "é".repeat(200));
    }

    #[test]
    fn long_content_is_cut_on_chars() {
        let shortened = shorten_content(&"é".repeat(201));
        assert_eq!(shortened, "é".repeat(200) + "…");
    }
}
