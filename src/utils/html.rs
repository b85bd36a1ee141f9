// src/utils/html.rs

/// Strips markup from a user-chosen display name.
///
/// Names are rendered on the public leaderboard, so every tag is removed and
/// the text content kept. Surrounding whitespace is trimmed.
pub fn clean_display_name(input: &str) -> String {
    ammonia::Builder::empty()
        .clean_content_tags(["script", "style"].into_iter().collect())
        .clean(input)
        .to_string()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_scripts() {
        assert_eq!(clean_display_name("<b>Ana</b>"), "Ana");
        assert_eq!(clean_display_name("  Bo<script>alert(1)</script> "), "Bo");
    }
}
