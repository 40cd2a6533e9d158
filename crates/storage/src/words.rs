/// Count whitespace-separated words.
///
/// Blank input counts as zero words.
pub fn count_words(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_has_no_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
        assert_eq!(count_words("\n\t \r\n"), 0);
    }

    #[test]
    fn joined_words_are_counted() {
        for n in 1..20 {
            let text = vec!["word"; n].join(" ");
            assert_eq!(count_words(&text), n as u32);
        }
    }

    #[test]
    fn runs_of_whitespace_are_one_separator() {
        assert_eq!(count_words("  the\tquick \n\n brown   fox  "), 4);
        assert_eq!(count_words("chương một"), 2);
    }
}
