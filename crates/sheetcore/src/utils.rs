/// Escapes special characters for Telegram MarkdownV2.
///
/// Every character from the Bot API list gets a backslash, plus the
/// backslash itself.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        match c {
            '\\' | '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|' | '{' | '}'
            | '.' | '!' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }

    result
}

/// Escapes text for use inside a MarkdownV2 inline code span.
///
/// Only the backtick and backslash are special there.
pub fn escape_code(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '`' || c == '\\' {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Wraps text in an inline code span.
pub fn code(text: &str) -> String {
    format!("`{}`", escape_code(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown_v2() {
        assert_eq!(escape_markdown_v2("bus_stop"), "bus\\_stop");
        assert_eq!(escape_markdown_v2("Hi! (3.5)"), "Hi\\! \\(3\\.5\\)");
        assert_eq!(escape_markdown_v2("plain text"), "plain text");
    }

    #[test]
    fn test_escape_code_only_touches_backtick_and_backslash() {
        assert_eq!(escape_code("bus_stop"), "bus_stop");
        assert_eq!(escape_code("a`b\\c"), "a\\`b\\\\c");
        assert_eq!(code("flibbertigibbet"), "`flibbertigibbet`");
    }
}
