//! Splitting helpers for message text.

/// Splits the text after a prefix into a command name and its argument string.
///
/// The text is trimmed, then split at the first run of whitespace. The name
/// is everything before it; the arguments are everything after it, with
/// inner whitespace left untouched. Either part may be empty.
///
/// ```rust,ignore
/// assert_eq!(split_command("  ping  a  b "), ("ping", "a  b"));
/// assert_eq!(split_command("ping"), ("ping", ""));
/// ```
pub fn split_command(rest: &str) -> (&str, &str) {
    let rest = rest.trim();
    match rest.find(char::is_whitespace) {
        Some(at) => (&rest[..at], rest[at..].trim_start()),
        None => (rest, ""),
    }
}

/// Simple shell-like argument splitting.
///
/// Handles:
/// - Whitespace-separated arguments
/// - Quoted strings (single and double quotes)
/// - Backslash escapes inside double quotes
pub fn shell_split(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escape_next = false;
    // Distinguishes `""` (an empty argument) from no argument at all.
    let mut pending = false;

    for ch in input.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_double_quote => escape_next = true,
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                pending = true;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
                pending = true;
            }
            c if c.is_whitespace() && !in_single_quote && !in_double_quote => {
                if pending || !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            _ => current.push(ch),
        }
    }

    if pending || !current.is_empty() {
        args.push(current);
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("ping"), ("ping", ""));
        assert_eq!(split_command("  ping  a  b "), ("ping", "a  b"));
        assert_eq!(split_command("ping\n\tline two"), ("ping", "line two"));
        assert_eq!(split_command("   "), ("", ""));
        assert_eq!(split_command(""), ("", ""));
    }

    #[test]
    fn test_shell_split_simple() {
        assert_eq!(shell_split("hello world"), vec!["hello", "world"]);
    }

    #[test]
    fn test_shell_split_quoted() {
        assert_eq!(
            shell_split(r#""hello world" 'single quoted' x"#),
            vec!["hello world", "single quoted", "x"]
        );
    }

    #[test]
    fn test_shell_split_mixed_quotes() {
        let args = shell_split(r#""double's quote" 'single"s quote'"#);
        assert_eq!(args, vec!["double's quote", r#"single"s quote"#]);
    }

    #[test]
    fn test_shell_split_escape_in_double_quotes() {
        assert_eq!(shell_split(r#""say \"hi\"""#), vec![r#"say "hi""#]);
    }

    #[test]
    fn test_shell_split_empty_quotes() {
        assert_eq!(shell_split(r#"a "" b"#), vec!["a", "", "b"]);
    }

    #[test]
    fn test_shell_split_whitespace_only() {
        assert!(shell_split("").is_empty());
        assert!(shell_split("   \t\n ").is_empty());
    }
}
