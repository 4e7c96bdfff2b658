//! Pure SQL statement splitter.
//!
//! Splits a blob of SQL text into individual statements, stripping `--` line
//! comments and `/* */` block comments, while never touching characters
//! inside a `'…'` or `"…"` string literal. A single pass over the input
//! tracks whether we're inside a string and, if so, how many consecutive
//! backslashes immediately precede the current position (an odd count means
//! the next matching quote is escaped, not a terminator).

/// Split `text` into trimmed, non-empty statements in source order.
pub fn split(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut trailing_backslashes = 0usize;
    let mut i = 0;

    while i < n {
        let c = chars[i];

        if in_single || in_double {
            let quote = if in_single { '\'' } else { '"' };
            if c == quote && trailing_backslashes % 2 == 0 {
                in_single = false;
                in_double = false;
                current.push(c);
                trailing_backslashes = 0;
                i += 1;
                continue;
            }
            current.push(c);
            trailing_backslashes = if c == '\\' { trailing_backslashes + 1 } else { 0 };
            i += 1;
            continue;
        }

        match c {
            '\'' => {
                in_single = true;
                current.push(c);
                trailing_backslashes = 0;
                i += 1;
            }
            '"' => {
                in_double = true;
                current.push(c);
                trailing_backslashes = 0;
                i += 1;
            }
            '-' if i + 1 < n && chars[i + 1] == '-' => {
                i += 2;
                while i < n && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if i + 1 < n && chars[i + 1] == '*' => {
                i += 2;
                while i + 1 < n && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i = (i + 2).min(n);
            }
            ';' => {
                push_if_non_empty(&mut statements, &current);
                current.clear();
                i += 1;
            }
            _ => {
                current.push(c);
                i += 1;
            }
        }
    }

    push_if_non_empty(&mut statements, &current);
    statements
}

fn push_if_non_empty(out: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Rejoin statements into a single blob, inverse-ish of [`split`]: re-splitting
/// the result yields the same sequence of statements.
pub fn join(statements: &[String]) -> String {
    statements.join(";\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_statements() {
        assert!(split("").is_empty());
        assert!(split("   \n\t  ").is_empty());
    }

    #[test]
    fn splits_on_semicolon() {
        let got = split("SELECT 1; SELECT 2;");
        assert_eq!(got, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn trailing_statement_without_semicolon_is_kept() {
        let got = split("SELECT 1; SELECT 2");
        assert_eq!(got, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn semicolon_inside_string_literal_is_not_a_split_point() {
        let got = split("INSERT INTO t VALUES ('a;b'); SELECT 1;");
        assert_eq!(got, vec!["INSERT INTO t VALUES ('a;b')", "SELECT 1"]);
    }

    #[test]
    fn line_comment_inside_string_is_preserved() {
        let got = split("SELECT '--not a comment';");
        assert_eq!(got, vec!["SELECT '--not a comment'"]);
    }

    #[test]
    fn line_comment_is_stripped() {
        let got = split("SELECT 1; -- trailing note\nSELECT 2;");
        assert_eq!(got, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn block_comment_spanning_lines_with_semicolon_inside_is_stripped() {
        let got = split("SELECT 1 /* a;\nb */ ; SELECT 2;");
        assert_eq!(got, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn escaped_quote_does_not_terminate_string() {
        let got = split(r"SELECT 'it\'s fine';");
        assert_eq!(got, vec![r"SELECT 'it\'s fine'"]);
    }

    #[test]
    fn crlf_line_endings_are_tolerated() {
        let got = split("SELECT 1;\r\nSELECT 2;\r\n");
        assert_eq!(got, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn split_join_round_trip_is_stable() {
        let original = split("SELECT 1; /* note */ SELECT 2; SELECT '3;4';");
        let rejoined = join(&original);
        assert_eq!(split(&rejoined), original);
    }
}
