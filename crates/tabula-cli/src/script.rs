//! Splitting SQL text into statements.

/// Splits SQL text on `;`, ignoring semicolons inside quoted strings and
/// comments.
///
/// Statements are returned trimmed and without their terminator. Pieces
/// that hold nothing but whitespace and comments are dropped.
pub fn split_statements(content: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut has_content = false;
    let mut chars = content.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '-' if chars.peek().map(|&(_, next)| next) == Some('-') => {
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek().map(|&(_, next)| next) == Some('*') => {
                chars.next();
                let mut previous = ' ';
                for (_, c) in chars.by_ref() {
                    if previous == '*' && c == '/' {
                        break;
                    }
                    previous = c;
                }
            }
            '\'' | '"' => {
                has_content = true;
                // '' re-enters the string on the next iteration.
                for (_, q) in chars.by_ref() {
                    if q == c {
                        break;
                    }
                }
            }
            ';' => {
                if has_content {
                    statements.push(content[start..i].trim());
                }
                start = i + 1;
                has_content = false;
            }
            c if c.is_whitespace() => {}
            _ => has_content = true,
        }
    }

    if has_content {
        statements.push(content[start..].trim());
    }

    statements
}

/// Returns true if `input` ends with a `;` outside any string or comment,
/// ignoring trailing whitespace and comments.
pub fn is_complete(input: &str) -> bool {
    let mut terminated = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '-' if chars.peek() == Some(&'-') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = ' ';
                let mut closed = false;
                for c in chars.by_ref() {
                    if previous == '*' && c == '/' {
                        closed = true;
                        break;
                    }
                    previous = c;
                }
                if !closed {
                    return false;
                }
            }
            '\'' | '"' => {
                terminated = false;
                if !chars.by_ref().any(|q| q == c) {
                    return false;
                }
            }
            ';' => terminated = true,
            c if c.is_whitespace() => {}
            _ => terminated = false,
        }
    }

    terminated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_statements_simple() {
        let stmts = split_statements("SELECT 1; SELECT 2; SELECT 3");
        assert_eq!(stmts, vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
    }

    #[test]
    fn test_split_statements_with_strings() {
        let stmts = split_statements("SELECT 'hello; world'; SELECT 'it''s; fine'");
        assert_eq!(stmts, vec!["SELECT 'hello; world'", "SELECT 'it''s; fine'"]);
    }

    #[test]
    fn test_split_statements_with_comments() {
        let sql = "-- header; comment\nSELECT 1; -- trailing ; note\nSELECT 2;\n-- done";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].ends_with("SELECT 1"));
        assert!(stmts[1].starts_with("-- trailing ; note"));
        assert!(stmts[1].ends_with("SELECT 2"));
    }

    #[test]
    fn test_split_statements_block_comment() {
        let stmts = split_statements("SELECT 1; /* block ; comment */ SELECT 2");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[1], "/* block ; comment */ SELECT 2");
    }

    #[test]
    fn test_split_statements_multibyte() {
        let stmts = split_statements("SELECT 'Café'; SELECT 'Zürich'");
        assert_eq!(stmts, vec!["SELECT 'Café'", "SELECT 'Zürich'"]);
    }

    #[test]
    fn test_is_complete() {
        assert!(is_complete("SELECT 1;"));
        assert!(is_complete("SELECT 1; -- done\n"));
        assert!(is_complete("SELECT ';'\n FROM t;  "));
        assert!(!is_complete("SELECT 1"));
        assert!(!is_complete("SELECT 'a;"));
        assert!(!is_complete("SELECT 1 /* ; */"));
        assert!(!is_complete("SELECT 1; SELECT 2"));
    }

    #[test]
    fn test_empty_pieces_dropped() {
        assert!(split_statements(" ; ;\n -- nothing\n").is_empty());
    }
}
