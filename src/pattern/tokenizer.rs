use crate::pattern::{token::Token, token_kind::TokenKind};

/// Total tokenizer for the pattern language.
///
/// Behavior:
/// - Skips ASCII whitespace.
/// - Aggregates `[A-Za-z_][A-Za-z0-9_]*` runs into words, preserving case.
/// - Consumes numbers (optional leading `-`, digits, optional fraction).
/// - Reads `"…"` strings, unescaping doubled quotes; a missing closing
///   quote yields `UnterminatedStr` for the compiler to reject.
/// - Treats `...` as one token and `\` + digit as a backreference.
/// - Emits single-character tokens for the bracket pairs and the prefix
///   sigils; everything else is `Other(char)`.
///
/// Guarantees:
/// - Never fails: any input yields a (possibly empty) token sequence.
///   Syntax errors are the compiler's job.
pub fn tokenize(pattern: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = pattern.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;

        // Word path
        if c.is_ascii_alphabetic() || c == '_' {
            i += 1;
            while i < bytes.len() {
                let cc = bytes[i] as char;
                if cc.is_ascii_alphanumeric() || cc == '_' {
                    i += 1;
                } else {
                    break;
                }
            }
            out.push(Token::new(
                TokenKind::Word(pattern[start..i].to_string()),
                start,
                i,
            ));
            continue;
        }

        // Number path, including a leading sign directly attached to digits
        let signed = c == '-' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit();
        if c.is_ascii_digit() || signed {
            i += 1;
            let mut seen_dot = false;
            while i < bytes.len() {
                match bytes[i] {
                    b'0'..=b'9' => i += 1,
                    b'.' if !seen_dot && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {
                        seen_dot = true;
                        i += 1;
                    }
                    _ => break,
                }
            }
            out.push(Token::new(
                TokenKind::Number(pattern[start..i].to_string()),
                start,
                i,
            ));
            continue;
        }

        // String path: doubled quotes are the only escape
        if c == '"' {
            let mut text = String::new();
            let mut terminated = false;
            i += 1;
            while i < bytes.len() {
                if bytes[i] == b'"' {
                    if bytes.get(i + 1) == Some(&b'"') {
                        text.push('"');
                        i += 2;
                        continue;
                    }
                    i += 1;
                    terminated = true;
                    break;
                }
                let run = i;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += 1;
                }
                text.push_str(&pattern[run..i]);
            }
            let kind = if terminated {
                TokenKind::Str(text)
            } else {
                TokenKind::UnterminatedStr(text)
            };
            out.push(Token::new(kind, start, i));
            continue;
        }

        // `...` is one token; lone dots fall through to Other
        if c == '.' && bytes.get(i + 1) == Some(&b'.') && bytes.get(i + 2) == Some(&b'.') {
            i += 3;
            out.push(Token::new(TokenKind::Ellipsis, start, i));
            continue;
        }

        // Backreference: backslash + digit
        if c == '\\' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
            let digit = (bytes[i + 1] - b'0') as u32;
            i += 2;
            out.push(Token::new(TokenKind::Backref(digit), start, i));
            continue;
        }

        // Single-character tokens
        i += 1;
        let kind = match c {
            '(' => TokenKind::ParenOpen,
            ')' => TokenKind::ParenClose,
            '[' => TokenKind::BracketOpen,
            ']' => TokenKind::BracketClose,
            '{' => TokenKind::BraceOpen,
            '}' => TokenKind::BraceClose,
            '!' => TokenKind::Bang,
            '?' => TokenKind::Question,
            '^' => TokenKind::Caret,
            '$' => TokenKind::Dollar,
            other => TokenKind::Other(other),
        };
        out.push(Token::new(kind, start, i));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(pattern: &str) -> Vec<TokenKind> {
        tokenize(pattern).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn basic_form() {
        assert_eq!(
            kinds("(relname \"users\")"),
            vec![
                TokenKind::ParenOpen,
                TokenKind::Word("relname".into()),
                TokenKind::Str("users".into()),
                TokenKind::ParenClose,
            ]
        );
    }

    #[test]
    fn sigils_and_groups() {
        assert_eq!(
            kinds("{!a ?b ^c $d}"),
            vec![
                TokenKind::BraceOpen,
                TokenKind::Bang,
                TokenKind::Word("a".into()),
                TokenKind::Question,
                TokenKind::Word("b".into()),
                TokenKind::Caret,
                TokenKind::Word("c".into()),
                TokenKind::Dollar,
                TokenKind::Word("d".into()),
                TokenKind::BraceClose,
            ]
        );
    }

    #[test]
    fn ellipsis_is_one_token() {
        assert_eq!(
            kinds("(SelectStmt ...)"),
            vec![
                TokenKind::ParenOpen,
                TokenKind::Word("SelectStmt".into()),
                TokenKind::Ellipsis,
                TokenKind::ParenClose,
            ]
        );
        // A lone dot is not part of the language.
        assert_eq!(kinds("."), vec![TokenKind::Other('.')]);
    }

    #[test]
    fn numbers_with_signs_and_fractions() {
        assert_eq!(kinds("42"), vec![TokenKind::Number("42".into())]);
        assert_eq!(kinds("-7"), vec![TokenKind::Number("-7".into())]);
        assert_eq!(kinds("3.14"), vec![TokenKind::Number("3.14".into())]);
        // `-` not followed by a digit stays a plain character.
        assert_eq!(
            kinds("- 1"),
            vec![TokenKind::Other('-'), TokenKind::Number("1".into())]
        );
    }

    #[test]
    fn doubled_quote_escapes() {
        assert_eq!(
            kinds(r#""it""s""#),
            vec![TokenKind::Str("it\"s".into())]
        );
    }

    #[test]
    fn unterminated_string_is_flagged() {
        assert_eq!(
            kinds("\"open"),
            vec![TokenKind::UnterminatedStr("open".into())]
        );
    }

    #[test]
    fn backreferences() {
        assert_eq!(kinds(r"\1"), vec![TokenKind::Backref(1)]);
        assert_eq!(kinds(r"\0"), vec![TokenKind::Backref(0)]);
        // Backslash without a digit is just an unknown character.
        assert_eq!(
            kinds(r"\x"),
            vec![TokenKind::Other('\\'), TokenKind::Word("x".into())]
        );
    }

    #[test]
    fn whitespace_is_insignificant() {
        assert_eq!(kinds("   "), vec![]);
        assert_eq!(kinds(""), vec![]);
    }

    #[test]
    fn spans_index_the_original_pattern() {
        let toks = tokenize("(relname _)");
        let words: Vec<(usize, usize)> = toks.iter().map(|t| (t.start, t.end)).collect();
        assert_eq!(words, vec![(0, 1), (1, 8), (9, 10), (10, 11)]);
    }
}
