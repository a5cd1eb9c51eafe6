use crate::ast::schema;
use crate::pattern::expr::{CaptureKey, Expr, Lit};
use crate::pattern::token::Token;
use crate::pattern::token_kind::TokenKind;
use crate::pattern::tokenizer::tokenize;
use crate::*;

/// Nesting bound; patterns deeper than this are rejected rather than risking
/// the parser's own stack.
const MAX_DEPTH: usize = 128;

/// Compile pattern text into an expression tree.
///
/// The only errors surfaced to callers of the crate originate here:
/// unmatched brackets, empty groups and capture names, zero backreferences,
/// unterminated strings, trailing input. Each carries the byte position of
/// the offending token.
pub fn compile(pattern: &str) -> Result<Expr> {
    let tokens = tokenize(pattern);
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        next_capture: 1,
        end: pattern.len(),
        depth: 0,
    };
    let expr = parser.parse_expr()?;
    match parser.peek() {
        Some(t) => Err(Error::compile(t.start, "unexpected trailing input")),
        None => {
            debug!(pattern, "compiled pattern");
            Ok(expr)
        }
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Appearance-ordered index handed to the next anonymous capture.
    next_capture: usize,
    /// Byte length of the pattern, reported as the position of end-of-input
    /// errors.
    end: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn here(&self) -> usize {
        self.peek().map(|t| t.start).unwrap_or(self.end)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::compile(self.here(), "pattern nested too deeply"));
        }
        let expr = self.parse_expr_inner();
        self.depth -= 1;
        expr
    }

    fn parse_expr_inner(&mut self) -> Result<Expr> {
        let position = self.here();
        let Some(token) = self.peek().cloned() else {
            return Err(Error::compile(position, "expected a pattern"));
        };
        match token.kind {
            TokenKind::ParenOpen => self.parse_form(),
            TokenKind::BracketOpen => {
                let items = self.parse_group(TokenKind::BracketClose, "[")?;
                Ok(Expr::All(items))
            }
            TokenKind::BraceOpen => {
                let items = self.parse_group(TokenKind::BraceClose, "{")?;
                Ok(Expr::Any(items))
            }
            TokenKind::Bang => {
                self.bump();
                Ok(Expr::not(self.parse_expr()?))
            }
            TokenKind::Question => {
                self.bump();
                Ok(Expr::maybe(self.parse_expr()?))
            }
            TokenKind::Caret => {
                self.bump();
                Ok(Expr::has_child(self.parse_expr()?))
            }
            TokenKind::Dollar => self.parse_capture(),
            TokenKind::Backref(digit) => {
                self.bump();
                if digit == 0 {
                    return Err(Error::compile(position, "backreference index must be 1-9"));
                }
                Ok(Expr::Backref(digit as usize))
            }
            TokenKind::Word(word) => {
                self.bump();
                Ok(word_expr(&word))
            }
            TokenKind::Str(text) => {
                self.bump();
                Ok(Expr::Literal(Lit::Str(text)))
            }
            TokenKind::UnterminatedStr(_) => {
                Err(Error::compile(position, "unterminated string literal"))
            }
            TokenKind::Number(text) => {
                self.bump();
                number_literal(&text, position)
            }
            TokenKind::Ellipsis => {
                self.bump();
                Ok(Expr::AnyChildren)
            }
            TokenKind::ParenClose | TokenKind::BracketClose | TokenKind::BraceClose => Err(
                Error::compile(position, "unexpected closing delimiter"),
            ),
            TokenKind::Other(c) => Err(Error::compile(
                position,
                format!("unexpected character {c:?}"),
            )),
        }
    }

    /// `( … )`: attribute dispatch when the head is a known field name,
    /// otherwise head-plus-children sequence.
    fn parse_form(&mut self) -> Result<Expr> {
        let open = self.here();
        self.bump();

        // Attribute head: a bare lower-case word the schema knows.
        if let Some(word) = self.peek().and_then(|t| t.word()).map(str::to_string) {
            if word.starts_with(|c: char| c.is_ascii_lowercase())
                && !is_reserved_word(&word)
                && schema::is_known_field(&word)
            {
                self.bump();
                let mut items = self.parse_items(TokenKind::ParenClose, open, "(")?;
                let inner = match items.len() {
                    0 => Expr::Wildcard,
                    1 => items.pop().unwrap_or(Expr::Wildcard),
                    _ => Expr::All(items),
                };
                return Ok(Expr::attribute(word, inner));
            }
        }

        let mut items = self.parse_items(TokenKind::ParenClose, open, "(")?;
        if items.is_empty() {
            return Err(Error::compile(open, "empty pattern group"));
        }
        // Past the head, a bare `...` is a positional gap, not a node test.
        for item in items.iter_mut().skip(1) {
            if *item == Expr::AnyChildren {
                *item = Expr::Ellipsis;
            }
        }
        if items.len() == 1 {
            return Ok(items.pop().unwrap_or(Expr::Wildcard));
        }
        // `(X ...)` with nothing after the gap: X with at least one child.
        if items.len() == 2 && items[1] == Expr::Ellipsis {
            let head = items.swap_remove(0);
            return Ok(Expr::All(vec![head, Expr::AnyChildren]));
        }
        Ok(Expr::Seq(items))
    }

    fn parse_group(&mut self, closer: TokenKind, opener: &str) -> Result<Vec<Expr>> {
        let open = self.here();
        self.bump();
        let items = self.parse_items(closer, open, opener)?;
        if items.is_empty() {
            return Err(Error::compile(open, "empty pattern group"));
        }
        Ok(items)
    }

    fn parse_items(&mut self, closer: TokenKind, open: usize, opener: &str) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return Err(Error::compile(open, format!("unmatched {opener:?}")));
                }
                Some(t) if t.kind == closer => {
                    self.bump();
                    return Ok(items);
                }
                Some(_) => items.push(self.parse_expr()?),
            }
        }
    }

    /// `$…`: `$name expr` and `$name` bind by name; any other operand makes
    /// an anonymous capture counted for backreferences.
    fn parse_capture(&mut self) -> Result<Expr> {
        let position = self.here();
        self.bump();
        match self.peek() {
            None => Err(Error::compile(self.end, "capture name is empty")),
            Some(t) if t.kind.is_closer() => {
                Err(Error::compile(position, "capture name is empty"))
            }
            Some(t) => {
                let name = t
                    .word()
                    .filter(|w| {
                        w.starts_with(|c: char| c.is_ascii_lowercase()) && !is_reserved_word(w)
                    })
                    .map(str::to_string);
                match name {
                    Some(name) => {
                        self.bump();
                        let followed = self.peek().is_some_and(|t| !t.kind.is_closer());
                        let inner = if followed {
                            self.parse_expr()?
                        } else {
                            Expr::Wildcard
                        };
                        Ok(Expr::capture(CaptureKey::Named(name), inner))
                    }
                    None => {
                        let index = self.next_capture;
                        self.next_capture += 1;
                        let inner = self.parse_expr()?;
                        Ok(Expr::capture(CaptureKey::Index(index), inner))
                    }
                }
            }
        }
    }
}

fn is_reserved_word(word: &str) -> bool {
    matches!(word, "_" | "nil" | "true" | "false")
}

fn word_expr(word: &str) -> Expr {
    match word {
        "_" => Expr::Wildcard,
        "nil" => Expr::Nil,
        "true" => Expr::Literal(Lit::Bool(true)),
        "false" => Expr::Literal(Lit::Bool(false)),
        _ if word.starts_with(|c: char| c.is_ascii_uppercase()) => {
            Expr::NodeType(word.to_string())
        }
        _ => Expr::Literal(Lit::Str(word.to_string())),
    }
}

fn number_literal(text: &str, position: usize) -> Result<Expr> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Expr::Literal(Lit::Int(i)));
    }
    text.parse::<f64>()
        .map(|f| Expr::Literal(Lit::Float(f)))
        .map_err(|_| Error::compile(position, format!("invalid number {text:?}")))
}
