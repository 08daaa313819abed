// tokenizer.rs
//
// Lexer for debugger expressions.
//
// At each position the rules below are tried in order and the first one that
// matches a non-empty prefix wins. Whitespace is recognised and dropped.

use crate::error::ExprError;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    HexNumber,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Eq,
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: &str) -> Self {
        Token { kind, text: text.to_string() }
    }
}

enum Rule {
    Spaces,
    Literal(&'static str),
    HexDigits,
    Digits,
}

impl Rule {
    /// Length of the prefix of `rest` this rule accepts, if any.
    fn match_len(&self, rest: &str) -> Option<usize> {
        let len = match self {
            Rule::Spaces => rest.find(|c: char| c != ' ' && c != '\t').unwrap_or(rest.len()),
            Rule::Literal(lit) => {
                if rest.starts_with(lit) {
                    lit.len()
                } else {
                    0
                }
            }
            Rule::HexDigits => match rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
                Some(digits) => {
                    let n = digits.find(|c: char| !c.is_ascii_hexdigit()).unwrap_or(digits.len());
                    if n == 0 { 0 } else { n + 2 }
                }
                None => 0,
            },
            Rule::Digits => rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len()),
        };
        if len == 0 { None } else { Some(len) }
    }
}

const RULES: [(Rule, TokenKind); 10] = [
    (Rule::Spaces, TokenKind::Whitespace),
    (Rule::Literal("+"), TokenKind::Plus),
    (Rule::Literal("=="), TokenKind::Eq),
    (Rule::Literal("-"), TokenKind::Minus),
    (Rule::Literal("*"), TokenKind::Star),
    (Rule::Literal("/"), TokenKind::Slash),
    (Rule::HexDigits, TokenKind::HexNumber),
    (Rule::Digits, TokenKind::Number),
    (Rule::Literal("("), TokenKind::LParen),
    (Rule::Literal(")"), TokenKind::RParen),
];

pub fn tokenize(expr: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut position = 0;

    'scan: while position < expr.len() {
        let rest = &expr[position..];
        for (i, (rule, kind)) in RULES.iter().enumerate() {
            let Some(len) = rule.match_len(rest) else {
                continue;
            };
            let text = &rest[..len];
            debug!(rule = i, ?kind, position, len, text, "matched token");
            position += len;
            if *kind != TokenKind::Whitespace {
                tokens.push(Token::new(*kind, text));
            }
            continue 'scan;
        }
        return Err(ExprError::Lex { position, input: expr.to_string() });
    }
    Ok(tokens)
}
