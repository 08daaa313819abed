use crate::error::ExprError;
use crate::tokenizer::*;

fn kinds(expr: &str) -> Vec<TokenKind> {
    tokenize(expr).unwrap().into_iter().map(|t| t.kind).collect()
}

#[test]
fn test_tokenize_arithmetic() {
    let tokens = tokenize("1 + 23*4").unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::new(TokenKind::Number, "1"),
            Token::new(TokenKind::Plus, "+"),
            Token::new(TokenKind::Number, "23"),
            Token::new(TokenKind::Star, "*"),
            Token::new(TokenKind::Number, "4"),
        ]
    );
}

#[test]
fn test_whitespace_is_dropped() {
    assert!(tokenize("   ").unwrap().is_empty());
    assert!(tokenize("").unwrap().is_empty());
    assert_eq!(kinds(" \t7 \t"), vec![TokenKind::Number]);
}

#[test]
fn test_tokenize_parens_and_operators() {
    assert_eq!(
        kinds("(1-2)/3"),
        vec![
            TokenKind::LParen,
            TokenKind::Number,
            TokenKind::Minus,
            TokenKind::Number,
            TokenKind::RParen,
            TokenKind::Slash,
            TokenKind::Number,
        ]
    );
}

#[test]
fn test_tokenize_hex() {
    let tokens = tokenize("0x80000000").unwrap();
    assert_eq!(tokens, vec![Token::new(TokenKind::HexNumber, "0x80000000")]);

    let tokens = tokenize("0XfF").unwrap();
    assert_eq!(tokens, vec![Token::new(TokenKind::HexNumber, "0XfF")]);
}

#[test]
fn test_tokenize_equality() {
    assert_eq!(kinds("1==1"), vec![TokenKind::Number, TokenKind::Eq, TokenKind::Number]);
}

#[test]
fn test_single_equals_is_rejected() {
    assert_eq!(tokenize("1=1"), Err(ExprError::Lex { position: 1, input: "1=1".to_string() }));
}

#[test]
fn test_unknown_character_reports_position() {
    assert_eq!(tokenize("12 $ 3"), Err(ExprError::Lex { position: 3, input: "12 $ 3".to_string() }));
}

#[test]
fn test_bare_hex_prefix_is_rejected() {
    // "0" lexes as a number, then nothing accepts "x"
    assert_eq!(tokenize("0x"), Err(ExprError::Lex { position: 1, input: "0x".to_string() }));
}
