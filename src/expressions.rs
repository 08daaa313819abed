// expressions.rs
//
// Evaluation of debugger expressions.
//
// The token sequence is evaluated recursively over sub-slices:
//
//   - a single token must be a number literal,
//   - a sub-slice wrapped in one matching pair of parentheses is unwrapped,
//   - anything else is split at its principal operator: the rightmost
//     operator of the lowest precedence class found outside parentheses.
//     Picking the rightmost one makes operators of equal precedence
//     associate to the left.
//
// Values are 32-bit words. Addition, subtraction and multiplication wrap;
// division is signed and truncates toward zero; `==` yields 1 or 0.

use crate::error::ExprError;
use crate::riscv::Word;
use crate::tokenizer::{Token, TokenKind, tokenize};

type Result<T> = std::result::Result<T, ExprError>;

/// Tokenize and evaluate `expr`.
pub fn evaluate(expr: &str) -> Result<Word> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }
    eval(&tokens)
}

/// Evaluate an already tokenized expression.
pub fn eval(tokens: &[Token]) -> Result<Word> {
    match tokens {
        [] => Err(ExprError::Malformed("missing operand".to_string())),
        [token] => convert(token),
        _ if is_wrapped(tokens)? => eval(&tokens[1..tokens.len() - 1]),
        _ => {
            let op = principal_operator(tokens)?;
            let lhs = eval(&tokens[..op])?;
            let rhs = eval(&tokens[op + 1..])?;
            apply(tokens[op].kind, lhs, rhs)
        }
    }
}

/// Convert a literal token, most significant digit first. Literals that do
/// not fit in a word are rejected.
fn convert(token: &Token) -> Result<Word> {
    let (digits, radix) = match token.kind {
        TokenKind::Number => (token.text.as_str(), 10),
        TokenKind::HexNumber => (&token.text[2..], 16),
        _ => return Err(ExprError::Conversion(token.text.clone())),
    };
    let mut value: Word = 0;
    for ch in digits.chars() {
        value = ch
            .to_digit(radix)
            .and_then(|digit| value.checked_mul(radix)?.checked_add(digit))
            .ok_or_else(|| ExprError::Conversion(token.text.clone()))?;
    }
    Ok(value)
}

fn depth_change(kind: TokenKind) -> i32 {
    match kind {
        TokenKind::LParen => 1,
        TokenKind::RParen => -1,
        _ => 0,
    }
}

/// True when the whole slice is enclosed in one matching pair of parentheses.
///
/// The nesting depth, starting at zero, must return to zero exactly once and
/// do so at the last token. A negative depth means a `)` without its `(`.
fn is_wrapped(tokens: &[Token]) -> Result<bool> {
    if tokens[0].kind != TokenKind::LParen {
        return Ok(false);
    }
    let mut depth = 0;
    let mut closings = 0;
    for token in tokens {
        depth += depth_change(token.kind);
        if depth < 0 {
            return Err(ExprError::Malformed("unbalanced ')'".to_string()));
        }
        if depth == 0 {
            closings += 1;
        }
    }
    Ok(depth == 0 && closings == 1)
}

fn precedence(kind: TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Eq => Some(0),
        TokenKind::Plus | TokenKind::Minus => Some(1),
        TokenKind::Star | TokenKind::Slash => Some(2),
        _ => None,
    }
}

/// Index of the operator to split at.
fn principal_operator(tokens: &[Token]) -> Result<usize> {
    let mut depth = 0;
    let mut best: Option<(usize, u8)> = None;

    for (i, token) in tokens.iter().enumerate() {
        depth += depth_change(token.kind);
        if depth < 0 {
            return Err(ExprError::Malformed("unbalanced ')'".to_string()));
        }
        if depth != 0 {
            continue;
        }
        if let Some(prec) = precedence(token.kind)
            && best.is_none_or(|(_, best_prec)| prec <= best_prec)
        {
            best = Some((i, prec));
        }
    }

    if depth != 0 {
        return Err(ExprError::Malformed("unbalanced '('".to_string()));
    }
    match best {
        Some((i, _)) => Ok(i),
        None => Err(ExprError::Malformed("missing operator".to_string())),
    }
}

fn apply(kind: TokenKind, lhs: Word, rhs: Word) -> Result<Word> {
    match kind {
        TokenKind::Plus => Ok(lhs.wrapping_add(rhs)),
        TokenKind::Minus => Ok(lhs.wrapping_sub(rhs)),
        TokenKind::Star => Ok(lhs.wrapping_mul(rhs)),
        TokenKind::Slash => {
            if rhs == 0 {
                return Err(ExprError::DivisionByZero);
            }
            Ok((lhs as i32).wrapping_div(rhs as i32) as Word)
        }
        TokenKind::Eq => Ok((lhs == rhs) as Word),
        _ => Err(ExprError::Malformed(format!("unexpected operator {:?}", kind))),
    }
}
