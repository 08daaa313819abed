// expressions_tests.rs

use crate::error::ExprError;
use crate::expressions::*;
use crate::riscv::Word;
use proptest::prelude::*;

fn malformed(result: Result<Word, ExprError>) -> bool {
    matches!(result, Err(ExprError::Malformed(_)))
}

#[test]
fn test_single_number() {
    assert_eq!(evaluate("42"), Ok(42));
    assert_eq!(evaluate("  7  "), Ok(7));
    assert_eq!(evaluate("0x10"), Ok(16));
    assert_eq!(evaluate("0xFFFFFFFF"), Ok(0xffff_ffff));
}

#[test]
fn test_precedence() {
    assert_eq!(evaluate("1+2*3"), Ok(7));
    assert_eq!(evaluate("2*3+1"), Ok(7));
    assert_eq!(evaluate("(1+2)*3"), Ok(9));
    assert_eq!(evaluate("1 + 2 == 3"), Ok(1));
    assert_eq!(evaluate("2 * 2 == 3"), Ok(0));
}

#[test]
fn test_left_associativity() {
    assert_eq!(evaluate("10-2-3"), Ok(5));
    assert_eq!(evaluate("100/10/5"), Ok(2));
    assert_eq!(evaluate("8/2*4"), Ok(16));
}

#[test]
fn test_nested_parens() {
    assert_eq!(evaluate("((4))"), Ok(4));
    assert_eq!(evaluate("(1+2)*(3+4)"), Ok(21));
    assert_eq!(evaluate("((1+2)*(3-1))/2"), Ok(3));
}

#[test]
fn test_wrapping_arithmetic() {
    assert_eq!(evaluate("0-1"), Ok(0xffff_ffff));
    assert_eq!(evaluate("0xffffffff+2"), Ok(1));
    assert_eq!(evaluate("0x10000*0x10000"), Ok(0));
}

#[test]
fn test_oversized_literals_are_rejected() {
    assert_eq!(evaluate("4294967295"), Ok(0xffff_ffff));
    assert_eq!(evaluate("4294967296"), Err(ExprError::Conversion("4294967296".to_string())));
    assert_eq!(evaluate("4294967297"), Err(ExprError::Conversion("4294967297".to_string())));
    assert_eq!(evaluate("0x100000000"), Err(ExprError::Conversion("0x100000000".to_string())));
    assert_eq!(evaluate("1 + 99999999999"), Err(ExprError::Conversion("99999999999".to_string())));
}

#[test]
fn test_signed_division() {
    assert_eq!(evaluate("7/2"), Ok(3));
    assert_eq!(evaluate("(0-7)/2"), Ok((-3i32) as Word));
    assert_eq!(evaluate("0xfffffff8/2"), Ok((-4i32) as Word));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(evaluate("1/0"), Err(ExprError::DivisionByZero));
    assert_eq!(evaluate("1/(2-2)"), Err(ExprError::DivisionByZero));
}

#[test]
fn test_unbalanced_parens() {
    assert!(malformed(evaluate("(1+2")));
    assert!(malformed(evaluate("1+2)")));
    assert!(malformed(evaluate(")1+2(")));
    assert!(malformed(evaluate("(1+2))")));
}

#[test]
fn test_missing_operands() {
    assert!(malformed(evaluate("1+")));
    assert!(malformed(evaluate("*2")));
    assert!(malformed(evaluate("()")));
    assert!(malformed(evaluate("1 2")));
}

#[test]
fn test_non_number_operand() {
    assert_eq!(evaluate("+"), Err(ExprError::Conversion("+".to_string())));
    assert_eq!(evaluate("(+)"), Err(ExprError::Conversion("+".to_string())));
}

#[test]
fn test_empty_expression() {
    assert_eq!(evaluate(""), Err(ExprError::Empty));
    assert_eq!(evaluate("   "), Err(ExprError::Empty));
}

#[test]
fn test_lex_error_propagates() {
    assert!(matches!(evaluate("1 + a"), Err(ExprError::Lex { position: 4, .. })));
}

#[derive(Debug, Clone)]
enum Tree {
    Leaf(Word),
    Op(char, Box<Tree>, Box<Tree>),
}

impl Tree {
    fn render(&self) -> String {
        match self {
            Tree::Leaf(n) => n.to_string(),
            Tree::Op(op, a, b) => format!("({} {} {})", a.render(), op, b.render()),
        }
    }

    fn value(&self) -> Option<Word> {
        match self {
            Tree::Leaf(n) => Some(*n),
            Tree::Op(op, a, b) => {
                let (a, b) = (a.value()?, b.value()?);
                match op {
                    '+' => Some(a.wrapping_add(b)),
                    '-' => Some(a.wrapping_sub(b)),
                    '*' => Some(a.wrapping_mul(b)),
                    '/' if b == 0 => None,
                    '/' => Some((a as i32).wrapping_div(b as i32) as Word),
                    _ => unreachable!(),
                }
            }
        }
    }
}

fn tree() -> impl Strategy<Value = Tree> {
    let leaf = (0u32..1000).prop_map(Tree::Leaf);
    leaf.prop_recursive(4, 32, 2, |inner| {
        (prop::sample::select(vec!['+', '-', '*', '/']), inner.clone(), inner)
            .prop_map(|(op, a, b)| Tree::Op(op, Box::new(a), Box::new(b)))
    })
}

proptest! {
    #[test]
    fn test_parenthesized_trees_match_reference(t in tree()) {
        let expected = t.value().ok_or(ExprError::DivisionByZero);
        prop_assert_eq!(evaluate(&t.render()), expected);
    }
}
