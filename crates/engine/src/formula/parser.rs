// Formula parser - converts an infix formula string into postfix tokens
// Supports: non-negative integer literals, cell refs (A0, AA34), + - * / and parentheses

use crate::cell_id::CellId;
use crate::error::ParseError;

use super::token::{Operator, Token};

/// Parse a formula (without its leading `=`) into a postfix token sequence.
///
/// Uses shunting-yard with the operator priorities from [`Operator::priority`].
/// Operators of equal priority pop each other, which makes every operator
/// left-associative.
///
/// A blank formula is [`ParseError::Empty`], never an empty `Ok`.
pub fn parse(formula: &str) -> Result<Vec<Token>, ParseError> {
    if formula.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut output: Vec<Token> = Vec::new();
    let mut operators: Vec<Operator> = Vec::new();
    let mut index = 0;

    while let Some(ch) = formula[index..].chars().next() {
        match ch {
            c if c.is_whitespace() => {
                index += c.len_utf8();
            }
            '+' => {
                push_operator(Operator::Plus, &mut operators, &mut output);
                index += 1;
            }
            '-' => {
                push_operator(Operator::Minus, &mut operators, &mut output);
                index += 1;
            }
            '*' => {
                push_operator(Operator::Mult, &mut operators, &mut output);
                index += 1;
            }
            '/' => {
                push_operator(Operator::Div, &mut operators, &mut output);
                index += 1;
            }
            '(' => {
                operators.push(Operator::LeftParen);
                index += 1;
            }
            ')' => {
                loop {
                    match operators.pop() {
                        Some(Operator::LeftParen) => break,
                        Some(op) => output.push(Token::Operator(op)),
                        None => return Err(ParseError::UnbalancedParen { position: index }),
                    }
                }
                index += 1;
            }
            '0'..='9' => {
                let (value, end) = scan_literal(formula, index)?;
                output.push(Token::Literal(value));
                index = end;
            }
            'A'..='Z' => {
                let (cell, end) = CellId::scan(formula, index)?;
                output.push(Token::Cell(cell));
                index = end;
            }
            _ => return Err(ParseError::UnexpectedCharacter { ch, position: index }),
        }
    }

    while let Some(op) = operators.pop() {
        if op == Operator::LeftParen {
            return Err(ParseError::UnterminatedGroup);
        }
        output.push(Token::Operator(op));
    }

    Ok(output)
}

/// Pop every stacked operator that binds at least as tightly as `op`, then push `op`.
fn push_operator(op: Operator, operators: &mut Vec<Operator>, output: &mut Vec<Token>) {
    while let Some(&top) = operators.last() {
        if top == Operator::LeftParen || top.priority() < op.priority() {
            break;
        }
        operators.pop();
        output.push(Token::Operator(top));
    }
    operators.push(op);
}

fn scan_literal(input: &str, start: usize) -> Result<(i64, usize), ParseError> {
    let bytes = input.as_bytes();
    let mut index = start;
    let mut value: i64 = 0;

    while let Some(b) = bytes.get(index).filter(|b| b.is_ascii_digit()) {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((b - b'0') as i64))
            .ok_or(ParseError::LiteralOutOfRange { position: start })?;
        index += 1;
    }

    Ok((value, index))
}
