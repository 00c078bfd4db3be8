// Formula tokens - the atomic units produced by the parser

use crate::cell_id::CellId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Mult,
    Div,
    /// Grouping marker. Lives only on the parser's operator stack.
    LeftParen,
}

impl Operator {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(Operator::Plus),
            '-' => Some(Operator::Minus),
            '*' => Some(Operator::Mult),
            '/' => Some(Operator::Div),
            '(' => Some(Operator::LeftParen),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Operator::Plus => '+',
            Operator::Minus => '-',
            Operator::Mult => '*',
            Operator::Div => '/',
            Operator::LeftParen => '(',
        }
    }

    /// Binding priority: `+ -` = 0, `* /` = 1, `(` = 2.
    pub fn priority(self) -> u8 {
        match self {
            Operator::Plus | Operator::Minus => 0,
            Operator::Mult | Operator::Div => 1,
            Operator::LeftParen => 2,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One lexical unit of a formula. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Literal(i64),
    Cell(CellId),
    Operator(Operator),
}

impl Token {
    pub fn is_operand(&self) -> bool {
        matches!(self, Token::Literal(_) | Token::Cell(_))
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Literal(n) => write!(f, "{}", n),
            Token::Cell(id) => write!(f, "{}", id),
            Token::Operator(op) => write!(f, "{}", op),
        }
    }
}

/// Render a token sequence separated by single spaces (`A0 3 +`).
pub fn join_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
