//! Expression tree built from a postfix token sequence.
//!
//! Nodes live in a flat arena in postfix order: both children of a node are
//! stored before it and the root is the last node. Building, evaluation and
//! rendering are all plain loops over that arena (plus an explicit stack for
//! the in-order walk), so a deeply nested formula cannot overflow the call
//! stack.

use crate::cell_id::CellId;
use crate::error::{EvalError, ParseError};

use super::token::{Operator, Token};

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Literal(i64),
    Cell(CellId),
    Branch { op: Operator, left: usize, right: usize },
}

impl Node {
    fn token(&self) -> Token {
        match *self {
            Node::Literal(n) => Token::Literal(n),
            Node::Cell(id) => Token::Cell(id),
            Node::Branch { op, .. } => Token::Operator(op),
        }
    }
}

/// Binary tree over tokens. Leaves are literals or cell references,
/// internal nodes are operators.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionTree {
    nodes: Vec<Node>,
}

impl ExpressionTree {
    /// Build a tree from postfix tokens.
    ///
    /// Equivalent to consuming the sequence from its end, building each
    /// operator's right subtree before its left one.
    ///
    /// Fails with [`ParseError::MissingOperand`] when an operator lacks operands
    /// (or the sequence is empty) and [`ParseError::DanglingOperand`] when
    /// tokens are left over after the root is complete.
    pub fn build(postfix: Vec<Token>) -> Result<Self, ParseError> {
        let mut nodes: Vec<Node> = Vec::with_capacity(postfix.len());
        let mut pending: Vec<usize> = Vec::new();

        for token in postfix {
            let node = match token {
                Token::Literal(n) => Node::Literal(n),
                Token::Cell(id) => Node::Cell(id),
                Token::Operator(Operator::LeftParen) => {
                    return Err(ParseError::UnterminatedGroup);
                }
                Token::Operator(op) => {
                    let right = pending.pop().ok_or(ParseError::MissingOperand)?;
                    let left = pending.pop().ok_or(ParseError::MissingOperand)?;
                    Node::Branch { op, left, right }
                }
            };
            pending.push(nodes.len());
            nodes.push(node);
        }

        match pending.len() {
            0 => Err(ParseError::MissingOperand),
            1 => Ok(Self { nodes }),
            _ => Err(ParseError::DanglingOperand),
        }
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Cell references in the tree, in postfix order. May contain duplicates.
    pub fn references(&self) -> impl Iterator<Item = CellId> + '_ {
        self.nodes.iter().filter_map(|node| match node {
            Node::Cell(id) => Some(*id),
            _ => None,
        })
    }

    /// The tree's tokens back in postfix order.
    pub fn postfix(&self) -> Vec<Token> {
        self.nodes.iter().map(Node::token).collect()
    }

    /// Evaluate the tree with checked integer arithmetic.
    ///
    /// `lookup` resolves a cell reference to that cell's current value, or to
    /// the error the referenced cell is carrying. Division truncates toward zero.
    pub fn evaluate<F>(&self, lookup: F) -> Result<i64, EvalError>
    where
        F: Fn(CellId) -> Result<i64, EvalError>,
    {
        let mut values: Vec<i64> = Vec::with_capacity(self.nodes.len());

        for node in &self.nodes {
            let value = match *node {
                Node::Literal(n) => n,
                Node::Cell(id) => lookup(id)?,
                Node::Branch { op, left, right } => apply(op, values[left], values[right])?,
            };
            values.push(value);
        }

        Ok(values.last().copied().unwrap_or(0))
    }

    /// Canonical infix text: an in-order walk with no separators and no
    /// parentheses. `(1+2)*3` renders as `1+2*3`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let Some(root) = self.nodes.len().checked_sub(1) else {
            return out;
        };

        let mut stack: Vec<usize> = Vec::new();
        let mut current = Some(root);

        while current.is_some() || !stack.is_empty() {
            while let Some(index) = current {
                stack.push(index);
                current = match self.nodes[index] {
                    Node::Branch { left, .. } => Some(left),
                    _ => None,
                };
            }
            if let Some(index) = stack.pop() {
                let node = &self.nodes[index];
                out.push_str(&node.token().to_string());
                current = match *node {
                    Node::Branch { right, .. } => Some(right),
                    _ => None,
                };
            }
        }

        out
    }
}

fn apply(op: Operator, left: i64, right: i64) -> Result<i64, EvalError> {
    match op {
        Operator::Plus => left.checked_add(right).ok_or(EvalError::Overflow),
        Operator::Minus => left.checked_sub(right).ok_or(EvalError::Overflow),
        Operator::Mult => left.checked_mul(right).ok_or(EvalError::Overflow),
        Operator::Div => {
            if right == 0 {
                return Err(EvalError::DivisionByZero);
            }
            left.checked_div(right).ok_or(EvalError::Overflow)
        }
        Operator::LeftParen => unreachable!("build() never creates a grouping node"),
    }
}
