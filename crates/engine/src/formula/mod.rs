// Formula parsing and evaluation

pub mod parser;
pub mod token;
pub mod tree;

use crate::error::ParseError;

use self::tree::ExpressionTree;

/// Parse formula text (no leading `=`) straight into an expression tree.
pub fn compile(formula: &str) -> Result<ExpressionTree, ParseError> {
    ExpressionTree::build(parser::parse(formula)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_reports_first_failure() {
        assert_eq!(compile(""), Err(ParseError::Empty));
        assert_eq!(compile("1+"), Err(ParseError::MissingOperand));
        assert_eq!(compile("(1"), Err(ParseError::UnterminatedGroup));
        assert_eq!(compile("4*(A0+1)").unwrap().render(), "4*A0+1");
    }
}
