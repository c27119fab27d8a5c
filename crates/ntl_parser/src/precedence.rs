//! Binary operator recognition for the precedence-climbing loop.

use ntl_ast::{BinaryOp, Token, TokenKind};

/// The binary operator a token denotes in expression position, if any.
/// Operator tokens map through their text; `instanceof` and `in` are
/// keywords that participate at relational precedence.
pub fn binary_op_of(token: &Token) -> Option<BinaryOp> {
    match token.kind {
        TokenKind::Operator => BinaryOp::from_str(token.text()),
        TokenKind::Keyword => match token.text() {
            "instanceof" => Some(BinaryOp::InstanceOf),
            "in" => Some(BinaryOp::In),
            _ => None,
        },
        _ => None,
    }
}

/// Compound assignment operator texts, checked at assignment precedence.
pub const ASSIGN_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", "&&=", "||=", "??=",
];

#[cfg(test)]
mod tests {
    use super::*;
    use ntl_ast::TokenValue;
    use ntl_core::Span;

    fn op(text: &str) -> Token {
        Token::new(
            TokenKind::Operator,
            TokenValue::Str(text.to_string()),
            Span::new(1, 1),
        )
    }

    fn kw(text: &str) -> Token {
        Token::new(
            TokenKind::Keyword,
            TokenValue::Str(text.to_string()),
            Span::new(1, 1),
        )
    }

    #[test]
    fn operators_resolve() {
        assert_eq!(binary_op_of(&op("|>")), Some(BinaryOp::Pipeline));
        assert_eq!(binary_op_of(&op("??")), Some(BinaryOp::Nullish));
        assert_eq!(binary_op_of(&kw("instanceof")), Some(BinaryOp::InstanceOf));
        assert_eq!(binary_op_of(&kw("in")), Some(BinaryOp::In));
    }

    #[test]
    fn non_operators_do_not() {
        assert_eq!(binary_op_of(&op("=>")), None);
        assert_eq!(binary_op_of(&kw("of")), None);
        assert_eq!(binary_op_of(&op("=")), None);
    }
}
