pub mod ast;
pub mod error;
pub mod parser;

pub use ast::*;
pub use error::{ParseError, ParseResult};
pub use parser::Parser;

use monkey_lexer::tokenize as lex;

pub fn parse(source: &str) -> (Program, Vec<monkey_lexer::LexError>, Vec<ParseError>) {
    let (tokens, lex_errors) = lex(source);
    let mut parser = Parser::new(tokens);
    let program = parser.parse();
    (program, lex_errors, parser.errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        let (program, lex_errors, parse_errors) = parse(src);
        assert!(lex_errors.is_empty(), "Lex errors: {:?}", lex_errors);
        assert!(parse_errors.is_empty(), "Parse errors: {:?}", parse_errors);
        program
    }

    fn first_stmt(src: &str) -> StmtKind {
        parse_ok(src).stmts.into_iter().next().unwrap().inner
    }

    fn first_expr(src: &str) -> ExprKind {
        match first_stmt(src) {
            StmtKind::Expr(e) => e.inner,
            StmtKind::Let { value, .. } => value.inner,
            other => panic!("Expected Expr/Let, got {:?}", other),
        }
    }

    #[test]
    fn test_int_literal() {
        assert_eq!(first_expr("5;"), ExprKind::Int(5));
    }

    #[test]
    fn test_bool_literal() {
        assert_eq!(first_expr("true;"), ExprKind::Bool(true));
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(first_expr(r#""hello";"#), ExprKind::Str("hello".to_string()));
    }

    #[test]
    fn test_let_stmt() {
        assert!(matches!(first_stmt("let x = 5;"), StmtKind::Let { name, .. } if name == "x"));
    }

    #[test]
    fn test_return_stmt() {
        assert!(matches!(first_stmt("return 10;"), StmtKind::Return(Some(_))));
    }

    #[test]
    fn test_prefix_bang() {
        assert!(matches!(
            first_expr("!5;"),
            ExprKind::Prefix { op: PrefixOp::Not, .. }
        ));
    }

    #[test]
    fn test_prefix_minus() {
        assert!(matches!(
            first_expr("-15;"),
            ExprKind::Prefix { op: PrefixOp::Neg, .. }
        ));
    }

    #[test]
    fn test_infix_operators() {
        for (src, op) in [
            ("5 + 5;", InfixOp::Add),
            ("5 - 5;", InfixOp::Sub),
            ("5 * 5;", InfixOp::Mul),
            ("5 / 5;", InfixOp::Div),
            ("5 == 5;", InfixOp::Eq),
            ("5 != 5;", InfixOp::NotEq),
            ("5 < 5;", InfixOp::Lt),
            ("5 > 5;", InfixOp::Gt),
        ] {
            assert!(matches!(first_expr(src), ExprKind::Infix { op: found, .. } if found == op));
        }
    }

    #[test]
    fn test_operator_precedence_mul_over_add() {
        match first_expr("1 + 2 * 3;") {
            ExprKind::Infix { op: InfixOp::Add, right, .. } => {
                assert!(matches!(right.inner, ExprKind::Infix { op: InfixOp::Mul, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_grouped_expression() {
        match first_expr("(1 + 2) * 3;") {
            ExprKind::Infix { op: InfixOp::Mul, left, .. } => {
                assert!(matches!(left.inner, ExprKind::Infix { op: InfixOp::Add, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_if_expression() {
        match first_expr("if (x < y) { x } else { y }") {
            ExprKind::If { alternative, .. } => assert!(alternative.is_some()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_function_literal() {
        match first_expr("fn(x, y) { x + y; }") {
            ExprKind::FunctionLiteral { params, .. } => assert_eq!(params, vec!["x", "y"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_named_function_literal_from_let() {
        match first_stmt("let f = fn(x) { x; };") {
            StmtKind::Let { value, .. } => match value.inner {
                ExprKind::FunctionLiteral { name, .. } => assert_eq!(name, Some("f".to_string())),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_call_expression() {
        match first_expr("add(1, 2 * 3, 4 + 5);") {
            ExprKind::Call { args, .. } => assert_eq!(args.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_array_literal() {
        match first_expr("[1, 2 * 2, 3 + 3]") {
            ExprKind::ArrayLiteral(items) => assert_eq!(items.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_index_expression() {
        assert!(matches!(first_expr("myArray[1 + 1]"), ExprKind::Index { .. }));
    }

    #[test]
    fn test_hash_literal_string_keys() {
        match first_expr(r#"{"one": 1, "two": 2, "three": 3}"#) {
            ExprKind::HashLiteral(pairs) => assert_eq!(pairs.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_hash_literal() {
        match first_expr("{}") {
            ExprKind::HashLiteral(pairs) => assert!(pairs.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_recovery_continues_parsing() {
        let (program, _, parse_errors) = parse("let = 5; let y = 10;");
        assert!(!parse_errors.is_empty());
        assert!(!program.stmts.is_empty());
    }

    #[test]
    fn test_full_program() {
        let src = "let x = 5;\nlet add = fn(a, b) { return a + b; };\nlet result = add(x, 10);\nif (result > 10) { puts(result); } else { puts(0); }";
        let (program, lex_errors, parse_errors) = parse(src);
        assert!(lex_errors.is_empty(), "Lex: {:?}", lex_errors);
        assert!(parse_errors.is_empty(), "Parse: {:?}", parse_errors);
        assert_eq!(program.stmts.len(), 4);
    }
}
