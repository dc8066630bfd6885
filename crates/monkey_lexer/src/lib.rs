pub mod error;
pub mod lexer;
pub mod token;

pub use error::{LexError, LexResult};
pub use lexer::Lexer;
pub use token::{lookup_keyword, Span, Token, TokenKind};

pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize();
    (tokens, lexer.errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let (tokens, errors) = tokenize(src);
        assert!(errors.is_empty(), "Unexpected errors: {:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source() {
        let (tokens, errors) = tokenize("");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_integer_literals() {
        let k = kinds("5 10 999");
        assert_eq!(k[0], TokenKind::IntLiteral(5));
        assert_eq!(k[1], TokenKind::IntLiteral(10));
        assert_eq!(k[2], TokenKind::IntLiteral(999));
    }

    #[test]
    fn test_string_literal() {
        let (tokens, errors) = tokenize(r#""hello world""#);
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral("hello world".to_string()));
    }

    #[test]
    fn test_bool_literals() {
        let k = kinds("true false");
        assert_eq!(k[0], TokenKind::BoolLiteral(true));
        assert_eq!(k[1], TokenKind::BoolLiteral(false));
    }

    #[test]
    fn test_keywords() {
        let k = kinds("fn let if else return");
        assert_eq!(k[0], TokenKind::Function);
        assert_eq!(k[1], TokenKind::Let);
        assert_eq!(k[2], TokenKind::If);
        assert_eq!(k[3], TokenKind::Else);
        assert_eq!(k[4], TokenKind::Return);
    }

    #[test]
    fn test_operators() {
        let k = kinds("+ - * / < > == != ! =");
        assert_eq!(k[0], TokenKind::Plus);
        assert_eq!(k[1], TokenKind::Minus);
        assert_eq!(k[2], TokenKind::Asterisk);
        assert_eq!(k[3], TokenKind::Slash);
        assert_eq!(k[4], TokenKind::Lt);
        assert_eq!(k[5], TokenKind::Gt);
        assert_eq!(k[6], TokenKind::Eq);
        assert_eq!(k[7], TokenKind::NotEq);
        assert_eq!(k[8], TokenKind::Bang);
        assert_eq!(k[9], TokenKind::Assign);
    }

    #[test]
    fn test_delimiters() {
        let k = kinds("(){}[],;:");
        assert_eq!(
            k,
            vec![
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Colon,
            ]
        );
    }

    #[test]
    fn test_identifiers() {
        let k = kinds("foo bar_baz _private");
        assert_eq!(k[0], TokenKind::Identifier("foo".to_string()));
        assert_eq!(k[1], TokenKind::Identifier("bar_baz".to_string()));
        assert_eq!(k[2], TokenKind::Identifier("_private".to_string()));
    }

    #[test]
    fn test_comment_skipped() {
        let k = kinds("let x = 1; // a comment\nlet y = 2;");
        assert_eq!(k[0], TokenKind::Let);
        assert!(k.contains(&TokenKind::Identifier("y".to_string())));
    }

    #[test]
    fn test_escape_sequences() {
        let (tokens, errors) = tokenize(r#""\n\t\\""#);
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral("\n\t\\".to_string()));
    }

    #[test]
    fn test_unterminated_string_error() {
        let (_tokens, errors) = tokenize("\"hello");
        assert!(!errors.is_empty());
        assert!(matches!(errors[0], LexError::UnterminatedString { .. }));
    }

    #[test]
    fn test_function_literal_program() {
        let src = "let add = fn(x, y) { x + y; }; add(1, 2);";
        let k = kinds(src);
        assert_eq!(k[0], TokenKind::Let);
        assert_eq!(k[1], TokenKind::Identifier("add".to_string()));
        assert_eq!(k[2], TokenKind::Assign);
        assert_eq!(k[3], TokenKind::Function);
    }

    #[test]
    fn test_illegal_char() {
        let (tokens, errors) = tokenize("@");
        assert!(errors.is_empty());
        assert!(matches!(tokens[0].kind, TokenKind::Illegal(b'@')));
    }
}
