// Zero-copy tokenization with logos
// Tokens borrow their text from the query, nothing is copied here.

use logos::Logos;
use std::fmt;
use std::ops::Range;

/// A token borrowing its text from the original input.
#[derive(Clone, Debug, PartialEq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl<'a> Token<'a> {
    pub fn new(text: &'a str, kind: TokenKind, span: Range<usize>) -> Self {
        Token { text, kind, span }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.text)
    }
}

/// Token types using logos for fast tokenization
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")] // Skip whitespace
#[logos(skip r"--[^\n]*")] // Skip SQL comments
pub enum TokenKind {
    // Keywords (case-insensitive)
    #[regex("(?i)SELECT")]
    Select,

    #[regex("(?i)DISTINCT")]
    Distinct,

    #[regex("(?i)FROM")]
    From,

    #[regex("(?i)WHERE")]
    Where,

    #[regex("(?i)GROUP")]
    Group,

    #[regex("(?i)BY")]
    By,

    #[regex("(?i)HAVING")]
    Having,

    #[regex("(?i)ORDER")]
    Order,

    #[regex("(?i)ASC")]
    Asc,

    #[regex("(?i)DESC")]
    Desc,

    #[regex("(?i)LIMIT")]
    Limit,

    #[regex("(?i)OFFSET")]
    Offset,

    #[regex("(?i)WITH")]
    With,

    #[regex("(?i)RECURSIVE")]
    Recursive,

    #[regex("(?i)AS")]
    As,

    #[regex("(?i)UNION")]
    Union,

    #[regex("(?i)ALL")]
    All,

    #[regex("(?i)AND")]
    And,

    #[regex("(?i)OR")]
    Or,

    #[regex("(?i)NOT")]
    Not,

    #[regex("(?i)IS")]
    Is,

    #[regex("(?i)NULL")]
    Null,

    #[regex("(?i)TRUE")]
    True,

    #[regex("(?i)FALSE")]
    False,

    #[regex("(?i)IN")]
    In,

    #[regex("(?i)BETWEEN")]
    Between,

    #[regex("(?i)LIKE")]
    Like,

    #[regex("(?i)CASE")]
    Case,

    #[regex("(?i)WHEN")]
    When,

    #[regex("(?i)THEN")]
    Then,

    #[regex("(?i)ELSE")]
    Else,

    #[regex("(?i)END")]
    End,

    #[regex("(?i)JOIN")]
    Join,

    #[regex("(?i)INNER")]
    Inner,

    #[regex("(?i)LEFT")]
    Left,

    #[regex("(?i)RIGHT")]
    Right,

    #[regex("(?i)FULL")]
    Full,

    #[regex("(?i)OUTER")]
    Outer,

    #[regex("(?i)CROSS")]
    Cross,

    #[regex("(?i)ON")]
    On,

    #[regex("(?i)USING")]
    Using,

    #[regex("(?i)INSERT")]
    Insert,

    #[regex("(?i)INTO")]
    Into,

    #[regex("(?i)VALUES")]
    Values,

    #[regex("(?i)UPDATE")]
    Update,

    #[regex("(?i)SET")]
    Set,

    #[regex("(?i)DELETE")]
    Delete,

    // Identifiers and literals
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    /// Backtick or double-quoted identifier, quotes included in the text
    #[regex(r"`[^`]*`")]
    #[regex(r#""[^"]*""#)]
    QuotedIdentifier,

    #[regex(r"'([^'\\]|\\.)*'")]
    String,

    #[regex(r"-?[0-9]+")]
    Number,

    #[regex(r"-?[0-9]+\.[0-9]+")]
    Float,

    // Operators
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("=")]
    Equal,

    #[token("!=")]
    #[token("<>")]
    NotEqual,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    #[token("<=")]
    LessEqual,

    #[token(">=")]
    GreaterEqual,

    // Delimiters
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token(".")]
    Dot,

    /// Input the lexer could not classify, kept so the parser can point at it
    Error,

    // End of input
    Eof,
}

impl TokenKind {
    /// Tokens that may name a column, table or alias.
    pub fn is_identifier(self) -> bool {
        matches!(self, TokenKind::Identifier | TokenKind::QuotedIdentifier)
    }
}

/// Tokenize `input` without copying; the stream always ends in `Eof`.
/// Unrecognised input becomes an `Error` token rather than being skipped.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let kind = result.unwrap_or(TokenKind::Error);
        let span = lexer.span();
        let text = input.get(span.clone()).unwrap_or_default();
        tokens.push(Token::new(text, kind, span));
    }

    let len = input.len();
    tokens.push(Token::new("", TokenKind::Eof, len..len));

    tokens
}
