//! Lexing and parsing of Gene Protein Reaction strings into [`Gpr`] trees
use indexmap::IndexMap;
use thiserror::Error;

use crate::metabolic_model::gene::{Gene, Gpr};

/*
GPR Grammar:
expression -> disjunction ;
disjunction -> conjunction ( "or" conjunction )* ;
conjunction -> unary ( "and" unary )* ;
unary -> "not" unary | primary ;
primary -> GENE | "(" expression ")" ;

e.g. ( Gene1 and Gene2 ) or ( Gene3 and not Gene4 )
 */

/// Parse a Gene Protein Reaction string into a GPR Tree
///
/// Genes referenced by the rule which are missing from `gene_map` are added to it.
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use mcstools_core::io::gpr::parse_gpr;
/// let mut gene_map = IndexMap::new();
/// let gpr = parse_gpr("Rv0001 and (Rv0002 or Rv0003)", &mut gene_map).unwrap();
/// assert_eq!(gene_map.len(), 3);
/// assert_eq!(gpr.to_string(), "Rv0001 and (Rv0002 or Rv0003)");
/// ```
pub fn parse_gpr(input: &str, gene_map: &mut IndexMap<String, Gene>) -> Result<Gpr, GprParseError> {
    let tokens = Lexer::new(input).scan_tokens()?;
    let mut parser = GprParser::new(tokens, gene_map);
    Ok(parser.parse()?)
}

// region Lexer
/// Represents Tokens in GPR
#[derive(Debug, PartialEq, Clone, Eq)]
enum Token {
    Identifier(String),
    And,
    Or,
    Not,
    LeftParen,
    RightParen,
    Eof,
}

struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
        }
    }

    fn scan_tokens(mut self) -> Result<Vec<Token>, LexerError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }
        self.tokens.push(Token::Eof);
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c = self.advance();
        match c {
            '(' => self.tokens.push(Token::LeftParen),
            ')' => self.tokens.push(Token::RightParen),
            c if c.is_whitespace() => {}
            c if Lexer::is_identifier_char(c) => self.read_identifier(),
            c => {
                return Err(LexerError::InvalidCharacter {
                    character: c,
                    position: self.start,
                })
            }
        }
        Ok(())
    }

    fn read_identifier(&mut self) {
        while !self.is_at_end() && Lexer::is_identifier_char(self.source[self.current]) {
            self.current += 1;
        }
        let text: String = self.source[self.start..self.current].iter().collect();
        let token = match text.as_str() {
            "and" | "And" | "AND" => Token::And,
            "or" | "Or" | "OR" => Token::Or,
            "not" | "Not" | "NOT" => Token::Not,
            _ => Token::Identifier(text),
        };
        self.tokens.push(token);
    }

    fn is_identifier_char(c: char) -> bool {
        c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | ':')
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

/// Errors raised while splitting a GPR string into tokens
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexerError {
    #[error("Invalid character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },
}
// endregion Lexer

// region Parser
/// GPR Parser
struct GprParser<'gm> {
    /// Vector of tokens from the GPR string
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
    /// Map containing the Genes
    gene_map: &'gm mut IndexMap<String, Gene>,
}

impl<'gm> GprParser<'gm> {
    fn new(tokens: Vec<Token>, gene_map: &'gm mut IndexMap<String, Gene>) -> Self {
        GprParser {
            tokens,
            current: 0,
            gene_map,
        }
    }

    /// Parse the token vector into a GPR AST
    fn parse(&mut self) -> Result<Gpr, ParseError> {
        let gpr = self.disjunction()?;
        if !self.is_at_end() {
            return Err(ParseError::EarlyTermination);
        }
        Ok(gpr)
    }

    fn disjunction(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.conjunction()?;
        while self.match_token(&Token::Or) {
            let right = self.conjunction()?;
            expr = Gpr::new_or(expr, right);
        }
        Ok(expr)
    }

    fn conjunction(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.unary()?;
        while self.match_token(&Token::And) {
            let right = self.unary()?;
            expr = Gpr::new_and(expr, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Gpr, ParseError> {
        if self.match_token(&Token::Not) {
            return Ok(Gpr::new_not(self.unary()?));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Gpr, ParseError> {
        if let Token::Identifier(id) = self.peek().clone() {
            self.current += 1;
            if !self.gene_map.contains_key(&id) {
                self.gene_map.insert(id.clone(), Gene::new(&id));
            }
            return Ok(Gpr::new_gene_node(&id));
        }
        if self.match_token(&Token::LeftParen) {
            let expr = self.disjunction()?;
            if !self.match_token(&Token::RightParen) {
                return Err(ParseError::MissingToken(
                    "Expect ')' after expression.".to_string(),
                ));
            }
            return Ok(expr);
        }
        Err(ParseError::ExpectedExpression)
    }

    /// If the current token is `token` advance past it and return true
    fn match_token(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.current += 1;
            return true;
        }
        false
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn is_at_end(&self) -> bool {
        *self.peek() == Token::Eof
    }
}

/// Enum representing possible parse errors
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    /// Tokens remain after a complete expression
    #[error("Unexpected tokens after the end of the expression")]
    EarlyTermination,
    /// Expected a gene or a parenthesized expression
    #[error("Expected a gene or a parenthesized expression")]
    ExpectedExpression,
    /// A required token (e.g. a closing parenthesis) is missing
    #[error("Missing token: {0}")]
    MissingToken(String),
}
// endregion Parser

/// Enum representing possible lex and parse errors
#[derive(Debug, Error, PartialEq, Clone)]
pub enum GprParseError {
    /// Lexing Error
    #[error("Error occurred during lexing (conversion of GPR string to tokens): {0}")]
    LexingError(#[from] LexerError),
    /// Parsing Error
    #[error("Error occurred during parsing (conversion of tokens to GPR tree): {0}")]
    ParsingError(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::gene::GprOperation;

    #[test]
    fn single_gene() {
        let tokens = Lexer::new("Rv0023").scan_tokens().unwrap();
        assert_eq!(
            tokens,
            vec![Token::Identifier("Rv0023".to_string()), Token::Eof]
        );
    }

    #[test]
    fn grouping() {
        let tokens = Lexer::new("(Rv0023 OR Rv0123)").scan_tokens().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LeftParen,
                Token::Identifier("Rv0023".to_string()),
                Token::Or,
                Token::Identifier("Rv0123".to_string()),
                Token::RightParen,
                Token::Eof
            ]
        );
    }

    #[test]
    fn identifier_characters() {
        let tokens = Lexer::new("HGNC:1234 and b0001.1-a").scan_tokens().unwrap();
        assert_eq!(tokens[0], Token::Identifier("HGNC:1234".to_string()));
        assert_eq!(tokens[2], Token::Identifier("b0001.1-a".to_string()));
        assert!(Lexer::new("g1 & g2").scan_tokens().is_err());
    }

    #[test]
    fn parse_nested() {
        let mut gene_map = IndexMap::new();
        let gpr = parse_gpr("Rv0001 and (Rv0002 or Rv0003)", &mut gene_map).unwrap();
        match gpr {
            Gpr::Operation(GprOperation::And { left, right }) => {
                assert_eq!(*left, Gpr::new_gene_node("Rv0001"));
                match *right {
                    Gpr::Operation(GprOperation::Or { left, right }) => {
                        assert_eq!(*left, Gpr::new_gene_node("Rv0002"));
                        assert_eq!(*right, Gpr::new_gene_node("Rv0003"));
                    }
                    _ => panic!("Incorrect Parse"),
                }
            }
            _ => panic!("Incorrect Parse"),
        }
        assert_eq!(
            gene_map.keys().collect::<Vec<_>>(),
            vec!["Rv0001", "Rv0002", "Rv0003"]
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let mut gene_map = IndexMap::new();
        let gpr = parse_gpr("a or b and c", &mut gene_map).unwrap();
        assert_eq!(
            gpr,
            Gpr::new_or(
                Gpr::new_gene_node("a"),
                Gpr::new_and(Gpr::new_gene_node("b"), Gpr::new_gene_node("c"))
            )
        );
        let gpr = parse_gpr("(a and not b) or not c", &mut gene_map).unwrap();
        assert_eq!(gpr.to_string(), "a and not b or not c");
    }

    #[test]
    fn malformed_rules() {
        let mut gene_map = IndexMap::new();
        assert_eq!(
            parse_gpr("(a or b", &mut gene_map),
            Err(GprParseError::ParsingError(ParseError::MissingToken(
                "Expect ')' after expression.".to_string()
            )))
        );
        assert_eq!(
            parse_gpr("a b", &mut gene_map),
            Err(GprParseError::ParsingError(ParseError::EarlyTermination))
        );
        assert_eq!(
            parse_gpr("a and", &mut gene_map),
            Err(GprParseError::ParsingError(ParseError::ExpectedExpression))
        );
    }
}
