//! Recursive-descent schema parser.
//!
//! Walks the token stream produced by the lexer. Keywords are
//! contextual: `OPTIONAL`, `DEFAULT`, `SIZE`, `OF` and the rest are
//! ordinary identifier tokens that the grammar position gives meaning
//! to.

use crate::ast::{
    Alternative, Constraint, DefaultValue, EnumItem, Member, Module, Type, TypeAssignment,
    TypeKind,
};
use crate::error::ParseError;
use crate::lexer::{Lexer, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Parser { tokens, pos: 0 })
    }

    /// Parse every module in the input.
    pub fn parse(mut self) -> Result<Vec<Module>, ParseError> {
        let mut modules = Vec::new();
        while !self.check(TokenKind::Eof) {
            modules.push(self.parse_module()?);
        }
        Ok(modules)
    }

    // === Token access ===

    fn peek(&self) -> &Token {
        // The lexer always terminates the stream with an Eof token.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Ident && token.text == keyword
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{keyword}'")))
        }
    }

    fn unexpected(&self, what: &str) -> ParseError {
        let token = self.peek();
        let found = match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", token.text),
        };
        ParseError::new(
            token.line,
            token.column,
            format!("expected {what}, found {found}"),
        )
    }

    fn number_i64(&mut self) -> Result<i64, ParseError> {
        let token = self.expect(TokenKind::Number, "a number")?;
        token.text.parse::<i64>().map_err(|_| {
            ParseError::new(token.line, token.column, format!("invalid number '{}'", token.text))
        })
    }

    fn number_u32(&mut self) -> Result<u32, ParseError> {
        let token = self.expect(TokenKind::Number, "a tag number")?;
        token.text.parse::<u32>().map_err(|_| {
            ParseError::new(
                token.line,
                token.column,
                format!("invalid tag number '{}'", token.text),
            )
        })
    }

    fn number_u64(&mut self) -> Result<u64, ParseError> {
        let token = self.expect(TokenKind::Number, "a size")?;
        token.text.parse::<u64>().map_err(|_| {
            ParseError::new(token.line, token.column, format!("invalid size '{}'", token.text))
        })
    }

    // === Grammar productions ===

    /// `Identifier DEFINITIONS ::= BEGIN assignments END`
    fn parse_module(&mut self) -> Result<Module, ParseError> {
        let name = self.expect(TokenKind::Ident, "a module name")?.text;
        self.expect_keyword("DEFINITIONS")?;
        self.expect(TokenKind::Assign, "'::='")?;
        self.expect_keyword("BEGIN")?;

        let mut assignments = Vec::new();
        loop {
            if self.check_keyword("END") {
                self.advance();
                break;
            }
            if self.check(TokenKind::Eof) {
                return Err(self.unexpected("'END'"));
            }
            let type_name = self.expect(TokenKind::Ident, "a type name")?.text;
            self.expect(TokenKind::Assign, "'::='")?;
            let ty = self.parse_type()?;
            assignments.push(TypeAssignment {
                name: type_name,
                ty,
            });
        }

        Ok(Module { name, assignments })
    }

    fn parse_type(&mut self) -> Result<Type, ParseError> {
        let token = self.expect(TokenKind::Ident, "a type")?;
        match token.text.as_str() {
            "INTEGER" => self.with_constraint(TypeKind::Integer),
            "BOOLEAN" => self.with_constraint(TypeKind::Boolean),
            "OCTET" => {
                self.expect_keyword("STRING")?;
                self.with_constraint(TypeKind::OctetString)
            }
            "NULL" => Ok(Type::plain(TypeKind::Null)),
            "SEQUENCE" => self.parse_sequence(),
            "CHOICE" => {
                let alternatives = self.parse_alternatives()?;
                Ok(Type::plain(TypeKind::Choice(alternatives)))
            }
            "ENUMERATED" => {
                let items = self.parse_enum_items()?;
                Ok(Type::plain(TypeKind::Enumerated(items)))
            }
            _ => self.with_constraint(TypeKind::Defined(token.text)),
        }
    }

    fn with_constraint(&mut self, kind: TypeKind) -> Result<Type, ParseError> {
        Ok(Type {
            kind,
            constraint: self.parse_optional_constraint()?,
        })
    }

    /// `SEQUENCE OF type`, `SEQUENCE (SIZE (n)) OF type` or
    /// `SEQUENCE { member, … }`.
    fn parse_sequence(&mut self) -> Result<Type, ParseError> {
        if self.check_keyword("OF") {
            self.advance();
            let element = self.parse_type()?;
            return Ok(Type::plain(TypeKind::SequenceOf(Box::new(element))));
        }
        if self.check(TokenKind::LParen) {
            let constraint = self.parse_optional_constraint()?;
            self.expect_keyword("OF")?;
            let element = self.parse_type()?;
            return Ok(Type {
                kind: TypeKind::SequenceOf(Box::new(element)),
                constraint,
            });
        }

        self.expect(TokenKind::LBrace, "'{'")?;
        let mut members = vec![self.parse_member()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            members.push(self.parse_member()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Type::plain(TypeKind::Sequence(members)))
    }

    /// `Identifier tag? type ( OPTIONAL | DEFAULT value )?`
    fn parse_member(&mut self) -> Result<Member, ParseError> {
        let name = self.expect(TokenKind::Ident, "a member name")?.text;
        let tag = self.parse_optional_tag()?;
        let ty = self.parse_type()?;

        let mut optional = false;
        let mut default = None;
        if self.check_keyword("OPTIONAL") {
            self.advance();
            optional = true;
        } else if self.check_keyword("DEFAULT") {
            self.advance();
            default = Some(self.parse_default_value()?);
        }

        Ok(Member {
            name,
            ty,
            tag,
            optional,
            default,
        })
    }

    fn parse_alternatives(&mut self) -> Result<Vec<Alternative>, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut alternatives = vec![self.parse_alternative()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            alternatives.push(self.parse_alternative()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(alternatives)
    }

    /// `Identifier tag? type`
    fn parse_alternative(&mut self) -> Result<Alternative, ParseError> {
        let name = self.expect(TokenKind::Ident, "an alternative name")?.text;
        let tag = self.parse_optional_tag()?;
        let ty = self.parse_type()?;
        Ok(Alternative { name, ty, tag })
    }

    /// `[ Number ]`
    fn parse_optional_tag(&mut self) -> Result<Option<u32>, ParseError> {
        if !self.check(TokenKind::LBracket) {
            return Ok(None);
        }
        self.advance();
        let number = self.number_u32()?;
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(Some(number))
    }

    fn parse_enum_items(&mut self) -> Result<Vec<EnumItem>, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut items = vec![self.parse_enum_item()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            items.push(self.parse_enum_item()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(items)
    }

    /// `Identifier ( "(" Number ")" )?`
    fn parse_enum_item(&mut self) -> Result<EnumItem, ParseError> {
        let name = self.expect(TokenKind::Ident, "an enumeration name")?.text;
        let mut number = None;
        if self.check(TokenKind::LParen) {
            self.advance();
            number = Some(self.number_i64()?);
            self.expect(TokenKind::RParen, "')'")?;
        }
        Ok(EnumItem { name, number })
    }

    /// `"(" ( SIZE "(" Number ")" | Number ( ".." Number )? ) ")"`
    ///
    /// Whitespace is free before and inside the parentheses; both
    /// `INTEGER(-1..1)` and `INTEGER ( -1 .. 1 )` parse.
    fn parse_optional_constraint(&mut self) -> Result<Option<Constraint>, ParseError> {
        if !self.check(TokenKind::LParen) {
            return Ok(None);
        }
        self.advance();
        let constraint = if self.check_keyword("SIZE") {
            self.advance();
            self.expect(TokenKind::LParen, "'('")?;
            let size = self.number_u64()?;
            self.expect(TokenKind::RParen, "')'")?;
            Constraint::Size(size)
        } else {
            let low = self.number_i64()?;
            if self.check(TokenKind::DotDot) {
                self.advance();
                let high = self.number_i64()?;
                Constraint::Range(low, high)
            } else {
                Constraint::Value(low)
            }
        };
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Some(constraint))
    }

    /// `Number | TRUE | FALSE | NULL | String | Identifier`
    fn parse_default_value(&mut self) -> Result<DefaultValue, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                let number = self.number_i64()?;
                Ok(DefaultValue::Number(number))
            }
            TokenKind::Text => {
                self.advance();
                Ok(DefaultValue::Text(token.text))
            }
            TokenKind::Ident => {
                self.advance();
                match token.text.as_str() {
                    "TRUE" => Ok(DefaultValue::Bool(true)),
                    "FALSE" => Ok(DefaultValue::Bool(false)),
                    "NULL" => Ok(DefaultValue::Null),
                    _ => Ok(DefaultValue::Reference(token.text)),
                }
            }
            _ => Err(self.unexpected("a default value")),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Parser;
    use crate::ast::{Constraint, DefaultValue, Module, Type, TypeKind};

    fn parse(source: &str) -> Vec<Module> {
        Parser::new(source).unwrap().parse().unwrap()
    }

    fn single_type(source: &str) -> Type {
        let text = format!("Test DEFINITIONS ::= BEGIN T ::= {source} END");
        let mut modules = parse(&text);
        assert_eq!(1, modules.len());
        let module = modules.remove(0);
        assert_eq!(1, module.assignments.len());
        module.assignments.into_iter().next().unwrap().ty
    }

    #[test]
    fn test_empty_input_has_no_modules() {
        assert!(parse("").is_empty());
        assert!(parse("  -- nothing here\n").is_empty());
    }

    #[test]
    fn test_module_header_and_order() {
        let modules = parse(
            "Messages DEFINITIONS ::= BEGIN
                B ::= BOOLEAN
                A ::= INTEGER
             END",
        );
        assert_eq!("Messages", modules[0].name);
        let names: Vec<&str> = modules[0]
            .assignments
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        // Source order is preserved.
        assert_eq!(vec!["B", "A"], names);
    }

    #[test]
    fn test_two_modules() {
        let modules = parse(
            "One DEFINITIONS ::= BEGIN A ::= INTEGER END
             Two DEFINITIONS ::= BEGIN A ::= BOOLEAN END",
        );
        assert_eq!(2, modules.len());
        assert_eq!("Two", modules[1].name);
    }

    #[rstest(source, expected,
        case("INTEGER", TypeKind::Integer),
        case("BOOLEAN", TypeKind::Boolean),
        case("OCTET STRING", TypeKind::OctetString),
        case("NULL", TypeKind::Null),
        case("Frame", TypeKind::Defined("Frame".to_string())),
    )]
    fn test_simple_types(source: &str, expected: TypeKind) {
        assert_eq!(expected, single_type(source).kind);
    }

    #[rstest(source,
        case("INTEGER (-1..1)"),
        case("INTEGER(-1..1)"),
        case("INTEGER ( -1 .. 1 )"),
        case("INTEGER   (  -1  ..  1  )"),
    )]
    fn test_range_constraint_whitespace_tolerance(source: &str) {
        let ty = single_type(source);
        assert_eq!(TypeKind::Integer, ty.kind);
        assert_eq!(Some(Constraint::Range(-1, 1)), ty.constraint);
    }

    #[test]
    fn test_value_and_size_constraints() {
        assert_eq!(
            Some(Constraint::Value(8)),
            single_type("INTEGER (8)").constraint
        );
        assert_eq!(
            Some(Constraint::Size(20)),
            single_type("OCTET STRING (SIZE (20))").constraint
        );
    }

    #[test]
    fn test_sequence_members() {
        let ty = single_type(
            "SEQUENCE {
                messageId INTEGER,
                note [0] OCTET STRING OPTIONAL,
                retries INTEGER DEFAULT 3,
                enabled BOOLEAN DEFAULT TRUE
            }",
        );
        let TypeKind::Sequence(members) = ty.kind else {
            panic!("expected SEQUENCE, got {:?}", ty.kind);
        };
        assert_eq!(4, members.len());

        assert_eq!("messageId", members[0].name);
        assert!(!members[0].optional);
        assert_eq!(None, members[0].tag);

        assert_eq!(Some(0), members[1].tag);
        assert!(members[1].optional);

        assert_eq!(Some(DefaultValue::Number(3)), members[2].default);
        assert_eq!(Some(DefaultValue::Bool(true)), members[3].default);
    }

    #[test]
    fn test_sequence_of() {
        let ty = single_type("SEQUENCE OF INTEGER");
        let TypeKind::SequenceOf(element) = ty.kind else {
            panic!("expected SEQUENCE OF, got {:?}", ty.kind);
        };
        assert_eq!(TypeKind::Integer, element.kind);
    }

    #[test]
    fn test_sequence_size_of() {
        let ty = single_type("SEQUENCE (SIZE (4)) OF Frame");
        assert_eq!(Some(Constraint::Size(4)), ty.constraint);
        let TypeKind::SequenceOf(element) = ty.kind else {
            panic!("expected SEQUENCE OF, got {:?}", ty.kind);
        };
        assert_eq!(TypeKind::Defined("Frame".to_string()), element.kind);
    }

    #[test]
    fn test_choice_alternatives() {
        let ty = single_type(
            "CHOICE {
                pingRequest [0] PingRequest,
                dataRequest [4] DataRequest,
                raw OCTET STRING
            }",
        );
        let TypeKind::Choice(alternatives) = ty.kind else {
            panic!("expected CHOICE, got {:?}", ty.kind);
        };
        assert_eq!(3, alternatives.len());
        assert_eq!(Some(0), alternatives[0].tag);
        assert_eq!(Some(4), alternatives[1].tag);
        assert_eq!(None, alternatives[2].tag);
        assert_eq!(
            TypeKind::Defined("DataRequest".to_string()),
            alternatives[1].ty.kind
        );
    }

    #[test]
    fn test_enumerated_values() {
        let ty = single_type("ENUMERATED { red (0), green (1), blue }");
        let TypeKind::Enumerated(items) = ty.kind else {
            panic!("expected ENUMERATED, got {:?}", ty.kind);
        };
        assert_eq!(Some(0), items[0].number);
        assert_eq!(Some(1), items[1].number);
        assert_eq!(None, items[2].number);
    }

    #[test]
    fn test_nested_inline_types() {
        let ty = single_type(
            "SEQUENCE {
                header SEQUENCE { id INTEGER },
                body CHOICE { empty NULL, data OCTET STRING }
            }",
        );
        let TypeKind::Sequence(members) = ty.kind else {
            panic!("expected SEQUENCE, got {:?}", ty.kind);
        };
        assert!(matches!(members[0].ty.kind, TypeKind::Sequence(_)));
        assert!(matches!(members[1].ty.kind, TypeKind::Choice(_)));
    }

    #[test]
    fn test_comments_between_tokens() {
        let modules = parse(
            "Test DEFINITIONS ::= BEGIN -- header comment
                -- full line comment
                T ::= INTEGER -- trailing comment
             END",
        );
        assert_eq!(1, modules[0].assignments.len());
    }

    #[rstest(source, line, column, fragment,
        case("Test DEFINITIONS BEGIN END", 1, 18, "expected '::='"),
        case("Test DEFINITIONS ::= BEGIN T ::= INTEGER", 1, 41, "expected 'END'"),
        case("Test DEFINITIONS ::= BEGIN T ::= SEQUENCE { } END", 1, 45, "expected a member name"),
        case("Test DEFINITIONS ::= BEGIN T ::= ENUMERATED { } END", 1, 47, "expected an enumeration name"),
        case("Test DEFINITIONS ::= BEGIN T ::= SEQUENCE { a [x] INTEGER } END", 1, 48, "expected a tag number"),
    )]
    fn test_errors_carry_positions(source: &str, line: u32, column: u32, fragment: &str) {
        let err = Parser::new(source).unwrap().parse().unwrap_err();
        assert_eq!((line, column), (err.line, err.column), "{err}");
        assert!(err.message.contains(fragment), "{err}");
    }
}
