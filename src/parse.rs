//! Parser for the rule language: assertion files and query literals.
//!
//! The grammar is small and fixed, so the lexer and recursive-descent
//! parser are hand-rolled (no combinator dependency) for full control
//! over error messages and spans:
//!
//! ```text
//! rule      ::=  literal "."  |  literal ":-" bodylit ("," bodylit)* "."
//! bodylit   ::=  (term | ":" name) "says" literal  |  literal
//! literal   ::=  name [ "(" [ term ("," term)* ] ")" ]
//! term      ::=  "?" name  |  integer  |  "true"  |  "false"
//!            |   string  |  name
//! ```
//!
//! A body literal with no `says` prefix refers to the assertion being
//! parsed and is resolved to its principal at parse time, so stored rules
//! always carry a full assertion reference. Bare names are string values;
//! `#` starts a line comment. The leading `:` of a native reference is
//! stripped — the native database is keyed by the bare name.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::term::{AssertionRef, BodyLit, Literal, Rule, Term, Value};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while parsing rule or query text.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("unexpected character '{ch}'")]
    #[diagnostic(
        code(maat::parse::unexpected_char),
        help(
            "Rule text consists of literals like `may(?u, read)`, the \
             connectives `:-` `,` `.`, assertion references before `says`, \
             and `#` line comments."
        )
    )]
    UnexpectedChar {
        ch: char,
        #[source_code]
        src: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("unterminated string literal")]
    #[diagnostic(
        code(maat::parse::unterminated_string),
        help("Close the string with a double quote. Escapes: \\\" \\\\ \\n \\t.")
    )]
    UnterminatedString {
        #[source_code]
        src: String,
        #[label("string starts here")]
        span: SourceSpan,
    },

    #[error("invalid escape '\\{ch}' in string literal")]
    #[diagnostic(
        code(maat::parse::invalid_escape),
        help("Supported escapes are \\\" \\\\ \\n and \\t.")
    )]
    InvalidEscape {
        ch: char,
        #[source_code]
        src: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("integer literal does not fit in 64 bits")]
    #[diagnostic(code(maat::parse::int_out_of_range))]
    IntOutOfRange {
        #[source_code]
        src: String,
        #[label("this literal")]
        span: SourceSpan,
    },

    #[error("expected {expected}, found {found}")]
    #[diagnostic(code(maat::parse::unexpected_token))]
    UnexpectedToken {
        expected: String,
        found: String,
        #[source_code]
        src: String,
        #[label("unexpected")]
        span: SourceSpan,
    },

    #[error("unexpected end of input: expected {expected}")]
    #[diagnostic(code(maat::parse::unexpected_eof))]
    UnexpectedEof {
        expected: String,
        #[source_code]
        src: String,
        #[label("input ends here")]
        span: SourceSpan,
    },

    #[error("query must name an assertion")]
    #[diagnostic(
        code(maat::parse::missing_assertion_ref),
        help("Write `assn says lit(...)` for a rule assertion or `:name says lit(...)` for a native one.")
    )]
    MissingAssertionRef {
        #[source_code]
        src: String,
        #[label("this literal has no `says` prefix")]
        span: SourceSpan,
    },
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Var(String),
    Int(i64),
    Str(String),
    NativeRef(String),
    LParen,
    RParen,
    Comma,
    Period,
    Turnstile,
}

impl std::fmt::Display for Tok {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tok::Ident(s) => write!(f, "`{s}`"),
            Tok::Var(s) => write!(f, "`?{s}`"),
            Tok::Int(n) => write!(f, "`{n}`"),
            Tok::Str(s) => write!(f, "{s:?}"),
            Tok::NativeRef(s) => write!(f, "`:{s}`"),
            Tok::LParen => write!(f, "`(`"),
            Tok::RParen => write!(f, "`)`"),
            Tok::Comma => write!(f, "`,`"),
            Tok::Period => write!(f, "`.`"),
            Tok::Turnstile => write!(f, "`:-`"),
        }
    }
}

fn ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

struct Lexer<'a> {
    src: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    /// Consume the rest of an identifier whose first (ASCII) character at
    /// `start` has already been taken.
    fn take_ident(&mut self, start: usize) -> (String, usize) {
        let mut end = start + 1;
        while let Some(&(i, c)) = self.chars.peek() {
            if ident_continue(c) {
                end = i + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        (self.src[start..end].to_string(), end)
    }

    /// Consume the rest of an integer whose first character (a digit or
    /// the minus sign) at `start` has already been taken.
    fn take_int(&mut self, start: usize) -> Result<(Tok, SourceSpan), ParseError> {
        let mut end = start + 1;
        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                end = i + 1;
                self.chars.next();
            } else {
                break;
            }
        }
        let span: SourceSpan = (start, end - start).into();
        let n = self.src[start..end]
            .parse::<i64>()
            .map_err(|_| ParseError::IntOutOfRange {
                src: self.src.to_string(),
                span,
            })?;
        Ok((Tok::Int(n), span))
    }

    fn take_string(&mut self, start: usize) -> Result<(Tok, SourceSpan), ParseError> {
        let mut text = String::new();
        loop {
            match self.chars.next() {
                None => {
                    return Err(ParseError::UnterminatedString {
                        src: self.src.to_string(),
                        span: (start, 1).into(),
                    })
                }
                Some((i, '"')) => {
                    return Ok((Tok::Str(text), (start, i + 1 - start).into()));
                }
                Some((i, '\\')) => match self.chars.next() {
                    Some((_, '"')) => text.push('"'),
                    Some((_, '\\')) => text.push('\\'),
                    Some((_, 'n')) => text.push('\n'),
                    Some((_, 't')) => text.push('\t'),
                    Some((_, other)) => {
                        return Err(ParseError::InvalidEscape {
                            ch: other,
                            src: self.src.to_string(),
                            span: (i, 1 + other.len_utf8()).into(),
                        })
                    }
                    None => {
                        return Err(ParseError::UnterminatedString {
                            src: self.src.to_string(),
                            span: (start, 1).into(),
                        })
                    }
                },
                Some((_, c)) => text.push(c),
            }
        }
    }

    fn tokenize(mut self) -> Result<Vec<(Tok, SourceSpan)>, ParseError> {
        let mut toks = Vec::new();
        while let Some((i, c)) = self.chars.next() {
            match c {
                c if c.is_whitespace() => {}
                '#' => {
                    for (_, c) in self.chars.by_ref() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                '(' => toks.push((Tok::LParen, (i, 1).into())),
                ')' => toks.push((Tok::RParen, (i, 1).into())),
                ',' => toks.push((Tok::Comma, (i, 1).into())),
                '.' => toks.push((Tok::Period, (i, 1).into())),
                '"' => toks.push(self.take_string(i)?),
                '?' => match self.chars.peek() {
                    Some(&(j, c)) if ident_start(c) => {
                        self.chars.next();
                        let (name, end) = self.take_ident(j);
                        toks.push((Tok::Var(name), (i, end - i).into()));
                    }
                    _ => {
                        return Err(ParseError::UnexpectedChar {
                            ch: '?',
                            src: self.src.to_string(),
                            span: (i, 1).into(),
                        })
                    }
                },
                ':' => match self.chars.peek() {
                    Some(&(_, '-')) => {
                        self.chars.next();
                        toks.push((Tok::Turnstile, (i, 2).into()));
                    }
                    Some(&(j, c)) if ident_start(c) => {
                        self.chars.next();
                        let (name, end) = self.take_ident(j);
                        toks.push((Tok::NativeRef(name), (i, end - i).into()));
                    }
                    _ => {
                        return Err(ParseError::UnexpectedChar {
                            ch: ':',
                            src: self.src.to_string(),
                            span: (i, 1).into(),
                        })
                    }
                },
                '-' => match self.chars.peek() {
                    Some(&(_, c)) if c.is_ascii_digit() => {
                        toks.push(self.take_int(i)?);
                    }
                    _ => {
                        return Err(ParseError::UnexpectedChar {
                            ch: '-',
                            src: self.src.to_string(),
                            span: (i, 1).into(),
                        })
                    }
                },
                c if c.is_ascii_digit() => toks.push(self.take_int(i)?),
                c if ident_start(c) => {
                    let (name, end) = self.take_ident(i);
                    toks.push((Tok::Ident(name), (i, end - i).into()));
                }
                other => {
                    return Err(ParseError::UnexpectedChar {
                        ch: other,
                        src: self.src.to_string(),
                        span: (i, other.len_utf8()).into(),
                    })
                }
            }
        }
        Ok(toks)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    src: &'a str,
    toks: Vec<(Tok, SourceSpan)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self, ParseError> {
        Ok(Self {
            src,
            toks: Lexer::new(src).tokenize()?,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos).map(|(t, _)| t)
    }

    fn peek_ahead(&self, n: usize) -> Option<&Tok> {
        self.toks.get(self.pos + n).map(|(t, _)| t)
    }

    fn peek_span(&self) -> SourceSpan {
        match self.toks.get(self.pos) {
            Some(&(_, span)) => span,
            None => (self.src.len(), 0).into(),
        }
    }

    fn advance(&mut self) -> Option<(Tok, SourceSpan)> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.toks.get(self.pos) {
            Some((tok, span)) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: tok.to_string(),
                src: self.src.to_string(),
                span: *span,
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
                src: self.src.to_string(),
                span: (self.src.len(), 0).into(),
            },
        }
    }

    fn expect(&mut self, tok: Tok, expected: &str) -> Result<(), ParseError> {
        if self.peek() == Some(&tok) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn term(&mut self) -> Result<Term, ParseError> {
        match self.peek() {
            Some(Tok::Var(_)) => match self.advance() {
                Some((Tok::Var(name), _)) => Ok(Term::var(name)),
                _ => unreachable!(),
            },
            Some(Tok::Int(_)) => match self.advance() {
                Some((Tok::Int(n), _)) => Ok(Term::val(n)),
                _ => unreachable!(),
            },
            Some(Tok::Str(_)) => match self.advance() {
                Some((Tok::Str(s), _)) => Ok(Term::val(s)),
                _ => unreachable!(),
            },
            Some(Tok::Ident(s)) if s == "true" => {
                self.pos += 1;
                Ok(Term::val(true))
            }
            Some(Tok::Ident(s)) if s == "false" => {
                self.pos += 1;
                Ok(Term::val(false))
            }
            Some(Tok::Ident(_)) => match self.advance() {
                Some((Tok::Ident(s), _)) => Ok(Term::val(s)),
                _ => unreachable!(),
            },
            _ => Err(self.unexpected("a term (variable, number, string, or atom)")),
        }
    }

    fn literal(&mut self) -> Result<Literal, ParseError> {
        let name = match self.peek() {
            Some(Tok::Ident(_)) => match self.advance() {
                Some((Tok::Ident(s), _)) => s,
                _ => unreachable!(),
            },
            _ => return Err(self.unexpected("a predicate name")),
        };
        let mut args = Vec::new();
        if self.peek() == Some(&Tok::LParen) {
            self.pos += 1;
            if self.peek() == Some(&Tok::RParen) {
                self.pos += 1;
            } else {
                loop {
                    args.push(self.term()?);
                    match self.peek() {
                        Some(Tok::Comma) => {
                            self.pos += 1;
                        }
                        Some(Tok::RParen) => {
                            self.pos += 1;
                            break;
                        }
                        _ => return Err(self.unexpected("`,` or `)`")),
                    }
                }
            }
        }
        Ok(Literal::new(name, args))
    }

    /// Whether the upcoming tokens are `<term> says`, i.e. an explicit
    /// principal reference rather than a bare literal.
    fn starts_principal_ref(&self) -> bool {
        let termlike = matches!(
            self.peek(),
            Some(Tok::Ident(_) | Tok::Var(_) | Tok::Int(_) | Tok::Str(_))
        );
        termlike && matches!(self.peek_ahead(1), Some(Tok::Ident(s)) if s == "says")
    }

    fn body_lit(&mut self, implicit: Option<&AssertionRef>) -> Result<BodyLit, ParseError> {
        if let Some(Tok::NativeRef(_)) = self.peek() {
            let name = match self.advance() {
                Some((Tok::NativeRef(s), _)) => s,
                _ => unreachable!(),
            };
            self.expect(Tok::Ident("says".into()), "`says`")?;
            let lit = self.literal()?;
            return Ok(BodyLit::new(AssertionRef::Native(name), lit));
        }
        if self.starts_principal_ref() {
            let assn = self.term()?;
            self.pos += 1; // the `says` keyword
            let lit = self.literal()?;
            return Ok(BodyLit::new(AssertionRef::Principal(assn), lit));
        }
        let span = self.peek_span();
        let lit = self.literal()?;
        match implicit {
            Some(assn) => Ok(BodyLit::new(assn.clone(), lit)),
            None => Err(ParseError::MissingAssertionRef {
                src: self.src.to_string(),
                span,
            }),
        }
    }

    fn rule(&mut self, implicit: &AssertionRef) -> Result<Rule, ParseError> {
        let head = self.literal()?;
        match self.peek() {
            Some(Tok::Period) => {
                self.pos += 1;
                Ok(Rule::fact(head))
            }
            Some(Tok::Turnstile) => {
                self.pos += 1;
                let mut body = vec![self.body_lit(Some(implicit))?];
                loop {
                    match self.peek() {
                        Some(Tok::Comma) => {
                            self.pos += 1;
                            body.push(self.body_lit(Some(implicit))?);
                        }
                        Some(Tok::Period) => {
                            self.pos += 1;
                            break;
                        }
                        _ => return Err(self.unexpected("`,` or `.`")),
                    }
                }
                Ok(Rule::new(head, body))
            }
            _ => Err(self.unexpected("`:-` or `.`")),
        }
    }
}

/// Parse an assertion file: a sequence of rules attributed to `principal`.
///
/// Body literals without a `says` prefix are resolved to the installing
/// principal, so the returned rules always carry full assertion
/// references.
pub fn parse_assertion(principal: &Value, src: &str) -> Result<Vec<Rule>, ParseError> {
    let implicit = AssertionRef::Principal(Term::Val(principal.clone()));
    let mut parser = Parser::new(src)?;
    let mut rules = Vec::new();
    while !parser.at_eof() {
        rules.push(parser.rule(&implicit)?);
    }
    Ok(rules)
}

/// Parse a query: a single, fully qualified body literal, with an
/// optional trailing period.
pub fn parse_query(src: &str) -> Result<BodyLit, ParseError> {
    let mut parser = Parser::new(src)?;
    let goal = parser.body_lit(None)?;
    if parser.peek() == Some(&Tok::Period) {
        parser.pos += 1;
    }
    if !parser.at_eof() {
        return Err(parser.unexpected("end of query"));
    }
    Ok(goal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> Value {
        Value::from("app")
    }

    #[test]
    fn parses_facts_and_rules() {
        let rules = parse_assertion(
            &app(),
            "edge(1, 2).\n\
             path(?x, ?y) :- edge(?x, ?y).",
        )
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0], Rule::fact(Literal::new("edge", vec![Term::val(1), Term::val(2)])));
        assert_eq!(
            rules[1].body,
            vec![BodyLit::new(
                AssertionRef::principal("app"),
                Literal::new("edge", vec![Term::var("x"), Term::var("y")]),
            )]
        );
    }

    #[test]
    fn explicit_says_overrides_implicit_principal() {
        let rules = parse_assertion(
            &app(),
            "may(?u) :- hr says employee(?u), ?u says active().",
        )
        .unwrap();
        assert_eq!(rules[0].body[0].assn, AssertionRef::principal("hr"));
        assert_eq!(
            rules[0].body[1].assn,
            AssertionRef::Principal(Term::var("u"))
        );
    }

    #[test]
    fn native_refs_are_stripped_of_the_colon() {
        let rules = parse_assertion(&app(), "big(?x) :- :sys says lt(10, ?x).").unwrap();
        assert_eq!(rules[0].body[0].assn, AssertionRef::native("sys"));
    }

    #[test]
    fn term_shapes() {
        let rules = parse_assertion(
            &app(),
            "p(alice, -3, \"two words\", true, false, ?v).",
        )
        .unwrap();
        assert_eq!(
            rules[0].head.args,
            vec![
                Term::val("alice"),
                Term::val(-3),
                Term::val("two words"),
                Term::val(true),
                Term::val(false),
                Term::var("v"),
            ]
        );
    }

    #[test]
    fn string_escapes() {
        let rules = parse_assertion(&app(), r#"p("a\"b\\c\nd")."#).unwrap();
        assert_eq!(rules[0].head.args[0], Term::val("a\"b\\c\nd"));
    }

    #[test]
    fn zero_arity_literals_with_and_without_parens() {
        let rules = parse_assertion(&app(), "ready. go() :- ready.").unwrap();
        assert_eq!(rules[0].head, Literal::new("ready", vec![]));
        assert_eq!(rules[1].head, Literal::new("go", vec![]));
        assert_eq!(rules[1].body[0].lit, Literal::new("ready", vec![]));
    }

    #[test]
    fn comments_are_skipped() {
        let rules = parse_assertion(
            &app(),
            "# reachability base case\nedge(1, 2). # trailing\n",
        )
        .unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn query_requires_assertion_ref() {
        let err = parse_query("path(1, ?y)").unwrap_err();
        assert!(matches!(err, ParseError::MissingAssertionRef { .. }));
        let goal = parse_query("app says path(1, ?y)").unwrap();
        assert_eq!(goal.assn, AssertionRef::principal("app"));
        let native = parse_query(":sys says lt(1, 2).").unwrap();
        assert_eq!(native.assn, AssertionRef::native("sys"));
    }

    #[test]
    fn missing_period_is_reported() {
        let err = parse_assertion(&app(), "edge(1, 2)").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn unterminated_string_is_reported() {
        let err = parse_assertion(&app(), "p(\"abc).").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedString { .. }));
    }

    #[test]
    fn stray_character_is_reported() {
        let err = parse_assertion(&app(), "p(@).").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedChar { ch: '@', .. }));
    }

    #[test]
    fn huge_integer_is_reported() {
        let err = parse_assertion(&app(), "p(99999999999999999999).").unwrap_err();
        assert!(matches!(err, ParseError::IntOutOfRange { .. }));
    }

    #[test]
    fn variable_assertion_reference_in_query_is_allowed() {
        // The resolver fails the branch if it is still unbound at call
        // time, but the syntax is legal.
        let goal = parse_query("?who says edge(1, 2)").unwrap();
        assert_eq!(goal.assn, AssertionRef::Principal(Term::var("who")));
    }
}
