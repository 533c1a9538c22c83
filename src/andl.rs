//! Loader for textual `.andl` net descriptions.
//!
//! ```text
//! pn philosophers {
//!     places {
//!         [p0 = 1]
//!         [p1 = 0]
//!     }
//!     transitions {
//!         [t0 : [p0 - 1] & [p1 + 1]]
//!     }
//! }
//! ```
//!
//! `[p - 1]` consumes a token from `p` (an IN arc), `[p + 1]` produces one
//! (an OUT arc). Markings must be 0 or 1 and arc weights must be 1, since
//! the net is 1-safe. `//` starts a line comment.

use std::fmt;

use thiserror::Error;

use crate::net::{Arc, ArcDir, PetriNet};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unexpected character '{ch}'")]
    UnexpectedChar { line: usize, ch: char },

    #[error("line {line}: expected {expected}, found {found}")]
    Unexpected {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("line {line}: duplicate place '{name}'")]
    DuplicatePlace { line: usize, name: String },

    #[error("line {line}: duplicate transition '{name}'")]
    DuplicateTransition { line: usize, name: String },

    #[error("line {line}: unknown place '{name}' in arc")]
    UnknownPlace { line: usize, name: String },

    #[error("line {line}: initial marking of '{name}' must be 0 or 1, got {value}")]
    BadMarking {
        line: usize,
        name: String,
        value: i64,
    },

    #[error("line {line}: arc weight on '{place}' must be 1, got {value}")]
    BadWeight {
        line: usize,
        place: String,
        value: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Int(i64),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Equals,
    Colon,
    Amp,
    Plus,
    Minus,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "'{}'", s),
            Token::Int(n) => write!(f, "'{}'", n),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Equals => write!(f, "'='"),
            Token::Colon => write!(f, "':'"),
            Token::Amp => write!(f, "'&'"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '/' => {
                // Line comment.
                chars.next();
                if chars.peek() != Some(&'/') {
                    return Err(ParseError::UnexpectedChar { line, ch: '/' });
                }
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '{' => {
                chars.next();
                tokens.push((Token::LBrace, line));
            }
            '}' => {
                chars.next();
                tokens.push((Token::RBrace, line));
            }
            '[' => {
                chars.next();
                tokens.push((Token::LBracket, line));
            }
            ']' => {
                chars.next();
                tokens.push((Token::RBracket, line));
            }
            '=' => {
                chars.next();
                tokens.push((Token::Equals, line));
            }
            ':' => {
                chars.next();
                tokens.push((Token::Colon, line));
            }
            '&' => {
                chars.next();
                tokens.push((Token::Amp, line));
            }
            '+' => {
                chars.next();
                tokens.push((Token::Plus, line));
            }
            '-' => {
                chars.next();
                tokens.push((Token::Minus, line));
            }
            c if c.is_ascii_digit() => {
                let mut value = 0i64;
                while let Some(&d) = chars.peek() {
                    if let Some(digit) = d.to_digit(10) {
                        value = value * 10 + digit as i64;
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Int(value), line));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' || d == '.' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Ident(name), line));
            }
            other => return Err(ParseError::UnexpectedChar { line, ch: other }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map(|(_, l)| *l)
            .unwrap_or(1)
    }

    fn next(&mut self) -> Result<(Token, usize), ParseError> {
        let item = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        item.ok_or(ParseError::UnexpectedEof)
    }

    fn expect(&mut self, expected: Token) -> Result<usize, ParseError> {
        let (token, line) = self.next()?;
        if token == expected {
            Ok(line)
        } else {
            Err(ParseError::Unexpected {
                line,
                expected: expected.to_string(),
                found: token.to_string(),
            })
        }
    }

    fn expect_ident(&mut self) -> Result<(String, usize), ParseError> {
        let (token, line) = self.next()?;
        match token {
            Token::Ident(name) => Ok((name, line)),
            other => Err(ParseError::Unexpected {
                line,
                expected: "an identifier".to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        let (name, line) = self.expect_ident()?;
        if name == keyword {
            Ok(())
        } else {
            Err(ParseError::Unexpected {
                line,
                expected: format!("'{}'", keyword),
                found: format!("'{}'", name),
            })
        }
    }

    fn expect_int(&mut self) -> Result<(i64, usize), ParseError> {
        let (token, line) = self.next()?;
        match token {
            Token::Int(value) => Ok((value, line)),
            other => Err(ParseError::Unexpected {
                line,
                expected: "a number".to_string(),
                found: other.to_string(),
            }),
        }
    }
}

/// Parses an ANDL net description into a validated [`PetriNet`].
pub fn parse_net(input: &str) -> Result<PetriNet, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(input)?,
        pos: 0,
    };

    parser.expect_keyword("pn")?;
    let (name, _) = parser.expect_ident()?;
    let mut net = PetriNet::new(name);
    parser.expect(Token::LBrace)?;

    parser.expect_keyword("places")?;
    parser.expect(Token::LBrace)?;
    while parser.peek() == Some(&Token::LBracket) {
        parser.expect(Token::LBracket)?;
        let (name, line) = parser.expect_ident()?;
        parser.expect(Token::Equals)?;
        let (value, _) = parser.expect_int()?;
        parser.expect(Token::RBracket)?;

        if net.find_place(&name).is_some() {
            return Err(ParseError::DuplicatePlace { line, name });
        }
        if value != 0 && value != 1 {
            return Err(ParseError::BadMarking { line, name, value });
        }
        net.add_place(name, value as u8);
    }
    parser.expect(Token::RBrace)?;

    parser.expect_keyword("transitions")?;
    parser.expect(Token::LBrace)?;
    while parser.peek() == Some(&Token::LBracket) {
        parser.expect(Token::LBracket)?;
        let (name, line) = parser.expect_ident()?;
        parser.expect(Token::Colon)?;

        let mut arcs = Vec::new();
        while parser.peek() == Some(&Token::LBracket) {
            arcs.push(parse_arc(&mut parser, &net)?);
            if parser.peek() == Some(&Token::Amp) {
                parser.expect(Token::Amp)?;
            } else {
                break;
            }
        }
        parser.expect(Token::RBracket)?;

        if net.find_transition(&name).is_some() {
            return Err(ParseError::DuplicateTransition { line, name });
        }
        net.add_transition(name, arcs);
    }
    parser.expect(Token::RBrace)?;

    parser.expect(Token::RBrace)?;
    if let Some(token) = parser.peek() {
        return Err(ParseError::Unexpected {
            line: parser.line(),
            expected: "end of input".to_string(),
            found: token.to_string(),
        });
    }

    Ok(net)
}

fn parse_arc(parser: &mut Parser, net: &PetriNet) -> Result<Arc, ParseError> {
    parser.expect(Token::LBracket)?;
    let (place_name, line) = parser.expect_ident()?;
    let (sign, sign_line) = parser.next()?;
    let dir = match sign {
        Token::Minus => ArcDir::In,
        Token::Plus => ArcDir::Out,
        other => {
            return Err(ParseError::Unexpected {
                line: sign_line,
                expected: "'+' or '-'".to_string(),
                found: other.to_string(),
            })
        }
    };
    let (weight, _) = parser.expect_int()?;
    parser.expect(Token::RBracket)?;

    let place = net
        .find_place(&place_name)
        .ok_or_else(|| ParseError::UnknownPlace {
            line,
            name: place_name.clone(),
        })?;
    if weight != 1 {
        return Err(ParseError::BadWeight {
            line,
            place: place_name,
            value: weight,
        });
    }

    Ok(Arc { dir, place })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HANDOVER: &str = r#"
        // a token moving from p0 to p1
        pn handover {
            places {
                [p0 = 1]
                [p1 = 0]
            }
            transitions {
                [t : [p0 - 1] & [p1 + 1]]
            }
        }
    "#;

    #[test]
    fn test_parse_handover() {
        let net = parse_net(HANDOVER).unwrap();
        assert_eq!(net.name, "handover");
        assert_eq!(net.num_places(), 2);
        assert_eq!(net.num_transitions(), 1);
        assert_eq!(net.place(0).name, "p0");
        assert_eq!(net.place(0).initial_marking, 1);
        assert_eq!(net.place(1).initial_marking, 0);

        let t = net.transition(0);
        assert_eq!(t.name, "t");
        assert_eq!(t.arcs.len(), 2);
        assert_eq!(t.arcs[0].dir, ArcDir::In);
        assert_eq!(t.arcs[0].place, 0);
        assert_eq!(t.arcs[1].dir, ArcDir::Out);
        assert_eq!(t.arcs[1].place, 1);
    }

    #[test]
    fn test_parse_empty_sections() {
        let net = parse_net("pn empty { places { } transitions { } }").unwrap();
        assert_eq!(net.num_places(), 0);
        assert_eq!(net.num_transitions(), 0);
    }

    #[test]
    fn test_transition_without_arcs() {
        let net = parse_net("pn n { places { } transitions { [t : ] } }").unwrap();
        assert_eq!(net.transition(0).arcs.len(), 0);
    }

    #[test]
    fn test_duplicate_place() {
        let err = parse_net("pn n { places { [p = 0] [p = 1] } transitions { } }").unwrap_err();
        assert!(matches!(err, ParseError::DuplicatePlace { name, .. } if name == "p"));
    }

    #[test]
    fn test_unknown_place_in_arc() {
        let err =
            parse_net("pn n { places { [p = 0] } transitions { [t : [q - 1]] } }").unwrap_err();
        assert!(matches!(err, ParseError::UnknownPlace { name, .. } if name == "q"));
    }

    #[test]
    fn test_bad_marking() {
        let err = parse_net("pn n { places { [p = 2] } transitions { } }").unwrap_err();
        assert_eq!(
            err,
            ParseError::BadMarking {
                line: 1,
                name: "p".to_string(),
                value: 2
            }
        );
    }

    #[test]
    fn test_bad_weight() {
        let err =
            parse_net("pn n { places { [p = 1] } transitions { [t : [p - 3]] } }").unwrap_err();
        assert!(matches!(err, ParseError::BadWeight { value: 3, .. }));
    }

    #[test]
    fn test_syntax_error_carries_line() {
        let err = parse_net("pn n {\n  places [\n}").unwrap_err();
        assert_eq!(
            err,
            ParseError::Unexpected {
                line: 2,
                expected: "'{'".to_string(),
                found: "'['".to_string(),
            }
        );
    }

    #[test]
    fn test_eof() {
        assert_eq!(parse_net("pn n {").unwrap_err(), ParseError::UnexpectedEof);
    }
}
