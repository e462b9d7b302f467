//! Path expression parser.
//!
//! Both surface forms compile to the same [`YamlPath`]: expressions starting
//! with `$` use the dotted form, everything else the slash form.

use super::ast::{PathSegment, YamlPath};
use super::error::YamlPathError;

/// Parser for path expression strings.
pub struct Parser {
    input: Vec<char>,
    position: usize,
}

impl Parser {
    /// Creates a new parser for the given expression.
    pub fn new(query: &str) -> Self {
        Self {
            input: query.trim().chars().collect(),
            position: 0,
        }
    }

    /// Parses the expression into a YamlPath.
    pub fn parse(query: &str) -> Result<YamlPath, YamlPathError> {
        let mut parser = Parser::new(query);
        parser.parse_path()
    }

    fn parse_path(&mut self) -> Result<YamlPath, YamlPathError> {
        match self.peek() {
            None => Err(YamlPathError::InvalidSyntax {
                message: "Empty path expression".to_string(),
            }),
            Some('$') => self.parse_dollar_path(),
            Some(_) => self.parse_slash_path(),
        }
    }

    fn parse_dollar_path(&mut self) -> Result<YamlPath, YamlPathError> {
        let mut segments = Vec::new();
        self.expect('$')?;

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('.') => {
                    self.next();
                    match self.peek() {
                        Some('.') => self.parse_recursive_descent(&mut segments)?,
                        Some('*') => {
                            self.next();
                            segments.push(PathSegment::Wildcard);
                        }
                        _ => {
                            let name = self.parse_identifier()?;
                            segments.push(PathSegment::Child(name));
                        }
                    }
                }
                Some('[') => segments.push(self.parse_bracket_expression()?),
                Some(ch) => return Err(self.unexpected(ch, "'.' or '['")),
            }
        }

        Ok(YamlPath::new(true, segments))
    }

    fn parse_slash_path(&mut self) -> Result<YamlPath, YamlPathError> {
        let mut segments = Vec::new();
        let anchored = self.peek() == Some('/');
        if anchored {
            self.next();
            if self.peek() == Some('/') {
                self.next();
                segments.push(PathSegment::RecursiveDescent);
            }
        }

        loop {
            self.parse_step(&mut segments)?;
            match self.peek() {
                None => break,
                Some('/') => {
                    self.next();
                    if self.peek() == Some('/') {
                        self.next();
                        segments.push(PathSegment::RecursiveDescent);
                    }
                    if self.is_eof() {
                        return Err(YamlPathError::UnexpectedEnd {
                            expected: "path segment after '/'".to_string(),
                        });
                    }
                }
                Some(ch) => return Err(self.unexpected(ch, "'/'")),
            }
        }

        Ok(YamlPath::new(anchored, segments))
    }

    /// Parses one slash-separated step: a key, `*`, a quoted key or a
    /// bracket expression, followed by any number of bracket suffixes.
    fn parse_step(&mut self, segments: &mut Vec<PathSegment>) -> Result<(), YamlPathError> {
        match self.peek() {
            None => {
                return Err(YamlPathError::UnexpectedEnd {
                    expected: "path segment".to_string(),
                })
            }
            Some('[') => {}
            Some('\'') | Some('"') => {
                let name = self.parse_quoted_string()?;
                segments.push(PathSegment::Child(name));
            }
            Some(_) => segments.push(self.parse_slash_name()?),
        }

        while self.peek() == Some('[') {
            segments.push(self.parse_bracket_expression()?);
        }
        Ok(())
    }

    fn parse_slash_name(&mut self) -> Result<PathSegment, YamlPathError> {
        let start = self.position;
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch == '/' || ch == '[' {
                break;
            }
            name.push(ch);
            self.next();
        }

        if name.is_empty() {
            Err(YamlPathError::InvalidSyntax {
                message: format!("Empty path segment at position {}", start),
            })
        } else if name == "*" {
            Ok(PathSegment::Wildcard)
        } else if name.contains('*') {
            Err(YamlPathError::InvalidSyntax {
                message: format!("Partial wildcard '{}' is not supported", name),
            })
        } else {
            Ok(PathSegment::Child(name))
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Returns the next character and advances position.
    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        Some(ch)
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.next();
            } else {
                break;
            }
        }
    }

    /// Checks if we've reached the end of input.
    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn unexpected(&self, found: char, expected: &str) -> YamlPathError {
        YamlPathError::UnexpectedToken {
            position: self.position,
            found: found.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Expects a specific character and advances, or returns an error.
    fn expect(&mut self, expected: char) -> Result<(), YamlPathError> {
        self.skip_whitespace();
        let pos = self.position;
        match self.next() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(YamlPathError::UnexpectedToken {
                position: pos,
                found: ch.to_string(),
                expected: format!("'{}'", expected),
            }),
            None => Err(YamlPathError::UnexpectedEnd {
                expected: format!("'{}'", expected),
            }),
        }
    }

    /// Parses an identifier (key name) in the dotted form.
    fn parse_identifier(&mut self) -> Result<String, YamlPathError> {
        self.skip_whitespace();
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '-' {
                name.push(ch);
                self.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            Err(YamlPathError::InvalidSyntax {
                message: "Expected identifier".to_string(),
            })
        } else {
            Ok(name)
        }
    }

    /// Parses recursive descent (`..`), with the first `.` already consumed.
    fn parse_recursive_descent(
        &mut self,
        segments: &mut Vec<PathSegment>,
    ) -> Result<(), YamlPathError> {
        self.expect('.')?;
        segments.push(PathSegment::RecursiveDescent);
        match self.peek() {
            Some('[') => {}
            Some('*') => {
                self.next();
                segments.push(PathSegment::Wildcard);
            }
            _ => {
                let name = self.parse_identifier()?;
                segments.push(PathSegment::Child(name));
            }
        }
        Ok(())
    }

    /// Parses bracket expression: [index], [start:end], ['key'], [*]
    fn parse_bracket_expression(&mut self) -> Result<PathSegment, YamlPathError> {
        self.expect('[')?;
        self.skip_whitespace();

        let segment = match self.peek() {
            Some('*') => {
                self.next();
                self.expect(']')?;
                PathSegment::Wildcard
            }
            Some('\'') | Some('"') => {
                let mut properties = self.parse_bracket_strings()?;
                self.expect(']')?;
                if properties.len() == 1 {
                    PathSegment::Child(properties.remove(0))
                } else {
                    PathSegment::MultiProperty(properties)
                }
            }
            Some('-') | Some('0'..='9') => {
                // A ':' before the closing bracket makes this a slice
                let looks_like_slice = self.input[self.position..]
                    .iter()
                    .take_while(|&&ch| ch != ']')
                    .any(|&ch| ch == ':');

                if looks_like_slice {
                    self.parse_slice()?
                } else {
                    let idx = self.parse_bracket_number()?;
                    self.expect(']')?;
                    PathSegment::Index(idx)
                }
            }
            Some(':') => self.parse_slice()?,
            Some(ch) => return Err(self.unexpected(ch, "index, slice, '*' or quoted key")),
            None => {
                return Err(YamlPathError::UnexpectedEnd {
                    expected: "']'".to_string(),
                })
            }
        };

        Ok(segment)
    }

    /// Parses string(s) inside brackets: ['key'] or ['key1','key2']
    fn parse_bracket_strings(&mut self) -> Result<Vec<String>, YamlPathError> {
        let mut properties = Vec::new();
        loop {
            self.skip_whitespace();
            if !matches!(self.peek(), Some('\'') | Some('"')) {
                break;
            }
            properties.push(self.parse_quoted_string()?);

            self.skip_whitespace();
            if self.peek() == Some(',') {
                self.next();
            } else {
                break;
            }
        }
        Ok(properties)
    }

    /// Parses a single- or double-quoted string with backslash escapes.
    fn parse_quoted_string(&mut self) -> Result<String, YamlPathError> {
        let quote = match self.next() {
            Some(ch @ ('\'' | '"')) => ch,
            Some(ch) => return Err(self.unexpected(ch, "quote")),
            None => {
                return Err(YamlPathError::UnexpectedEnd {
                    expected: "quote".to_string(),
                })
            }
        };

        let mut value = String::new();
        loop {
            match self.next() {
                Some(ch) if ch == quote => break,
                Some('\\') => match self.next() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('\\') => value.push('\\'),
                    Some('\'') => value.push('\''),
                    Some('"') => value.push('"'),
                    Some(_) | None => {
                        return Err(YamlPathError::InvalidSyntax {
                            message: "Invalid escape sequence".to_string(),
                        })
                    }
                },
                Some(ch) => value.push(ch),
                None => {
                    return Err(YamlPathError::UnexpectedEnd {
                        expected: format!("closing quote '{}'", quote),
                    })
                }
            }
        }
        Ok(value)
    }

    /// Parses a number inside brackets
    fn parse_bracket_number(&mut self) -> Result<isize, YamlPathError> {
        self.skip_whitespace();
        let num_str = self.parse_number_string()?;
        num_str
            .parse::<isize>()
            .map_err(|_| YamlPathError::InvalidSyntax {
                message: format!("Invalid number: {}", num_str),
            })
    }

    /// Parses a number as a string
    fn parse_number_string(&mut self) -> Result<String, YamlPathError> {
        let mut num = String::new();
        if self.peek() == Some('-') {
            num.push('-');
            self.next();
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                num.push(ch);
                self.next();
            } else {
                break;
            }
        }
        if num.is_empty() || num == "-" {
            Err(YamlPathError::InvalidSyntax {
                message: "Expected number".to_string(),
            })
        } else {
            Ok(num)
        }
    }

    /// Parses sequence slice: [start:end], [start:], [:end], [:]
    fn parse_slice(&mut self) -> Result<PathSegment, YamlPathError> {
        self.skip_whitespace();
        let start = if self.peek() == Some(':') {
            None
        } else {
            Some(self.parse_bracket_number()?)
        };

        self.expect(':')?;
        self.skip_whitespace();

        let end = if self.peek() == Some(']') {
            None
        } else {
            Some(self.parse_bracket_number()?)
        };

        self.expect(']')?;

        if let (Some(s), Some(e)) = (start, end) {
            if s >= 0 && e >= 0 && s > e {
                return Err(YamlPathError::InvalidSyntax {
                    message: format!("Invalid slice: start ({}) > end ({})", s, e),
                });
            }
        }

        Ok(PathSegment::Slice(start, end))
    }
}
