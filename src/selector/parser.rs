//! Recursive-descent parser for selector strings

use super::{AttrOp, AttrTest, AttrValue, Selector, SelectorError};
use crate::tree::NodeKind;
use regex::Regex;

pub(super) fn parse(source: &str) -> Result<Selector, SelectorError> {
    if source.trim().is_empty() {
        return Err(SelectorError::Empty);
    }
    let mut parser = Parser {
        source,
        chars: source.chars().collect(),
        pos: 0,
    };
    let mut list = parser.list(None)?;
    Ok(if list.len() == 1 {
        list.remove(0)
    } else {
        Selector::Matches(list)
    })
}

#[derive(Clone, Copy)]
enum Combinator {
    Child,
    Descendant,
    Sibling,
    Adjacent,
}

fn combine(combinator: Combinator, left: Selector, right: Selector) -> Selector {
    let (l, r) = (Box::new(left), Box::new(right));
    match combinator {
        Combinator::Child => Selector::Child(l, r),
        Combinator::Descendant => Selector::Descendant(l, r),
        Combinator::Sibling => Selector::Sibling(l, r),
        Combinator::Adjacent => Selector::Adjacent(l, r),
    }
}

struct Parser<'s> {
    source: &'s str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Skip whitespace, reporting whether any was skipped
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::Unexpected {
                selector: self.source.to_string(),
                found,
                offset: self.pos,
            },
            None => SelectorError::UnexpectedEnd(self.source.to_string()),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error())
        }
    }

    /// Comma-separated selectors up to `close` (not consumed) or the end
    fn list(&mut self, close: Option<char>) -> Result<Vec<Selector>, SelectorError> {
        let mut list = Vec::new();
        loop {
            self.skip_ws();
            list.push(self.relative(close.is_some())?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                None if close.is_none() => return Ok(list),
                c if c.is_some() && c == close => return Ok(list),
                _ => return Err(self.error()),
            }
        }
    }

    /// A complex selector, optionally starting with a combinator relative to
    /// the `:has` scope
    fn relative(&mut self, allow_leading: bool) -> Result<Selector, SelectorError> {
        let leading = match self.peek() {
            Some('>') if allow_leading => Some(Combinator::Child),
            Some('~') if allow_leading => Some(Combinator::Sibling),
            Some('+') if allow_leading => Some(Combinator::Adjacent),
            _ => None,
        };
        let left = match leading {
            Some(combinator) => {
                self.pos += 1;
                self.skip_ws();
                combine(combinator, Selector::Scope, self.compound()?)
            }
            None => self.compound()?,
        };
        self.complex(left)
    }

    fn complex(&mut self, mut left: Selector) -> Result<Selector, SelectorError> {
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                Some('>') => Combinator::Child,
                Some('~') => Combinator::Sibling,
                Some('+') => Combinator::Adjacent,
                Some(',') | Some(')') | None => return Ok(left),
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.error()),
            };
            if !matches!(combinator, Combinator::Descendant) {
                self.pos += 1;
                self.skip_ws();
            }
            let right = self.compound()?;
            left = combine(combinator, left, right);
        }
    }

    fn compound(&mut self) -> Result<Selector, SelectorError> {
        let mut parts = Vec::new();
        loop {
            match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    parts.push(Selector::Wildcard);
                }
                Some('[') => {
                    self.pos += 1;
                    parts.push(Selector::Attribute(self.attribute()?));
                }
                Some('.') => {
                    self.pos += 1;
                    let path = self.name(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.');
                    if path.is_empty() {
                        return Err(self.error());
                    }
                    parts.push(Selector::Field(path.split('.').map(str::to_string).collect()));
                }
                Some(':') => {
                    self.pos += 1;
                    parts.push(self.pseudo()?);
                }
                // Subject marker, accepted and ignored
                Some('!') if parts.is_empty() => self.pos += 1,
                Some(c) if c.is_alphabetic() || c == '_' => {
                    let name = self.name(|c| c.is_alphanumeric() || c == '_');
                    let kind: NodeKind = name
                        .parse()
                        .map_err(|_| SelectorError::UnknownKind(name.clone()))?;
                    parts.push(Selector::Kind(kind));
                }
                _ => break,
            }
        }
        match parts.len() {
            0 => Err(self.error()),
            1 => Ok(parts.remove(0)),
            _ => Ok(Selector::Compound(parts)),
        }
    }

    fn name(&mut self, accept: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&accept) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn pseudo(&mut self) -> Result<Selector, SelectorError> {
        let name = self.name(|c| c.is_ascii_alphanumeric() || c == '-');
        match name.as_str() {
            "not" | "matches" | "is" | "has" => {
                self.expect('(')?;
                let list = self.list(Some(')'))?;
                self.expect(')')?;
                Ok(match name.as_str() {
                    "not" => Selector::Not(list),
                    "has" => Selector::Has(list),
                    _ => Selector::Matches(list),
                })
            }
            "scope" => Ok(Selector::Scope),
            "first-child" => Ok(Selector::NthChild(1)),
            "last-child" => Ok(Selector::NthLastChild(1)),
            "nth-child" | "nth-last-child" => {
                self.expect('(')?;
                self.skip_ws();
                let digits = self.name(|c| c.is_ascii_digit());
                let n: usize = digits.parse().map_err(|_| self.error())?;
                self.skip_ws();
                self.expect(')')?;
                Ok(if name == "nth-child" {
                    Selector::NthChild(n)
                } else {
                    Selector::NthLastChild(n)
                })
            }
            _ => Err(SelectorError::UnknownPseudo(name)),
        }
    }

    fn attribute(&mut self) -> Result<AttrTest, SelectorError> {
        self.skip_ws();
        let path = self.name(|c| !c.is_whitespace() && !"=!<>]".contains(c));
        if path.is_empty() {
            return Err(self.error());
        }
        let path: Vec<String> = path.split('.').map(str::to_string).collect();
        self.skip_ws();

        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(AttrTest { path, op: None });
        }

        let op = match (self.bump(), self.peek()) {
            (Some('!'), Some('=')) => {
                self.pos += 1;
                AttrOp::Ne
            }
            (Some('<'), Some('=')) => {
                self.pos += 1;
                AttrOp::Le
            }
            (Some('>'), Some('=')) => {
                self.pos += 1;
                AttrOp::Ge
            }
            (Some('='), _) => AttrOp::Eq,
            (Some('<'), _) => AttrOp::Lt,
            (Some('>'), _) => AttrOp::Gt,
            _ => {
                self.pos = self.pos.saturating_sub(1);
                return Err(self.error());
            }
        };
        self.skip_ws();

        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                AttrValue::Literal(self.string(quote)?)
            }
            Some('/') => {
                self.pos += 1;
                if !matches!(op, AttrOp::Eq | AttrOp::Ne) {
                    return Err(self.error());
                }
                AttrValue::Regex(self.regex()?)
            }
            Some(_) => {
                let word = self.name(|c| !c.is_whitespace() && c != ']');
                if word.is_empty() {
                    return Err(self.error());
                }
                match word.parse::<f64>() {
                    Ok(n) => AttrValue::Number(n),
                    Err(_) => AttrValue::Literal(word),
                }
            }
            None => return Err(self.error()),
        };
        self.skip_ws();
        self.expect(']')?;
        Ok(AttrTest {
            path,
            op: Some((op, value)),
        })
    }

    fn string(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => return Err(self.error()),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.error()),
            }
        }
    }

    /// Regex body after the opening slash, then optional flags
    fn regex(&mut self) -> Result<Regex, SelectorError> {
        let mut pattern = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('/') => pattern.push('/'),
                    Some(c) => {
                        pattern.push('\\');
                        pattern.push(c);
                    }
                    None => return Err(self.error()),
                },
                Some('/') => break,
                Some(c) => pattern.push(c),
                None => return Err(self.error()),
            }
        }

        let flags = self.name(|c| c.is_ascii_alphabetic());
        let mut inline = String::new();
        for flag in flags.chars() {
            match flag {
                'i' | 'm' | 's' => inline.push(flag),
                // Unicode is always on; global and sticky do not affect a test
                'u' | 'g' | 'y' => {}
                _ => {
                    return Err(SelectorError::Regex {
                        pattern,
                        message: format!("unsupported flag '{}'", flag),
                    })
                }
            }
        }
        let full = if inline.is_empty() {
            pattern.clone()
        } else {
            format!("(?{}){}", inline, pattern)
        };
        Regex::new(&full).map_err(|e| SelectorError::Regex {
            pattern,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(source: &str) -> String {
        parse(source).unwrap().to_string()
    }

    #[test]
    fn test_kinds_and_compounds() {
        assert_eq!(parsed("CallExpression"), "CallExpression");
        assert_eq!(parsed("*"), "*");
        assert_eq!(
            parsed("Identifier[name='of']"),
            "Identifier[name='of']"
        );
        assert!(matches!(
            parse("MemberExpression.callee").unwrap(),
            Selector::Compound(parts) if parts.len() == 2
        ));
    }

    #[test]
    fn test_combinators() {
        assert!(matches!(
            parse("Program > ExpressionStatement").unwrap(),
            Selector::Child(..)
        ));
        assert!(matches!(
            parse("Program  ExpressionStatement").unwrap(),
            Selector::Descendant(..)
        ));
        assert!(matches!(
            parse("ExpressionStatement~ExpressionStatement").unwrap(),
            Selector::Sibling(..)
        ));
        assert!(matches!(
            parse("ExpressionStatement + ExpressionStatement").unwrap(),
            Selector::Adjacent(..)
        ));
    }

    #[test]
    fn test_attribute_operators() {
        let attr = |source: &str| match parse(source).unwrap() {
            Selector::Attribute(test) => test,
            other => panic!("not an attribute: {}", other),
        };
        assert!(attr("[async]").op.is_none());
        assert!(matches!(attr("[async=true]").op, Some((AttrOp::Eq, AttrValue::Literal(_)))));
        assert!(matches!(attr("[params.length > 0]").op, Some((AttrOp::Gt, AttrValue::Number(n))) if n == 0.0));
        assert!(matches!(attr("[params.length>=2]").op, Some((AttrOp::Ge, _))));
        assert!(matches!(attr("[params.length<2]").op, Some((AttrOp::Lt, _))));
        assert!(matches!(attr("[a<=2]").op, Some((AttrOp::Le, _))));
        assert!(matches!(attr("[kind!='get']").op, Some((AttrOp::Ne, _))));
        assert_eq!(attr("[callee.property.name='pipe']").path, vec!["callee", "property", "name"]);
    }

    #[test]
    fn test_regex_values() {
        let re = |source: &str| match parse(source).unwrap() {
            Selector::Attribute(AttrTest {
                op: Some((_, AttrValue::Regex(re))),
                ..
            }) => re,
            other => panic!("not a regex: {}", other),
        };
        let slash = re(r"[source.value=/^rxjs(\/operators)?$/]");
        assert!(slash.is_match("rxjs/operators"));
        assert!(slash.is_match("rxjs"));
        assert!(!slash.is_match("rxjs/ajax"));

        let hex = re(r"[source.value=/^rxjs\x2finternal/]");
        assert!(hex.is_match("rxjs/internal/Observable"));

        let insensitive = re("[name=/subject$/i]");
        assert!(insensitive.is_match("fooSubject"));
    }

    #[test]
    fn test_pseudo_classes() {
        assert!(matches!(parse(":not(Identifier)").unwrap(), Selector::Not(_)));
        assert!(matches!(parse(":is(Identifier, Literal)").unwrap(), Selector::Matches(l) if l.len() == 2));
        assert!(matches!(parse(":has(> Identifier)").unwrap(), Selector::Has(_)));
        assert!(matches!(parse(":first-child").unwrap(), Selector::NthChild(1)));
        assert!(matches!(parse(":nth-last-child(2)").unwrap(), Selector::NthLastChild(2)));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("  "), Err(SelectorError::Empty)));
        assert_eq!(
            parse("Identifer").unwrap_err(),
            SelectorError::UnknownKind("Identifer".to_string())
        );
        assert_eq!(
            parse(":nope").unwrap_err(),
            SelectorError::UnknownPseudo("nope".to_string())
        );
        assert!(matches!(parse("[name='x'"), Err(SelectorError::UnexpectedEnd(_))));
        assert!(matches!(parse("[name=/(/]"), Err(SelectorError::Regex { .. })));
        assert!(matches!(parse("[name=/x/q]"), Err(SelectorError::Regex { .. })));
        assert!(matches!(parse("Program >"), Err(SelectorError::UnexpectedEnd(_))));
        assert!(matches!(parse("[n>/x/]"), Err(SelectorError::Unexpected { .. })));
    }
}
