//! LDAPv3 search filters (RFC 2254 subset) over attribute lists
//!
//! Supported:
//! ```text
//! (&(a=1)(b=2))   (|(a=1)(a=2))   (!(a=1))
//! (a=*)           (a=pre*fix*)    (a>=10)   (a<=10)   (a~=Value)
//! ```

use slp_core::Attributes;

/// A parsed search filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Present(String),
    Equal(String, String),
    Approx(String, String),
    GreaterEq(String, String),
    LessEq(String, String),
}

impl Filter {
    /// Parse a filter string; `None` on any syntax error
    pub fn parse(s: &str) -> Option<Self> {
        let mut parser = Parser {
            input: s.trim().as_bytes(),
            pos: 0,
        };
        let filter = parser.filter()?;
        if parser.pos == parser.input.len() {
            Some(filter)
        } else {
            None
        }
    }

    /// Evaluate against an attribute list; tags compare case-insensitively
    pub fn matches(&self, attrs: &Attributes) -> bool {
        match self {
            Filter::And(list) => list.iter().all(|f| f.matches(attrs)),
            Filter::Or(list) => list.iter().any(|f| f.matches(attrs)),
            Filter::Not(inner) => !inner.matches(attrs),
            Filter::Present(tag) => lookup(attrs, tag).is_some(),
            Filter::Equal(tag, pattern) => {
                lookup(attrs, tag).map_or(false, |v| wildcard_match(pattern, v))
            }
            Filter::Approx(tag, value) => {
                lookup(attrs, tag).map_or(false, |v| v.trim().eq_ignore_ascii_case(value.trim()))
            }
            Filter::GreaterEq(tag, value) => {
                lookup(attrs, tag).map_or(false, |v| compare(v, value).is_ge())
            }
            Filter::LessEq(tag, value) => {
                lookup(attrs, tag).map_or(false, |v| compare(v, value).is_le())
            }
        }
    }
}

fn lookup<'a>(attrs: &'a Attributes, tag: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(tag))
        .map(|(_, value)| value)
}

/// Integers compare numerically, everything else case-insensitively
fn compare(left: &str, right: &str) -> std::cmp::Ordering {
    match (left.trim().parse::<i64>(), right.trim().parse::<i64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r),
        _ => left
            .trim()
            .to_ascii_lowercase()
            .cmp(&right.trim().to_ascii_lowercase()),
    }
}

/// Stands in for `/`, which glob `*` would not cross
const SEPARATOR: char = '\u{1}';

/// Case-insensitive match where `*` stands for any run of characters
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    let glob = to_glob(&pattern.trim().to_ascii_lowercase());
    let value: String = value
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '/' { SEPARATOR } else { c })
        .collect();
    glob_match::glob_match(&glob, &value)
}

/// Glob pattern in which only `*` is special
fn to_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '?' | '[' | ']' | '{' | '}' | '\\' => {
                glob.push('\\');
                glob.push(c);
            }
            '/' => glob.push(SEPARATOR),
            _ => glob.push(c),
        }
    }
    glob
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> Option<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn filter(&mut self) -> Option<Filter> {
        self.skip_spaces();
        self.eat(b'(')?;
        let filter = match self.peek()? {
            b'&' => {
                self.pos += 1;
                Filter::And(self.list()?)
            }
            b'|' => {
                self.pos += 1;
                Filter::Or(self.list()?)
            }
            b'!' => {
                self.pos += 1;
                Filter::Not(Box::new(self.filter()?))
            }
            _ => self.item()?,
        };
        self.skip_spaces();
        self.eat(b')')?;
        Some(filter)
    }

    fn list(&mut self) -> Option<Vec<Filter>> {
        let mut list = Vec::new();
        loop {
            self.skip_spaces();
            if self.peek()? != b'(' {
                break;
            }
            list.push(self.filter()?);
        }
        if list.is_empty() {
            None
        } else {
            Some(list)
        }
    }

    fn item(&mut self) -> Option<Filter> {
        let start = self.pos;
        while !matches!(self.peek()?, b'=' | b'<' | b'>' | b'~' | b'(' | b')') {
            self.pos += 1;
        }
        let tag = std::str::from_utf8(&self.input[start..self.pos]).ok()?.trim();
        if tag.is_empty() {
            return None;
        }

        let op = match self.peek()? {
            b'=' => b'=',
            op @ (b'<' | b'>' | b'~') => {
                self.pos += 1;
                if self.peek()? != b'=' {
                    return None;
                }
                op
            }
            _ => return None,
        };
        self.pos += 1;

        let value_start = self.pos;
        while !matches!(self.peek()?, b')' | b'(') {
            self.pos += 1;
        }
        let value = std::str::from_utf8(&self.input[value_start..self.pos]).ok()?;

        let tag = tag.to_string();
        let filter = match op {
            b'=' if value.trim() == "*" => Filter::Present(tag),
            b'=' => Filter::Equal(tag, value.to_string()),
            b'~' => Filter::Approx(tag, value.to_string()),
            b'>' => Filter::GreaterEq(tag, value.to_string()),
            _ => Filter::LessEq(tag, value.to_string()),
        };
        Some(filter)
    }
}
