//! Path patterns
//!
//! A pattern is a sequence of literal text and named placeholders:
//!
//! - `{name}` matches one or more characters other than `/`
//! - `{name:regex}` matches the given regex; the regex may contain its own
//!   braces, e.g. `{year:\d{4}}`
//!
//! Placeholder names must match `[A-Za-z_][A-Za-z0-9_]*` and be unique within
//! a pattern. Patterns compile to a single anchored [`Regex`].

use super::RouteParams;
use crate::Error;
use regex::Regex;

const DEFAULT_SEGMENT: &str = "[^/]+";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Placeholder { name: String, regex: Option<String> },
}

/// A compiled route path pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    names: Vec<String>,
    regex: Regex,
}

impl PathPattern {
    /// Compile a pattern.
    ///
    /// One trailing slash is stripped from any pattern other than `/`, the
    /// same normalization applied to request paths.
    pub fn parse(pattern: &str) -> Result<Self, Error> {
        let source = normalize_path(pattern).to_string();
        if !source.starts_with('/') {
            return Err(Error::InvalidRoute(format!(
                "pattern `{}` must start with `/`",
                pattern
            )));
        }

        let tokens = tokenize(&source)?;
        let mut names = Vec::new();
        let mut expr = String::from("^");

        for token in tokens {
            match token {
                Token::Literal(text) => expr.push_str(&regex::escape(&text)),
                Token::Placeholder { name, regex } => {
                    if names.contains(&name) {
                        return Err(Error::InvalidRoute(format!(
                            "placeholder `{}` appears twice in `{}`",
                            name, source
                        )));
                    }
                    let body = regex.as_deref().unwrap_or(DEFAULT_SEGMENT);
                    expr.push_str(&format!("(?P<{}>{})", name, body));
                    names.push(name);
                }
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| {
            Error::InvalidRoute(format!("pattern `{}` has an invalid regex: {}", source, e))
        })?;

        Ok(Self {
            source,
            names,
            regex,
        })
    }

    /// The normalized pattern text
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholder names in declaration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Match an already-normalized path, returning the captured params
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let captures = self.regex.captures(path)?;
        let mut params = RouteParams::default();
        for name in &self.names {
            if let Some(value) = captures.name(name) {
                params.push(name.clone(), value.as_str().to_string());
            }
        }
        Some(params)
    }
}

/// Strip exactly one trailing slash from anything but the root path.
pub fn normalize_path(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

fn tokenize(pattern: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.char_indices();

    while let Some((start, c)) = chars.next() {
        match c {
            '{' => {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }

                let mut depth = 1;
                let mut end = None;
                for (i, c) in chars.by_ref() {
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                end = Some(i);
                                break;
                            }
                        }
                        _ => {}
                    }
                }

                let end = end.ok_or_else(|| {
                    Error::InvalidRoute(format!("unclosed `{{` in pattern `{}`", pattern))
                })?;
                tokens.push(placeholder(&pattern[start + 1..end], pattern)?);
            }
            '}' => {
                return Err(Error::InvalidRoute(format!(
                    "unmatched `}}` in pattern `{}`",
                    pattern
                )));
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

fn placeholder(inner: &str, pattern: &str) -> Result<Token, Error> {
    let (name, regex) = match inner.split_once(':') {
        Some((name, regex)) => (name.trim(), Some(regex.trim())),
        None => (inner.trim(), None),
    };

    if !is_identifier(name) {
        return Err(Error::InvalidRoute(format!(
            "invalid placeholder name `{}` in pattern `{}`",
            name, pattern
        )));
    }
    if regex.is_some_and(str::is_empty) {
        return Err(Error::InvalidRoute(format!(
            "placeholder `{}` in pattern `{}` has an empty regex",
            name, pattern
        )));
    }

    Ok(Token::Placeholder {
        name: name.to_string(),
        regex: regex.map(str::to_string),
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
