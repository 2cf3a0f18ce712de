// Route parameters extracted by the matcher

use crate::Error;
use std::str::FromStr;

/// Named placeholder captures, in pattern order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    entries: Vec<(String, String)>,
}

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: String, value: String) {
        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Parse a parameter, reporting a bad request when it is missing or
    /// malformed
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<T, Error> {
        let raw = self
            .get(name)
            .ok_or_else(|| Error::BadRequest(format!("missing route parameter `{}`", name)))?;
        raw.parse()
            .map_err(|_| Error::BadRequest(format!("invalid route parameter `{}`: {}", name, raw)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_parse() {
        let params: RouteParams = [("id", "42"), ("slug", "hello-world")].into_iter().collect();
        assert_eq!(params.get("slug"), Some("hello-world"));
        assert_eq!(params.parse::<u64>("id").unwrap(), 42);

        assert!(matches!(params.parse::<u64>("slug"), Err(Error::BadRequest(_))));
        assert!(matches!(params.parse::<u64>("missing"), Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_iteration_keeps_order() {
        let params: RouteParams = [("b", "2"), ("a", "1")].into_iter().collect();
        let names: Vec<&str> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
