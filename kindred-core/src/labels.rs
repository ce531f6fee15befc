//! Label selection used by the lister and list calls.
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    iter::FromIterator,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// local type aliases
type Map = BTreeMap<String, String>;
type Expressions = Vec<Expression>;

#[derive(Debug, Error)]
#[error("failed to parse label selector: {0}")]
/// Failed to parse a label selector string.
pub struct ParseSelectorError(pub String);

/// A selector expression with existing operations
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[allow(missing_docs)]
pub enum Expression {
    In(String, BTreeSet<String>),
    NotIn(String, BTreeSet<String>),
    Equal(String, String),
    NotEqual(String, String),
    Exists(String),
    DoesNotExist(String),
}

/// Perform selection on a list of expressions
#[derive(Clone, Debug, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct Selector(Expressions);

impl Selector {
    /// Create a selector from a vector of expressions
    fn from_expressions(exprs: Expressions) -> Self {
        Self(exprs)
    }

    /// Create a selector from a map of key=value label matches
    fn from_map(map: Map) -> Self {
        Self(map.into_iter().map(|(k, v)| Expression::Equal(k, v)).collect())
    }

    /// Indicates whether this selector matches everything
    pub fn selects_all(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every expression matches the given label set
    pub fn matches(&self, labels: &Map) -> bool {
        for expr in self.0.iter() {
            if !expr.matches(labels) {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let selectors: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", selectors.join(","))
    }
}

// === Expression ===

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::In(key, values) => {
                write!(
                    f,
                    "{key} in ({})",
                    values.iter().cloned().collect::<Vec<_>>().join(",")
                )
            }
            Expression::NotIn(key, values) => {
                write!(
                    f,
                    "{key} notin ({})",
                    values.iter().cloned().collect::<Vec<_>>().join(",")
                )
            }
            Expression::Equal(key, value) => write!(f, "{key}={value}"),
            Expression::NotEqual(key, value) => write!(f, "{key}!={value}"),
            Expression::Exists(key) => write!(f, "{key}"),
            Expression::DoesNotExist(key) => write!(f, "!{key}"),
        }
    }
}

impl Expression {
    fn matches(&self, labels: &Map) -> bool {
        match self {
            Expression::In(key, values) => match labels.get(key) {
                Some(v) => values.contains(v),
                None => false,
            },
            Expression::NotIn(key, values) => match labels.get(key) {
                Some(v) => !values.contains(v),
                None => true,
            },
            Expression::Exists(key) => labels.contains_key(key),
            Expression::DoesNotExist(key) => !labels.contains_key(key),
            Expression::Equal(key, value) => labels.get(key) == Some(value),
            Expression::NotEqual(key, value) => labels.get(key) != Some(value),
        }
    }
}

// convenience conversions for Selector

impl FromIterator<(String, String)> for Selector {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl FromIterator<(&'static str, &'static str)> for Selector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl FromIterator<Expression> for Selector {
    fn from_iter<T: IntoIterator<Item = Expression>>(iter: T) -> Self {
        Self::from_expressions(iter.into_iter().collect())
    }
}

impl From<Expression> for Selector {
    fn from(value: Expression) -> Self {
        Self(vec![value])
    }
}

impl FromStr for Selector {
    type Err = ParseSelectorError;

    /// Parse the common selector grammar:
    /// `k=v`, `k==v`, `k!=v`, `k`, `!k`, `k in (a,b)`, `k notin (a,b)`,
    /// comma separated. An empty string selects everything.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut exprs = Expressions::new();
        for raw in split_requirements(s) {
            let req = raw.trim();
            if req.is_empty() {
                continue;
            }
            exprs.push(parse_requirement(req).ok_or_else(|| ParseSelectorError(req.to_string()))?);
        }
        Ok(Self(exprs))
    }
}

// Splits on commas that are not inside a set literal.
fn split_requirements(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

fn parse_requirement(req: &str) -> Option<Expression> {
    if let Some((key, rest)) = req.split_once(" notin ") {
        return Some(Expression::NotIn(key.trim().to_string(), parse_set(rest)?));
    }
    if let Some((key, rest)) = req.split_once(" in ") {
        return Some(Expression::In(key.trim().to_string(), parse_set(rest)?));
    }
    if let Some((key, value)) = req.split_once("!=") {
        return Some(Expression::NotEqual(
            key.trim().to_string(),
            value.trim().to_string(),
        ));
    }
    if let Some((key, value)) = req.split_once("==").or_else(|| req.split_once('=')) {
        return Some(Expression::Equal(
            key.trim().to_string(),
            value.trim().to_string(),
        ));
    }
    if let Some(key) = req.strip_prefix('!') {
        return Some(Expression::DoesNotExist(key.trim().to_string()));
    }
    Some(Expression::Exists(req.to_string()))
}

fn parse_set(rest: &str) -> Option<BTreeSet<String>> {
    let inner = rest.trim().strip_prefix('(')?.strip_suffix(')')?;
    Some(
        inner
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Map {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn selector_matching() {
        let selector: Selector = [("app", "web"), ("tier", "frontend")].into_iter().collect();
        assert!(selector.matches(&labels(&[("app", "web"), ("tier", "frontend"), ("x", "y")])));
        assert!(!selector.matches(&labels(&[("app", "web")])));
        assert!(Selector::default().matches(&labels(&[])));
    }

    #[test]
    fn parse_and_display_roundtrip() {
        let s: Selector = "app=web,tier!=cache,env in (dev,ci),!legacy,owner"
            .parse()
            .unwrap();
        assert!(s.matches(&labels(&[("app", "web"), ("env", "ci"), ("owner", "me")])));
        assert!(!s.matches(&labels(&[("app", "web"), ("env", "prod"), ("owner", "me")])));
        assert!(!s.matches(&labels(&[
            ("app", "web"),
            ("env", "ci"),
            ("owner", "me"),
            ("legacy", "1")
        ])));

        let printed = s.to_string();
        let reparsed: Selector = printed.parse().unwrap();
        assert_eq!(s, reparsed);
    }

    #[test]
    fn parse_rejects_unclosed_set() {
        assert!("env in (dev".parse::<Selector>().is_err());
    }
}
