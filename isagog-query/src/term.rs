// Copyright 2025 Isagog Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Query terms
//!
//! Every argument slot of a clause holds exactly one of three disjoint kinds of
//! term: an [`Identifier`] (an absolute or prefixed IRI), a [`Variable`] bound
//! within one query, or a literal [`Value`]. Misclassifying a term silently
//! corrupts generated queries, so each kind is validated at construction and
//! never coerced into another.

use crate::error::{QueryError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

static VARIABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("Invalid regex pattern"));

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[A-Za-z][A-Za-z0-9+.\-_]*:[^\s<>"{}|\\^`]*$"#).expect("Invalid regex pattern")
});

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";

fn strip_brackets(raw: &str) -> &str {
    raw.strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(raw)
}

/// Quotes a string as a SPARQL string literal.
pub(crate) fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// An absolute or prefixed IRI, stored without angle brackets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Parses an IRI, accepting an optional pair of surrounding angle brackets.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref();
        if Self::is_valid(raw) {
            Ok(Self(strip_brackets(raw).to_string()))
        } else {
            Err(QueryError::InvalidIdentifier(raw.to_string()))
        }
    }

    /// Whether `raw` can be an identifier: a scheme or prefix, no whitespace, no `?` lead.
    pub fn is_valid(raw: &str) -> bool {
        let iri = strip_brackets(raw);
        !iri.starts_with('?') && IDENTIFIER_RE.is_match(iri)
    }

    pub(crate) fn from_static(iri: &'static str) -> Self {
        Self(iri.to_string())
    }

    pub fn rdf_type() -> Self {
        Self::from_static(RDF_TYPE)
    }

    pub fn rdfs_label() -> Self {
        Self::from_static(RDFS_LABEL)
    }

    pub fn owl_class() -> Self {
        Self::from_static(OWL_CLASS)
    }

    pub fn owl_thing() -> Self {
        Self::from_static(OWL_THING)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// N3 form, `<iri>`.
    pub fn n3(&self) -> String {
        format!("<{}>", self.0)
    }

    /// The part after the last `#` or `/`.
    pub fn local_name(&self) -> &str {
        self.0
            .rsplit(|c: char| c == '#' || c == '/')
            .next()
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A query variable. The bare name is stored; `Display` adds the `?`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(String);

impl Variable {
    /// Accepts `name` or `?name`, where the name matches `^[A-Za-z0-9_]+$`.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let raw = name.as_ref();
        let bare = raw.strip_prefix('?').unwrap_or(raw);
        if VARIABLE_NAME_RE.is_match(bare) {
            Ok(Self(bare.to_string()))
        } else {
            Err(QueryError::InvalidVariable(raw.to_string()))
        }
    }

    pub fn is_valid(raw: &str) -> bool {
        VARIABLE_NAME_RE.is_match(raw.strip_prefix('?').unwrap_or(raw))
    }

    pub(crate) fn from_static(name: &'static str) -> Self {
        Self(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl FromStr for Variable {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Mints anonymous variables from a monotonically increasing counter.
///
/// A supply is scoped to one build or render session; names never repeat
/// within it, and names marked as reserved are skipped. Safe to share
/// between threads.
#[derive(Debug)]
pub struct VariableSupply {
    prefix: String,
    next: AtomicU64,
    reserved: BTreeSet<Variable>,
}

impl Default for VariableSupply {
    fn default() -> Self {
        Self {
            prefix: "_v".to_string(),
            next: AtomicU64::new(0),
            reserved: BTreeSet::new(),
        }
    }
}

impl VariableSupply {
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        if !VARIABLE_NAME_RE.is_match(&prefix) {
            return Err(QueryError::InvalidVariable(prefix));
        }
        Ok(Self {
            prefix,
            next: AtomicU64::new(0),
            reserved: BTreeSet::new(),
        })
    }

    /// Marks names already taken by the caller; `fresh` never returns them.
    pub fn reserve(mut self, variables: impl IntoIterator<Item = Variable>) -> Self {
        self.reserved.extend(variables);
        self
    }

    pub fn fresh(&self) -> Variable {
        loop {
            let n = self.next.fetch_add(1, Ordering::Relaxed);
            let var = Variable(format!("{}{}", self.prefix, n));
            if !self.reserved.contains(&var) {
                return var;
            }
        }
    }

    /// Counter position: names minted plus reserved names skipped
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl Value {
    /// A string literal. Text shaped like an identifier (`<...>`) or a
    /// variable (`?...`) is rejected; pass the typed term instead.
    pub fn text(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let looks_like_id = text.starts_with('<') && text.ends_with('>');
        if looks_like_id || text.starts_with('?') {
            return Err(QueryError::InvalidValue(text));
        }
        Ok(Value::Text(text))
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Self::text(s.as_str()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Integer(i)),
                None => n
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| QueryError::InvalidValue(n.to_string())),
            },
            other => Err(QueryError::InvalidValue(other.to_string())),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
        }
    }

    /// SPARQL literal form: strings are quoted, numbers are bare.
    pub fn sparql(&self) -> String {
        match self {
            Value::Text(s) => quote(s),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format!("{:?}", f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// Any clause argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Identifier(Identifier),
    Variable(Variable),
    Value(Value),
}

impl Term {
    /// Classifies a bare string: a `?` lead makes a variable, a valid IRI an
    /// identifier, anything else a literal value.
    ///
    /// Fails only when the chosen kind rejects the text, e.g. `?bad name` or
    /// `<not an iri>`.
    pub fn classify(raw: &str) -> Result<Self> {
        if raw.starts_with('?') {
            Variable::new(raw).map(Term::Variable)
        } else if Identifier::is_valid(raw) {
            Identifier::new(raw).map(Term::Identifier)
        } else {
            Value::text(raw).map(Term::Value)
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Self::classify(s),
            other => Value::from_json(other).map(Term::Value),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Term::Identifier(id) => serde_json::Value::String(id.to_string()),
            Term::Variable(var) => serde_json::Value::String(var.to_string()),
            Term::Value(value) => value.to_json(),
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Term::Variable(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Term::Identifier(id) => Some(id),
            _ => None,
        }
    }

    pub fn sparql(&self) -> String {
        match self {
            Term::Identifier(id) => id.n3(),
            Term::Variable(var) => var.to_string(),
            Term::Value(value) => value.sparql(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Identifier(id) => id.fmt(f),
            Term::Variable(var) => var.fmt(f),
            Term::Value(value) => value.fmt(f),
        }
    }
}

impl From<Identifier> for Term {
    fn from(id: Identifier) -> Self {
        Term::Identifier(id)
    }
}

impl From<Variable> for Term {
    fn from(var: Variable) -> Self {
        Term::Variable(var)
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Term::Value(value)
    }
}

/// What a clause constrains: a fixed entity or a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    Identifier(Identifier),
    Variable(Variable),
}

impl Subject {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.starts_with('?') {
            Variable::new(raw).map(Subject::Variable)
        } else if Identifier::is_valid(raw) {
            Identifier::new(raw).map(Subject::Identifier)
        } else {
            Err(QueryError::InvalidSubject(raw.to_string()))
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Subject::Variable(var) => Some(var),
            Subject::Identifier(_) => None,
        }
    }

    pub fn sparql(&self) -> String {
        match self {
            Subject::Identifier(id) => id.n3(),
            Subject::Variable(var) => var.to_string(),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Identifier(id) => id.fmt(f),
            Subject::Variable(var) => var.fmt(f),
        }
    }
}

impl FromStr for Subject {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Identifier> for Subject {
    fn from(id: Identifier) -> Self {
        Subject::Identifier(id)
    }
}

impl From<Variable> for Subject {
    fn from(var: Variable) -> Self {
        Subject::Variable(var)
    }
}

impl From<Subject> for Term {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::Identifier(id) => Term::Identifier(id),
            Subject::Variable(var) => Term::Variable(var),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identifier_strips_brackets() {
        let id = Identifier::new("<http://ex.org/alice>").unwrap();
        assert_eq!(id.as_str(), "http://ex.org/alice");
        assert_eq!(id.n3(), "<http://ex.org/alice>");
        assert_eq!(id.local_name(), "alice");
        assert!(Identifier::new("rdf:type").is_ok());
    }

    #[test]
    fn test_identifier_rejects_variables_and_text() {
        assert!(Identifier::new("?x").is_err());
        assert!(Identifier::new("plain words").is_err());
        assert!(Identifier::new("http://ex.org/a b").is_err());
        assert!(Identifier::new("").is_err());
    }

    #[test]
    fn test_variable_names() {
        let var = Variable::new("?person_1").unwrap();
        assert_eq!(var.name(), "person_1");
        assert_eq!(var.to_string(), "?person_1");
        assert_eq!(Variable::new("person_1").unwrap(), var);
        assert!(Variable::new("?bad-name").is_err());
        assert!(Variable::new("??x").is_err());
        assert!(Variable::new("").is_err());
    }

    #[test]
    fn test_supply_never_repeats() {
        let supply = VariableSupply::default();
        let a = supply.fresh();
        let b = supply.fresh();
        assert_eq!(a.to_string(), "?_v0");
        assert_eq!(b.to_string(), "?_v1");
        assert_eq!(supply.issued(), 2);
        assert!(VariableSupply::new("not valid").is_err());
    }

    #[test]
    fn test_supply_skips_reserved_names() {
        let taken = [Variable::new("_v0").unwrap(), Variable::new("_v2").unwrap()];
        let supply = VariableSupply::default().reserve(taken);
        assert_eq!(supply.fresh().to_string(), "?_v1");
        assert_eq!(supply.fresh().to_string(), "?_v3");
        assert_eq!(supply.fresh().to_string(), "?_v4");
    }

    #[test]
    fn test_value_rejects_term_lookalikes() {
        assert!(Value::text("<http://ex.org/a>").is_err());
        assert!(Value::text("?x").is_err());
        assert_eq!(Value::text("Alice").unwrap().sparql(), "\"Alice\"");
        assert_eq!(Value::from(42).sparql(), "42");
        assert_eq!(Value::from(1.5).sparql(), "1.5");
        assert_eq!(Value::text("say \"hi\"").unwrap().sparql(), r#""say \"hi\"""#);
    }

    #[test]
    fn test_value_json() {
        let json = serde_json::json!(7);
        assert_eq!(Value::from_json(&json).unwrap(), Value::Integer(7));
        assert_eq!(Value::Integer(7).to_json(), json);
        assert!(Value::from_json(&serde_json::json!(true)).is_err());
    }

    #[test]
    fn test_classify() {
        assert!(matches!(Term::classify("?x").unwrap(), Term::Variable(_)));
        assert!(matches!(
            Term::classify("http://ex.org/a").unwrap(),
            Term::Identifier(_)
        ));
        assert!(matches!(
            Term::classify("<http://ex.org/a>").unwrap(),
            Term::Identifier(_)
        ));
        assert!(matches!(
            Term::classify("hello world").unwrap(),
            Term::Value(Value::Text(_))
        ));
        assert!(Term::classify("<not an iri>").is_err());
        assert!(Term::classify("?not a var").is_err());
    }

    #[test]
    fn test_subject_parse() {
        assert!(matches!(Subject::parse("?s").unwrap(), Subject::Variable(_)));
        assert!(matches!(
            Subject::parse("http://ex.org/a").unwrap(),
            Subject::Identifier(_)
        ));
        assert!(Subject::parse("just text").is_err());
    }

    proptest! {
        #[test]
        fn prop_classify_is_deterministic(raw in "\\PC*") {
            let first = Term::classify(&raw);
            let second = Term::classify(&raw);
            prop_assert_eq!(first.is_ok(), second.is_ok());
            if let (Ok(a), Ok(b)) = (first, second) {
                prop_assert_eq!(a, b);
            }
        }

        #[test]
        fn prop_plain_words_are_values(raw in "[a-z ]{1,20}") {
            prop_assert!(matches!(Term::classify(&raw), Ok(Term::Value(_))));
        }

        #[test]
        fn prop_valid_names_are_variables(name in "[A-Za-z0-9_]{1,12}") {
            let raw = format!("?{}", name);
            let classified = Term::classify(&raw);
            prop_assert!(matches!(classified, Ok(Term::Variable(ref v)) if v.name() == name));
        }
    }
}
