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

//! Clause hierarchy
//!
//! A [`Clause`] is one constraint, or group of constraints, of a select query:
//!
//! - [`AtomicClause`]: a single subject / property / argument constraint
//!   compared with a [`Comparison`] method
//! - [`ConjunctiveClause`]: children evaluated together (logical AND)
//! - [`DisjunctiveClause`]: children on one shared subject, evaluated as
//!   alternatives (logical OR)
//!
//! Clauses may leave their subject unset and inherit it from the container
//! they are added to. The dict form only carries a subject where it differs
//! from the inherited one. Composite clauses are always tagged with their
//! `type`, since an untagged clause reads back as atomic.

use crate::comparison::Comparison;
use crate::error::{QueryError, Result};
use crate::term::{Identifier, Subject, Term, Value, Variable};
use crate::wire::{self, ApiVersion, DictScope, QUERY_SUBJECT};
use serde_json::{json, Map, Value as Json};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Discriminator of the clause variants, as carried by the dict `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Atomic,
    Conjunction,
    Union,
}

type ClauseDecoder = fn(&Json, &DictScope<'_>) -> Result<Clause>;

impl ClauseKind {
    pub const ALL: [ClauseKind; 3] = [ClauseKind::Atomic, ClauseKind::Conjunction, ClauseKind::Union];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseKind::Atomic => "atomic",
            ClauseKind::Conjunction => "conjunction",
            ClauseKind::Union => "union",
        }
    }

    fn decoder(self) -> ClauseDecoder {
        match self {
            ClauseKind::Atomic => decode_atomic as ClauseDecoder,
            ClauseKind::Conjunction => decode_conjunction as ClauseDecoder,
            ClauseKind::Union => decode_union as ClauseDecoder,
        }
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClauseKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        ClauseKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| QueryError::UnknownClauseType(s.to_string()))
    }
}

fn decode_atomic(data: &Json, scope: &DictScope<'_>) -> Result<Clause> {
    AtomicClause::decode(data, scope).map(Clause::Atomic)
}

fn decode_conjunction(data: &Json, scope: &DictScope<'_>) -> Result<Clause> {
    ConjunctiveClause::decode(data, scope).map(Clause::Conjunction)
}

fn decode_union(data: &Json, scope: &DictScope<'_>) -> Result<Clause> {
    DisjunctiveClause::decode(data, scope).map(Clause::Union)
}

/// Double dispatch over the clause variants.
pub trait ClauseVisitor {
    type Output;

    fn visit_atomic(&mut self, clause: &AtomicClause) -> Self::Output;

    fn visit_conjunction(&mut self, clause: &ConjunctiveClause) -> Self::Output;

    fn visit_disjunction(&mut self, clause: &DisjunctiveClause) -> Self::Output;
}

/// A single constraint: `subject property argument`, compared by `method`.
///
/// `property` is never a variable. `variable` is an explicit bound variable,
/// used when the clause both binds the property value and compares it (the
/// `greater_than` / `lesser_than` filters). An `any` clause with neither
/// argument nor variable fetches the property value into a fresh variable.
#[derive(Debug, Clone)]
pub struct AtomicClause {
    pub subject: Option<Subject>,
    pub property: Option<Identifier>,
    pub argument: Option<Term>,
    pub variable: Option<Variable>,
    pub method: Comparison,
    /// Whether the bound variable is returned to the caller
    pub project: bool,
    pub optional: bool,
}

impl Default for AtomicClause {
    fn default() -> Self {
        Self {
            subject: None,
            property: None,
            argument: None,
            variable: None,
            method: Comparison::Any,
            project: true,
            optional: false,
        }
    }
}

impl AtomicClause {
    pub fn new(property: Identifier) -> Self {
        Self {
            property: Some(property),
            ..Default::default()
        }
    }

    pub fn with_subject(mut self, subject: impl Into<Subject>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_argument(mut self, argument: impl Into<Term>) -> Self {
        self.argument = Some(argument.into());
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variable = Some(variable);
        self
    }

    pub fn with_method(mut self, method: Comparison) -> Self {
        self.method = method;
        self
    }

    pub fn with_project(mut self, project: bool) -> Self {
        self.project = project;
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// An `any` clause with nothing to compare against.
    pub fn is_fetch(&self) -> bool {
        self.method == Comparison::Any && self.argument.is_none() && self.variable.is_none()
    }

    pub fn is_defined(&self) -> bool {
        self.missing_parts(None).is_empty()
    }

    pub(crate) fn missing_parts(&self, inherited: Option<&Subject>) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.subject.is_none() && inherited.is_none() {
            missing.push("subject");
        }
        if self.property.is_none() {
            missing.push("property");
        }
        if self.argument.is_none() && self.variable.is_none() && self.method != Comparison::Any {
            missing.push("argument");
        }
        missing
    }

    pub(crate) fn ensure_defined(&self, inherited: Option<&Subject>) -> Result<()> {
        let missing = self.missing_parts(inherited);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(QueryError::UndefinedClause { missing })
        }
    }

    /// The argument when it is a variable, else the explicit variable standing in for it.
    pub fn argument_variable(&self) -> Option<&Variable> {
        match &self.argument {
            Some(Term::Variable(var)) => Some(var),
            Some(_) => None,
            None => self.variable.as_ref(),
        }
    }

    /// The explicit variable when it is not just the argument itself.
    pub fn distinct_variable(&self) -> Option<&Variable> {
        match (&self.argument, &self.variable) {
            (Some(_), Some(var)) if self.argument_variable() != Some(var) => Some(var),
            _ => None,
        }
    }

    // (argument, variable) with a variable standing in for a missing argument
    fn binding(&self) -> (Option<Term>, Option<&Variable>) {
        match (&self.argument, &self.variable) {
            (None, Some(var)) => (Some(Term::Variable(var.clone())), None),
            (argument, _) => (argument.clone(), self.distinct_variable()),
        }
    }

    pub fn to_dict(&self, version: ApiVersion) -> Result<Json> {
        self.encode(&DictScope::new(version))
    }

    /// Rebuilds a clause from its dict form. `subject` is the inherited one;
    /// a `subject` key in `data` overrides it.
    pub fn from_dict(data: &Json, subject: Option<&Subject>, version: ApiVersion) -> Result<Self> {
        Self::decode(data, &DictScope::new(version).with_subject(subject))
    }

    pub(crate) fn encode(&self, scope: &DictScope<'_>) -> Result<Json> {
        self.ensure_defined(scope.subject)?;

        let mut out = Map::new();
        if let Some(property) = &self.property {
            out.insert("property".into(), json!(property.as_str()));
        }
        out.insert("method".into(), json!(self.method.as_str()));
        out.insert("project".into(), json!(self.project));
        out.insert("optional".into(), json!(self.optional));
        if let Some(subject) = &self.subject {
            if scope.subject != Some(subject) {
                out.insert("subject".into(), json!(subject.to_string()));
            }
        }

        let (argument, variable) = self.binding();
        match argument {
            Some(Term::Value(value)) => {
                out.insert("value".into(), value.to_json());
            }
            Some(Term::Identifier(id)) => {
                out.insert("identifier".into(), json!(id.as_str()));
            }
            Some(Term::Variable(var)) => {
                let key = if variable.is_some() { "argument" } else { "variable" };
                out.insert(key.into(), json!(var.to_string()));
            }
            None => {}
        }
        if let Some(var) = variable {
            out.insert("variable".into(), json!(var.to_string()));
        }

        if scope.version.tags_clauses() {
            out.insert("type".into(), json!(ClauseKind::Atomic.as_str()));
        }
        Ok(Json::Object(out))
    }

    pub(crate) fn decode(data: &Json, scope: &DictScope<'_>) -> Result<Self> {
        let fields = wire::as_object(data, "clause")?;
        let mut clause = AtomicClause::default();

        for (key, val) in fields {
            match key.as_str() {
                "type" => {
                    let tag = wire::as_str(val, "type")?;
                    if tag != ClauseKind::Atomic.as_str() {
                        return Err(QueryError::WrongClauseType {
                            expected: ClauseKind::Atomic.as_str(),
                            found: tag.to_string(),
                        });
                    }
                }
                "property" => {
                    clause.property = Some(Identifier::new(wire::as_str(val, "property")?)?);
                }
                "subject" => {
                    clause.subject = Some(scope.resolve_subject(wire::as_str(val, "subject")?)?);
                }
                "variable" => {
                    let raw = wire::as_str(val, "variable")?;
                    clause.variable = Some(if raw == QUERY_SUBJECT {
                        scope.query_subject_variable()?
                    } else {
                        Variable::new(raw)?
                    });
                }
                // "argument" is the legacy spelling
                "argument" | "identifier" => {
                    clause.argument = Some(Term::from_json(val)?);
                }
                "value" => {
                    clause.argument = Some(Term::Value(Value::from_json(val)?));
                }
                "method" => {
                    clause.method = wire::as_str(val, "method")?.parse()?;
                }
                "project" => clause.project = wire::as_bool(val, "project")?,
                "optional" => clause.optional = wire::as_bool(val, "optional")?,
                other => return Err(QueryError::InvalidClauseKey(other.to_string())),
            }
        }

        if clause.subject.is_none() {
            clause.subject = scope.subject.cloned();
        }
        Ok(clause)
    }
}

impl PartialEq for AtomicClause {
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject
            && self.property == other.property
            && self.method == other.method
            && self.project == other.project
            && self.optional == other.optional
            && self.binding() == other.binding()
    }
}

/// Children evaluated together.
///
/// Fields are public: unlike a union, a conjunction places no constraint
/// on its children's subjects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConjunctiveClause {
    /// Default subject for children that carry none
    pub subject: Option<Subject>,
    pub clauses: Vec<Clause>,
    pub optional: bool,
}

impl ConjunctiveClause {
    pub fn new(clauses: Vec<Clause>, optional: bool) -> Self {
        Self {
            subject: None,
            clauses,
            optional,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<Subject>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn add_clause(&mut self, clause: impl Into<Clause>) -> &mut Self {
        self.clauses.push(clause.into());
        self
    }

    pub fn add_atomic_clause(
        &mut self,
        property: Identifier,
        argument: impl Into<Term>,
        method: Comparison,
        project: bool,
        optional: bool,
    ) -> &mut Self {
        let mut atom = AtomicClause::new(property)
            .with_argument(argument)
            .with_method(method)
            .with_project(project)
            .with_optional(optional);
        atom.subject = self.subject.clone();
        self.add_clause(atom)
    }

    pub fn to_dict(&self, version: ApiVersion) -> Result<Json> {
        self.encode(&DictScope::new(version))
    }

    pub fn from_dict(data: &Json, subject: Option<&Subject>, version: ApiVersion) -> Result<Self> {
        Self::decode(data, &DictScope::new(version).with_subject(subject))
    }

    pub(crate) fn encode(&self, scope: &DictScope<'_>) -> Result<Json> {
        let inner = scope.with_subject(self.subject.as_ref().or(scope.subject));
        let clauses = self
            .clauses
            .iter()
            .map(|clause| clause.encode(&inner))
            .collect::<Result<Vec<_>>>()?;

        let mut out = Map::new();
        out.insert("clauses".into(), Json::Array(clauses));
        if let Some(subject) = &self.subject {
            if scope.subject != Some(subject) {
                out.insert("subject".into(), json!(subject.to_string()));
            }
        }
        out.insert("type".into(), json!(ClauseKind::Conjunction.as_str()));
        if self.optional {
            out.insert("optional".into(), json!(true));
        }
        Ok(Json::Object(out))
    }

    pub(crate) fn decode(data: &Json, scope: &DictScope<'_>) -> Result<Self> {
        let fields = wire::as_object(data, "clause")?;
        check_composite_keys(fields, ClauseKind::Conjunction, &["optional"])?;

        let subject = match fields.get("subject") {
            Some(raw) => Some(scope.resolve_subject(wire::as_str(raw, "subject")?)?),
            None => scope.subject.cloned(),
        };
        let optional = match fields.get("optional") {
            Some(flag) => wire::as_bool(flag, "optional")?,
            None => false,
        };
        let clauses = decode_children(fields, &scope.with_subject(subject.as_ref()))?;

        Ok(Self {
            subject,
            clauses,
            optional,
        })
    }
}

/// Alternatives on one shared subject.
///
/// The shared subject is checked whenever a child is added, so a union can
/// never hold children on different subjects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisjunctiveClause {
    subject: Option<Subject>,
    clauses: Vec<Clause>,
}

impl DisjunctiveClause {
    /// Fails when the children do not share one subject (nor match `subject`).
    pub fn new(subject: Option<Subject>, clauses: Vec<Clause>) -> Result<Self> {
        let mut union = Self {
            subject,
            clauses: Vec::with_capacity(clauses.len()),
        };
        for clause in clauses {
            union.add_clause(clause)?;
        }
        Ok(union)
    }

    /// An empty union on `subject`.
    pub fn with_subject(subject: impl Into<Subject>) -> Self {
        Self {
            subject: Some(subject.into()),
            clauses: Vec::new(),
        }
    }

    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn add_clause(&mut self, clause: impl Into<Clause>) -> Result<&mut Self> {
        let mut clause = clause.into();
        match (self.subject.clone(), clause.subject().cloned()) {
            (Some(shared), Some(found)) if shared != found => {
                return Err(QueryError::MismatchedSubjects {
                    expected: shared.to_string(),
                    found: found.to_string(),
                });
            }
            (Some(shared), None) => clause.inherit_subject(&shared),
            (None, Some(found)) => {
                for sibling in &mut self.clauses {
                    sibling.inherit_subject(&found);
                }
                self.subject = Some(found);
            }
            _ => {}
        }
        self.clauses.push(clause);
        Ok(self)
    }

    pub fn add_atomic_clause(
        &mut self,
        property: Identifier,
        argument: impl Into<Term>,
        method: Comparison,
        project: bool,
        optional: bool,
    ) -> &mut Self {
        let mut atom = AtomicClause::new(property)
            .with_argument(argument)
            .with_method(method)
            .with_project(project)
            .with_optional(optional);
        atom.subject = self.subject.clone();
        self.clauses.push(Clause::Atomic(atom));
        self
    }

    pub fn to_dict(&self, version: ApiVersion) -> Result<Json> {
        self.encode(&DictScope::new(version))
    }

    pub fn from_dict(data: &Json, subject: Option<&Subject>, version: ApiVersion) -> Result<Self> {
        Self::decode(data, &DictScope::new(version).with_subject(subject))
    }

    pub(crate) fn encode(&self, scope: &DictScope<'_>) -> Result<Json> {
        let subject = self
            .subject
            .as_ref()
            .or(scope.subject)
            .ok_or_else(|| QueryError::UndefinedClause {
                missing: vec!["subject"],
            })?;
        let inner = scope.with_subject(Some(subject));
        let clauses = self
            .clauses
            .iter()
            .map(|clause| clause.encode(&inner))
            .collect::<Result<Vec<_>>>()?;

        let mut out = Map::new();
        out.insert("subject".into(), json!(subject.to_string()));
        out.insert("clauses".into(), Json::Array(clauses));
        out.insert("type".into(), json!(ClauseKind::Union.as_str()));
        Ok(Json::Object(out))
    }

    pub(crate) fn decode(data: &Json, scope: &DictScope<'_>) -> Result<Self> {
        let fields = wire::as_object(data, "clause")?;
        check_composite_keys(fields, ClauseKind::Union, &[])?;

        let subject = match fields.get("subject") {
            Some(raw) => Some(scope.resolve_subject(wire::as_str(raw, "subject")?)?),
            None => scope.subject.cloned(),
        };
        let clauses = decode_children(fields, &scope.with_subject(subject.as_ref()))?;
        Self::new(subject, clauses)
    }
}

fn check_composite_keys(fields: &Map<String, Json>, kind: ClauseKind, extra: &[&str]) -> Result<()> {
    for (key, val) in fields {
        match key.as_str() {
            "type" => {
                let tag = wire::as_str(val, "type")?;
                if tag != kind.as_str() {
                    return Err(QueryError::WrongClauseType {
                        expected: kind.as_str(),
                        found: tag.to_string(),
                    });
                }
            }
            "subject" | "clauses" => {}
            other if extra.contains(&other) => {}
            other => return Err(QueryError::InvalidClauseKey(other.to_string())),
        }
    }
    Ok(())
}

fn decode_children(fields: &Map<String, Json>, scope: &DictScope<'_>) -> Result<Vec<Clause>> {
    match fields.get("clauses") {
        Some(children) => wire::as_array(children, "clauses")?
            .iter()
            .map(|child| Clause::decode(child, scope))
            .collect(),
        None => Ok(Vec::new()),
    }
}

/// Any clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Atomic(AtomicClause),
    Conjunction(ConjunctiveClause),
    Union(DisjunctiveClause),
}

impl Clause {
    pub fn kind(&self) -> ClauseKind {
        match self {
            Clause::Atomic(_) => ClauseKind::Atomic,
            Clause::Conjunction(_) => ClauseKind::Conjunction,
            Clause::Union(_) => ClauseKind::Union,
        }
    }

    pub fn subject(&self) -> Option<&Subject> {
        match self {
            Clause::Atomic(clause) => clause.subject.as_ref(),
            Clause::Conjunction(clause) => clause.subject.as_ref(),
            Clause::Union(clause) => clause.subject(),
        }
    }

    pub fn is_optional(&self) -> bool {
        match self {
            Clause::Atomic(clause) => clause.optional,
            Clause::Conjunction(clause) => clause.optional,
            Clause::Union(_) => false,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.is_defined_in(None)
    }

    fn is_defined_in(&self, inherited: Option<&Subject>) -> bool {
        match self {
            Clause::Atomic(clause) => clause.missing_parts(inherited).is_empty(),
            Clause::Conjunction(clause) => {
                let inner = clause.subject.as_ref().or(inherited);
                clause.clauses.iter().all(|child| child.is_defined_in(inner))
            }
            Clause::Union(clause) => {
                let inner = clause.subject().or(inherited);
                inner.is_some() && clause.clauses().iter().all(|child| child.is_defined_in(inner))
            }
        }
    }

    pub fn as_atomic(&self) -> Option<&AtomicClause> {
        match self {
            Clause::Atomic(clause) => Some(clause),
            _ => None,
        }
    }

    /// Every atomic clause, depth first.
    pub fn atomics(&self) -> Vec<&AtomicClause> {
        let mut out = Vec::new();
        self.collect_atomics(&mut out);
        out
    }

    fn collect_atomics<'a>(&'a self, out: &mut Vec<&'a AtomicClause>) {
        match self {
            Clause::Atomic(clause) => out.push(clause),
            Clause::Conjunction(clause) => {
                for child in &clause.clauses {
                    child.collect_atomics(out);
                }
            }
            Clause::Union(clause) => {
                for child in clause.clauses() {
                    child.collect_atomics(out);
                }
            }
        }
    }

    /// Variables named anywhere in this clause, including composite subjects.
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<Variable>) {
        if let Some(var) = self.subject().and_then(Subject::as_variable) {
            out.insert(var.clone());
        }
        match self {
            Clause::Atomic(clause) => {
                if let Some(var) = clause.argument.as_ref().and_then(Term::as_variable) {
                    out.insert(var.clone());
                }
                if let Some(var) = &clause.variable {
                    out.insert(var.clone());
                }
            }
            Clause::Conjunction(clause) => {
                for child in &clause.clauses {
                    child.collect_variables(out);
                }
            }
            Clause::Union(clause) => {
                for child in clause.clauses() {
                    child.collect_variables(out);
                }
            }
        }
    }

    /// Whether this clause or any nested one compares by `method`.
    pub fn uses(&self, method: Comparison) -> bool {
        self.atomics().iter().any(|atom| atom.method == method)
    }

    pub fn accept<V: ClauseVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Clause::Atomic(clause) => visitor.visit_atomic(clause),
            Clause::Conjunction(clause) => visitor.visit_conjunction(clause),
            Clause::Union(clause) => visitor.visit_disjunction(clause),
        }
    }

    /// Fills in `subject` wherever no subject is set, recursively.
    pub(crate) fn inherit_subject(&mut self, subject: &Subject) {
        match self {
            Clause::Atomic(clause) => {
                if clause.subject.is_none() {
                    clause.subject = Some(subject.clone());
                }
            }
            Clause::Conjunction(clause) => {
                let inner = clause
                    .subject
                    .get_or_insert_with(|| subject.clone())
                    .clone();
                for child in &mut clause.clauses {
                    child.inherit_subject(&inner);
                }
            }
            Clause::Union(clause) => {
                let inner = clause
                    .subject
                    .get_or_insert_with(|| subject.clone())
                    .clone();
                for child in &mut clause.clauses {
                    child.inherit_subject(&inner);
                }
            }
        }
    }

    pub fn to_dict(&self, version: ApiVersion) -> Result<Json> {
        self.encode(&DictScope::new(version))
    }

    /// Rebuilds any clause, dispatching on the `type` key (absent means atomic).
    pub fn from_dict(data: &Json, subject: Option<&Subject>, version: ApiVersion) -> Result<Self> {
        Self::decode(data, &DictScope::new(version).with_subject(subject))
    }

    pub(crate) fn encode(&self, scope: &DictScope<'_>) -> Result<Json> {
        match self {
            Clause::Atomic(clause) => clause.encode(scope),
            Clause::Conjunction(clause) => clause.encode(scope),
            Clause::Union(clause) => clause.encode(scope),
        }
    }

    pub(crate) fn decode(data: &Json, scope: &DictScope<'_>) -> Result<Self> {
        let kind = match data.get("type") {
            Some(tag) => wire::as_str(tag, "type")?.parse()?,
            None => ClauseKind::Atomic,
        };
        (kind.decoder())(data, scope)
    }
}

impl From<AtomicClause> for Clause {
    fn from(clause: AtomicClause) -> Self {
        Clause::Atomic(clause)
    }
}

impl From<ConjunctiveClause> for Clause {
    fn from(clause: ConjunctiveClause) -> Self {
        Clause::Conjunction(clause)
    }
}

impl From<DisjunctiveClause> for Clause {
    fn from(clause: DisjunctiveClause) -> Self {
        Clause::Union(clause)
    }
}
