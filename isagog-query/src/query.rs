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

//! Select queries
//!
//! [`SelectQuery`] holds the clause list and result options shared by every
//! select query. [`UnarySelectQuery`] is a select query about one subject,
//! with builders for the usual kind, fetch and match constraints and the dict
//! form sent to the knowledge graph service.

use crate::clause::{AtomicClause, Clause, ClauseKind, ConjunctiveClause, DisjunctiveClause};
use crate::comparison::Comparison;
use crate::error::{QueryError, Result};
use crate::generator::Generator;
use crate::term::{Identifier, Subject, Term, Variable};
use crate::wire::{self, ApiVersion, DictScope, SUBJECT_VARIABLE};
use serde_json::{json, Map, Value as Json};
use std::collections::BTreeSet;
use tracing::debug;

/// Variable bound to the subject's kinds.
pub const KIND_VARIABLE: &str = "_kind";

/// Variable bound to the full text search score.
pub const SCORE_VARIABLE: &str = "_score";

pub const DEFAULT_GRAPH: &str = "defaultGraph";

pub const DEFAULT_LANG: &str = "en";

/// `limit` value meaning no result cap.
pub const UNLIMITED: i64 = -1;

const QUERY_KEYS: [&str; 9] = [
    "subject",
    "kinds",
    "clauses",
    "graph",
    "limit",
    "lang",
    "min_score",
    "minScore",
    "dataset",
];

/// Prefix declarations used when a query supplies none.
pub fn default_prefixes() -> Vec<(String, String)> {
    [
        ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
        ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
        ("text", "http://jena.apache.org/text#"),
    ]
    .into_iter()
    .map(|(name, ns)| (name.to_string(), ns.to_string()))
    .collect()
}

/// Anything [`SelectQuery::add`] accepts.
#[derive(Debug, Clone)]
pub enum ClauseSource {
    Clause(Clause),
    /// Children wrapped into a composite of `kind` (conjunction or union)
    List {
        clauses: Vec<Clause>,
        kind: ClauseKind,
        optional: bool,
        subject: Option<Subject>,
    },
    /// Raw dict data, dispatched on its `type` key
    Data(Json),
}

impl ClauseSource {
    pub fn conjunction(clauses: Vec<Clause>, optional: bool) -> Self {
        ClauseSource::List {
            clauses,
            kind: ClauseKind::Conjunction,
            optional,
            subject: None,
        }
    }

    pub fn union(subject: Option<Subject>, clauses: Vec<Clause>) -> Self {
        ClauseSource::List {
            clauses,
            kind: ClauseKind::Union,
            optional: false,
            subject,
        }
    }

    fn into_clause(self, scope: &DictScope<'_>) -> Result<Clause> {
        match self {
            ClauseSource::Clause(clause) => Ok(clause),
            ClauseSource::List {
                clauses,
                kind,
                optional,
                subject,
            } => match kind {
                ClauseKind::Conjunction => Ok(Clause::Conjunction(ConjunctiveClause {
                    subject,
                    clauses,
                    optional,
                })),
                ClauseKind::Union => DisjunctiveClause::new(subject, clauses).map(Clause::Union),
                ClauseKind::Atomic => Err(QueryError::UnknownListType(ClauseKind::Atomic.as_str())),
            },
            ClauseSource::Data(data) => Clause::decode(&data, scope),
        }
    }
}

impl From<Clause> for ClauseSource {
    fn from(clause: Clause) -> Self {
        ClauseSource::Clause(clause)
    }
}

impl From<AtomicClause> for ClauseSource {
    fn from(clause: AtomicClause) -> Self {
        ClauseSource::Clause(clause.into())
    }
}

impl From<ConjunctiveClause> for ClauseSource {
    fn from(clause: ConjunctiveClause) -> Self {
        ClauseSource::Clause(clause.into())
    }
}

impl From<DisjunctiveClause> for ClauseSource {
    fn from(clause: DisjunctiveClause) -> Self {
        ClauseSource::Clause(clause.into())
    }
}

impl From<Vec<Clause>> for ClauseSource {
    fn from(clauses: Vec<Clause>) -> Self {
        ClauseSource::conjunction(clauses, false)
    }
}

impl From<Json> for ClauseSource {
    fn from(data: Json) -> Self {
        ClauseSource::Data(data)
    }
}

/// A selection query: clauses in evaluation order plus result options.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    /// `(name, namespace)` pairs
    pub prefixes: Vec<(String, String)>,
    clauses: Vec<Clause>,
    pub graph: String,
    /// Result cap, [`UNLIMITED`] for none
    pub limit: i64,
    pub lang: String,
    /// Score floor, only meaningful for scored queries
    pub min_score: Option<f64>,
}

impl Default for SelectQuery {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
            clauses: Vec::new(),
            graph: DEFAULT_GRAPH.to_string(),
            limit: UNLIMITED,
            lang: DEFAULT_LANG.to_string(),
            min_score: None,
        }
    }
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Adds a clause, a list of clauses or raw clause data.
    ///
    /// An atomic keyword search clause always goes first.
    pub fn add(&mut self, source: impl Into<ClauseSource>) -> Result<&mut Self> {
        let clause = source
            .into()
            .into_clause(&DictScope::new(ApiVersion::Latest))?;
        self.push(clause);
        Ok(self)
    }

    pub(crate) fn push(&mut self, clause: Clause) {
        let keyword = is_keyword(&clause);
        debug!(kind = %clause.kind(), keyword, "adding clause");
        if keyword {
            self.clauses.insert(0, clause);
        } else {
            self.clauses.push(clause);
        }
    }

    /// Appends a decoded clause. Stored clauses are already ordered, so a
    /// keyword clause joins the leading keyword run instead of jumping it.
    pub(crate) fn restore(&mut self, clause: Clause) {
        if is_keyword(&clause) {
            let at = self.clauses.iter().take_while(|c| is_keyword(c)).count();
            self.clauses.insert(at, clause);
        } else {
            self.clauses.push(clause);
        }
    }

    /// Every variable named by the clauses, nested ones included.
    pub fn variables(&self) -> BTreeSet<Variable> {
        self.clauses.iter().flat_map(Clause::variables).collect()
    }

    /// Whether any clause, nested ones included, is a keyword search.
    pub fn is_scored(&self) -> bool {
        self.clauses.iter().any(|c| c.uses(Comparison::Keyword))
    }

    pub fn atomic_clauses(&self) -> Vec<&AtomicClause> {
        self.clauses.iter().filter_map(Clause::as_atomic).collect()
    }

    pub fn conjunctive_clauses(&self) -> Vec<&ConjunctiveClause> {
        self.clauses
            .iter()
            .filter_map(|c| match c {
                Clause::Conjunction(conj) => Some(conj),
                _ => None,
            })
            .collect()
    }

    pub fn disjunctive_clauses(&self) -> Vec<&DisjunctiveClause> {
        self.clauses
            .iter()
            .filter_map(|c| match c {
                Clause::Union(union) => Some(union),
                _ => None,
            })
            .collect()
    }

    pub fn has_disjunctive_clauses(&self) -> bool {
        self.clauses.iter().any(|c| c.kind() == ClauseKind::Union)
    }

    /// Projecting atomic clauses, nested ones included.
    pub fn project_clauses(&self) -> Vec<&AtomicClause> {
        self.clauses
            .iter()
            .flat_map(Clause::atomics)
            .filter(|atom| atom.project)
            .collect()
    }

    /// Variables returned to the caller: the argument and subject variables
    /// of every projecting clause.
    pub fn project_vars(&self) -> BTreeSet<Variable> {
        let mut vars = BTreeSet::new();
        for atom in self.project_clauses() {
            if let Some(var) = atom.argument_variable() {
                vars.insert(var.clone());
            }
            if let Some(var) = atom.subject.as_ref().and_then(Subject::as_variable) {
                vars.insert(var.clone());
            }
        }
        vars
    }

    pub fn has_return_vars(&self) -> bool {
        !self.project_vars().is_empty()
    }

    pub fn generate<G: Generator + ?Sized>(&self, generator: &G) -> Result<String> {
        generator.generate_query(self)
    }

    /// Dict form without a query subject: every clause must carry its own.
    pub fn to_dict(&self, version: ApiVersion) -> Result<Json> {
        let mut out = Map::new();
        self.encode_into(&mut out, &DictScope::new(version))?;
        Ok(Json::Object(out))
    }

    fn encode_into(&self, out: &mut Map<String, Json>, scope: &DictScope<'_>) -> Result<()> {
        let clauses = self
            .clauses
            .iter()
            .map(|clause| clause.encode(scope))
            .collect::<Result<Vec<_>>>()?;
        out.insert("clauses".into(), Json::Array(clauses));
        out.insert("graph".into(), json!(self.graph));
        out.insert("limit".into(), json!(self.limit));
        out.insert("lang".into(), json!(self.lang));
        if let Some(min_score) = self.min_score {
            out.insert("min_score".into(), json!(min_score));
        }
        Ok(())
    }

    // graph, limit, lang and score options of the dict form
    fn decode_option(&mut self, key: &str, val: &Json) -> Result<()> {
        match key {
            "graph" => self.graph = wire::as_str(val, key)?.to_string(),
            "limit" => {
                self.limit = val
                    .as_i64()
                    .ok_or_else(|| QueryError::invalid_field(key, format!("expected an integer, found {}", val)))?;
            }
            "lang" => self.lang = wire::as_str(val, key)?.to_string(),
            "min_score" | "minScore" => {
                let score = val
                    .as_f64()
                    .ok_or_else(|| QueryError::invalid_field(key, format!("expected a number, found {}", val)))?;
                self.min_score = Some(score);
            }
            _ => {}
        }
        Ok(())
    }
}

/// A select query about a single subject, `?_subj` unless given.
#[derive(Debug, Clone, PartialEq)]
pub struct UnarySelectQuery {
    subject: Subject,
    select: SelectQuery,
}

impl Default for UnarySelectQuery {
    fn default() -> Self {
        Self {
            subject: Subject::Variable(Variable::from_static(SUBJECT_VARIABLE)),
            select: SelectQuery::default(),
        }
    }
}

impl UnarySelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_subject(subject: impl Into<Subject>) -> Self {
        Self {
            subject: subject.into(),
            select: SelectQuery::default(),
        }
    }

    pub fn with_prefixes(mut self, prefixes: Vec<(String, String)>) -> Self {
        self.select.prefixes = prefixes;
        self
    }

    pub fn with_graph(mut self, graph: impl Into<String>) -> Self {
        self.select.graph = graph.into();
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.select.limit = limit;
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.select.lang = lang.into();
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.select.min_score = Some(min_score);
        self
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn select(&self) -> &SelectQuery {
        &self.select
    }

    pub fn clauses(&self) -> &[Clause] {
        self.select.clauses()
    }

    pub fn is_scored(&self) -> bool {
        self.select.is_scored()
    }

    pub fn project_vars(&self) -> BTreeSet<Variable> {
        self.select.project_vars()
    }

    pub fn generate<G: Generator + ?Sized>(&self, generator: &G) -> Result<String> {
        self.select.generate(generator)
    }

    /// Adds a clause; clauses without a subject take the query's.
    pub fn add(&mut self, source: impl Into<ClauseSource>) -> Result<&mut Self> {
        let clause = source
            .into()
            .into_clause(&DictScope::for_query(ApiVersion::Latest, &self.subject))?;
        self.push(clause);
        Ok(self)
    }

    fn push(&mut self, mut clause: Clause) {
        clause.inherit_subject(&self.subject);
        self.select.push(clause);
    }

    /// Constrains the subject's kinds.
    ///
    /// The first kind becomes a mandatory exact clause; any further kinds
    /// become one union of exact clauses. A projecting `rdf:type` clause
    /// binding `?_kind` is added once so results always report a kind.
    pub fn add_kinds<I>(&mut self, kinds: I) -> &mut Self
    where
        I: IntoIterator<Item = Identifier>,
    {
        let mut kinds = kinds.into_iter();
        let Some(first) = kinds.next() else {
            return self;
        };

        let kind_var = Variable::from_static(KIND_VARIABLE);
        let bound = self.select.atomic_clauses().into_iter().any(|atom| {
            atom.property.as_ref() == Some(&Identifier::rdf_type())
                && atom.argument_variable() == Some(&kind_var)
        });
        if !bound {
            self.push(AtomicClause::new(Identifier::rdf_type()).with_argument(kind_var).into());
        }

        self.push(kind_clause(first).into());

        let mut union = DisjunctiveClause::with_subject(self.subject.clone());
        for kind in kinds {
            union.add_atomic_clause(Identifier::rdf_type(), kind, Comparison::Exact, false, false);
        }
        if !union.clauses().is_empty() {
            self.push(union.into());
        }
        self
    }

    /// Fetches the property's value when present.
    pub fn add_fetch_clause(&mut self, predicate: Identifier) -> &mut Self {
        self.push(AtomicClause::new(predicate).with_optional(true).into());
        self
    }

    /// Constrains the property's value.
    pub fn add_match_clause(
        &mut self,
        predicate: Identifier,
        argument: impl Into<Term>,
        method: Comparison,
        project: bool,
        optional: bool,
    ) -> &mut Self {
        let clause = AtomicClause::new(predicate)
            .with_argument(argument)
            .with_method(method)
            .with_project(project)
            .with_optional(optional);
        self.push(clause.into());
        self
    }

    /// Every kind the subject is constrained to, union members included.
    pub fn kinds(&self) -> Vec<&Identifier> {
        let mut kinds = Vec::new();
        for clause in self.select.clauses() {
            let atoms = match clause {
                Clause::Atomic(atom) => vec![atom],
                Clause::Union(_) => clause.atomics(),
                Clause::Conjunction(_) => continue,
            };
            kinds.extend(atoms.into_iter().filter_map(kind_of));
        }
        kinds
    }

    /// Top level clauses other than kind constraints.
    pub fn property_clauses(&self) -> Vec<&Clause> {
        self.select
            .clauses()
            .iter()
            .filter(|clause| match clause {
                Clause::Atomic(atom) => !is_type_clause(atom),
                Clause::Union(_) => !clause.atomics().into_iter().all(is_type_clause),
                Clause::Conjunction(_) => true,
            })
            .collect()
    }

    pub fn to_dict(&self, version: ApiVersion) -> Result<Json> {
        let mut out = Map::new();
        out.insert("subject".into(), json!(self.subject.to_string()));
        self.select
            .encode_into(&mut out, &DictScope::for_query(version, &self.subject))?;
        Ok(Json::Object(out))
    }

    /// Rebuilds a query from its dict form.
    ///
    /// `subject` is read first, then `kinds`, then `clauses`, whatever the map
    /// order. Any failure is reported as a malformed query.
    pub fn from_dict(data: &Json, version: ApiVersion) -> Result<Self> {
        Self::decode(data, version).map_err(QueryError::into_malformed)
    }

    fn decode(data: &Json, version: ApiVersion) -> Result<Self> {
        let fields = wire::as_object(data, "query")?;
        if let Some(key) = fields.keys().find(|key| !QUERY_KEYS.contains(&key.as_str())) {
            return Err(QueryError::InvalidQueryKey(key.clone()));
        }

        let mut query = match fields.get("subject") {
            Some(raw) => Self::for_subject(Subject::parse(wire::as_str(raw, "subject")?)?),
            None => Self::default(),
        };

        if let Some(kinds) = fields.get("kinds") {
            let kinds = wire::as_array(kinds, "kinds")?
                .iter()
                .map(|kind| Identifier::new(wire::as_str(kind, "kinds")?))
                .collect::<Result<Vec<_>>>()?;
            query.add_kinds(kinds);
        }

        if let Some(clauses) = fields.get("clauses") {
            for data in wire::as_array(clauses, "clauses")? {
                let mut clause = Clause::decode(data, &DictScope::for_query(version, &query.subject))?;
                clause.inherit_subject(&query.subject);
                query.select.restore(clause);
            }
        }

        for (key, val) in fields {
            query.select.decode_option(key, val)?;
        }
        Ok(query)
    }
}

impl AsRef<SelectQuery> for UnarySelectQuery {
    fn as_ref(&self) -> &SelectQuery {
        &self.select
    }
}

fn is_keyword(clause: &Clause) -> bool {
    clause
        .as_atomic()
        .map_or(false, |atom| atom.method == Comparison::Keyword)
}

fn kind_clause(kind: Identifier) -> AtomicClause {
    AtomicClause::new(Identifier::rdf_type())
        .with_argument(kind)
        .with_method(Comparison::Exact)
        .with_project(false)
}

fn is_type_clause(atom: &AtomicClause) -> bool {
    atom.property.as_ref() == Some(&Identifier::rdf_type())
}

fn kind_of(atom: &AtomicClause) -> Option<&Identifier> {
    if is_type_clause(atom) && atom.method == Comparison::Exact {
        atom.argument.as_ref().and_then(Term::as_identifier)
    } else {
        None
    }
}
