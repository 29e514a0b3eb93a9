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

//! SPARQL rendering
//!
//! Atomic clauses render per comparison method:
//!
//! | method            | text                                                   |
//! |-------------------|--------------------------------------------------------|
//! | `exact_match`/`any` | `s <p> o`                                            |
//! | `regex`           | `s <p> ?v` then `FILTER regex(?v, "pattern", "i")`     |
//! | `keyword_search`  | `(s ?_score) text:query "terms"`                       |
//! | `greater_than`    | `s <p> ?v` then `FILTER (?v > arg)`                    |
//! | `lesser_than`     | `s <p> ?v` then `FILTER (?v < arg)`                    |
//! | `similarity`      | nothing                                                |
//!
//! Optional clauses are wrapped in `OPTIONAL { .. }`.

use super::Generator;
use crate::clause::{AtomicClause, Clause, ClauseVisitor, ConjunctiveClause, DisjunctiveClause};
use crate::comparison::Comparison;
use crate::error::{QueryError, Result};
use crate::query::{SelectQuery, SCORE_VARIABLE};
use crate::term::{quote, Subject, Term, Value, Variable, VariableSupply};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// SPARQL generator.
///
/// Fresh variables are named `?<prefix><n>`, counting from zero in every
/// rendered query, so output is deterministic.
#[derive(Debug, Clone)]
pub struct SparqlGenerator {
    variable_prefix: String,
}

impl Default for SparqlGenerator {
    fn default() -> Self {
        Self {
            variable_prefix: "_v".to_string(),
        }
    }
}

impl SparqlGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `prefix` for fresh variable names; it must be a valid variable name.
    pub fn with_variable_prefix(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        VariableSupply::new(prefix.as_str())?;
        Ok(Self {
            variable_prefix: prefix,
        })
    }

    /// Fresh names minted by the renderer avoid every name in `taken`.
    fn renderer(&self, taken: BTreeSet<Variable>) -> Result<Renderer> {
        Ok(Renderer {
            supply: VariableSupply::new(self.variable_prefix.as_str())?.reserve(taken),
            fetched: Vec::new(),
            subjects: Vec::new(),
        })
    }
}

impl Generator for SparqlGenerator {
    fn language(&self) -> &str {
        "SPARQL"
    }

    fn generate_query(&self, query: &SelectQuery) -> Result<String> {
        let mut renderer = self.renderer(query.variables())?;
        let body = renderer.body(query)?;
        let scored = query.is_scored();

        let mut out = String::new();
        for (name, namespace) in &query.prefixes {
            out.push_str(&format!("PREFIX {}: <{}>\n", name, namespace));
        }

        let mut projected = query.project_vars();
        projected.extend(renderer.fetched);
        out.push_str("SELECT DISTINCT");
        if projected.is_empty() && !scored {
            out.push_str(" *");
        }
        for var in &projected {
            out.push_str(&format!(" {}", var));
        }
        if scored {
            out.push_str(&format!(" ?{}", SCORE_VARIABLE));
        }
        out.push_str(" WHERE {\n");
        out.push_str(&body);
        if let Some(min_score) = query.min_score {
            out.push_str(&format!("\tFILTER (?{} >= {:?})\n", SCORE_VARIABLE, min_score));
        }
        out.push_str("}\n");

        if scored {
            out.push_str(&format!("ORDER BY DESC(?{})\n", SCORE_VARIABLE));
        }
        if query.limit > 0 {
            out.push_str(&format!("LIMIT {}\n", query.limit));
        }

        debug!(
            clauses = query.clauses().len(),
            fresh = renderer.supply.issued(),
            "rendered sparql query"
        );
        Ok(out)
    }

    fn generate_clause(&self, clause: &Clause) -> Result<String> {
        clause.accept(&mut self.renderer(clause.variables())?)
    }
}

/// One rendering session.
struct Renderer {
    supply: VariableSupply,
    /// Fresh variables bound by projecting fetch clauses
    fetched: Vec<Variable>,
    /// Subjects inherited from enclosing composites
    subjects: Vec<Subject>,
}

impl Renderer {
    fn body(&mut self, query: &SelectQuery) -> Result<String> {
        let mut out = String::new();
        if query.has_disjunctive_clauses() {
            // unions are evaluated after the rest of the pattern
            out.push_str("\t{\n");
            for clause in query.clauses().iter().filter(|c| !matches!(c, Clause::Union(_))) {
                out.push_str("\t\t");
                out.push_str(&clause.accept(self)?);
            }
            out.push_str("\t}\n");
            for union in query.clauses().iter().filter(|c| matches!(c, Clause::Union(_))) {
                out.push_str(&union.accept(self)?);
            }
        } else {
            for clause in query.clauses() {
                out.push_str("\t");
                out.push_str(&clause.accept(self)?);
            }
        }
        Ok(out)
    }

    fn nested(&mut self, subject: Option<&Subject>, clauses: &[Clause]) -> Result<Vec<String>> {
        let scoped = match subject {
            Some(subject) => {
                self.subjects.push(subject.clone());
                true
            }
            None => false,
        };
        let rendered = clauses
            .iter()
            .map(|clause| clause.accept(self))
            .collect::<Result<Vec<_>>>();
        if scoped {
            self.subjects.pop();
        }
        rendered
    }

    fn atomic_body(&mut self, clause: &AtomicClause, subject: &str, property: &str) -> Result<String> {
        let body = match clause.method {
            Comparison::Exact | Comparison::Any => {
                let object = match (&clause.argument, &clause.variable) {
                    (Some(argument), _) => argument.sparql(),
                    (None, Some(var)) => var.to_string(),
                    (None, None) => {
                        let var = self.supply.fresh();
                        if clause.project {
                            self.fetched.push(var.clone());
                        }
                        var.to_string()
                    }
                };
                format!("{} {} {}", subject, property, object)
            }
            Comparison::Regex => {
                let pattern = literal(required_argument(clause)?);
                let var = self.bound_variable(clause);
                format!(
                    "{} {} {} .\n\t\tFILTER regex({}, {}, \"i\")",
                    subject, property, var, var, pattern
                )
            }
            Comparison::Keyword => {
                let terms = literal(required_argument(clause)?);
                format!("({} ?{}) text:query {}", subject, SCORE_VARIABLE, terms)
            }
            Comparison::Greater | Comparison::Lesser => {
                let bound = required_argument(clause)?.sparql();
                let op = if clause.method == Comparison::Greater { ">" } else { "<" };
                let var = self.bound_variable(clause);
                format!(
                    "{} {} {} .\n\t\tFILTER ({} {} {})",
                    subject, property, var, var, op, bound
                )
            }
            Comparison::Similarity => {
                warn!(
                    property,
                    "similarity comparison has no SPARQL rendering, clause skipped"
                );
                String::new()
            }
        };
        Ok(body)
    }

    // explicit variable when it is not the argument itself, else a fresh one
    fn bound_variable(&self, clause: &AtomicClause) -> Variable {
        clause
            .distinct_variable()
            .cloned()
            .unwrap_or_else(|| self.supply.fresh())
    }
}

impl ClauseVisitor for Renderer {
    type Output = Result<String>;

    fn visit_atomic(&mut self, clause: &AtomicClause) -> Result<String> {
        let inherited = self.subjects.last().cloned();
        clause.ensure_defined(inherited.as_ref())?;
        let subject = clause
            .subject
            .as_ref()
            .or(inherited.as_ref())
            .map(Subject::sparql)
            .ok_or_else(|| undefined("subject"))?;
        let property = clause
            .property
            .as_ref()
            .map(|p| p.n3())
            .ok_or_else(|| undefined("property"))?;

        let body = self.atomic_body(clause, &subject, &property)?;
        if body.is_empty() {
            return Ok(body);
        }
        if clause.optional {
            Ok(format!("OPTIONAL {{ {} }} .\n", body))
        } else {
            Ok(format!("{} .\n", body))
        }
    }

    fn visit_conjunction(&mut self, clause: &ConjunctiveClause) -> Result<String> {
        let mut children = self.nested(clause.subject.as_ref(), &clause.clauses)?;
        if children.len() == 1 {
            return Ok(children.remove(0));
        }

        let mut out = String::new();
        if clause.optional {
            out.push_str("OPTIONAL ");
        }
        out.push_str("{\n");
        for child in children {
            out.push_str("\t\t\t");
            out.push_str(&child);
        }
        out.push_str("\t\t}\n");
        Ok(out)
    }

    fn visit_disjunction(&mut self, clause: &DisjunctiveClause) -> Result<String> {
        let children = self.nested(clause.subject(), clause.clauses())?;
        let mut out = String::new();
        match children.split_first() {
            None => {}
            Some((only, [])) => {
                out.push_str("\tUNION {\n\t\t\t");
                out.push_str(only);
                out.push_str("\t}\n");
            }
            Some((first, rest)) => {
                out.push_str("\t{\n\t\t{\n\t\t\t");
                out.push_str(first);
                out.push_str("\t\t}\n");
                for child in rest {
                    out.push_str("\tUNION {\n\t\t\t");
                    out.push_str(child);
                    out.push_str("\t\t}\n");
                }
                out.push_str("\t}\n");
            }
        }
        Ok(out)
    }
}

fn undefined(part: &'static str) -> QueryError {
    QueryError::UndefinedClause {
        missing: vec![part],
    }
}

fn required_argument(clause: &AtomicClause) -> Result<&Term> {
    clause.argument.as_ref().ok_or_else(|| undefined("argument"))
}

// pattern and search text are always string literals
fn literal(term: &Term) -> String {
    match term {
        Term::Value(Value::Text(text)) => quote(text),
        other => quote(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::UnarySelectQuery;
    use crate::term::Identifier;

    fn id(raw: &str) -> Identifier {
        Identifier::new(raw).unwrap()
    }

    fn alice() -> Subject {
        Subject::Identifier(id("http://ex.org/alice"))
    }

    #[test]
    fn test_fetch_clause_query() {
        let mut query = UnarySelectQuery::for_subject(alice());
        query.add_fetch_clause(id("http://ex.org/age"));

        let text = query.generate(&SparqlGenerator::new()).unwrap();
        assert!(text.starts_with("PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>\n"));
        assert!(text.contains("SELECT DISTINCT ?_v0 WHERE {\n"));
        assert!(text.contains("\tOPTIONAL { <http://ex.org/alice> <http://ex.org/age> ?_v0 } .\n"));
        assert!(!text.contains("ORDER BY"));
        assert!(!text.contains("LIMIT"));
    }

    #[test]
    fn test_greater_mints_one_variable() {
        let clause = AtomicClause::new(id("http://ex.org/age"))
            .with_subject(alice())
            .with_argument(Value::from(30))
            .with_method(Comparison::Greater);

        let text = SparqlGenerator::new()
            .generate_clause(&clause.into())
            .unwrap();
        assert_eq!(
            text,
            "<http://ex.org/alice> <http://ex.org/age> ?_v0 .\n\t\tFILTER (?_v0 > 30) .\n"
        );
    }

    #[test]
    fn test_greater_reuses_explicit_variable() {
        let clause = AtomicClause::new(id("http://ex.org/age"))
            .with_subject(alice())
            .with_argument(Value::from(30))
            .with_variable(Variable::new("age").unwrap())
            .with_method(Comparison::Lesser);

        let text = SparqlGenerator::new()
            .generate_clause(&clause.into())
            .unwrap();
        assert!(text.contains("<http://ex.org/age> ?age ."));
        assert!(text.contains("FILTER (?age < 30)"));
        assert!(!text.contains("?_v"));
    }

    #[test]
    fn test_regex_and_keyword() {
        let regex = AtomicClause::new(id("http://ex.org/name"))
            .with_subject(alice())
            .with_argument(Value::text("ali\"ce").unwrap())
            .with_method(Comparison::Regex)
            .with_optional(true);
        let text = SparqlGenerator::new().generate_clause(&regex.into()).unwrap();
        assert_eq!(
            text,
            "OPTIONAL { <http://ex.org/alice> <http://ex.org/name> ?_v0 .\n\t\tFILTER regex(?_v0, \"ali\\\"ce\", \"i\") } .\n"
        );

        let keyword = AtomicClause::new(id("http://ex.org/abstract"))
            .with_subject(Variable::new("s").unwrap())
            .with_argument(Value::text("graph databases").unwrap())
            .with_method(Comparison::Keyword);
        let text = SparqlGenerator::new().generate_clause(&keyword.into()).unwrap();
        assert_eq!(text, "(?s ?_score) text:query \"graph databases\" .\n");
    }

    #[test]
    fn test_similarity_renders_nothing() {
        let clause = AtomicClause::new(id("http://ex.org/abstract"))
            .with_subject(alice())
            .with_argument(Value::text("x").unwrap())
            .with_method(Comparison::Similarity);
        let text = SparqlGenerator::new().generate_clause(&clause.into()).unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_undefined_clause_fails() {
        let clause = AtomicClause::new(id("http://ex.org/age"));
        let err = SparqlGenerator::new().generate_clause(&clause.into()).unwrap_err();
        assert!(matches!(err, QueryError::UndefinedClause { .. }));
    }

    #[test]
    fn test_conjunction_renders_every_child() {
        let mut conj = ConjunctiveClause::new(Vec::new(), true).with_subject(alice());
        conj.add_atomic_clause(id("http://ex.org/p"), id("http://ex.org/x"), Comparison::Exact, false, false)
            .add_atomic_clause(id("http://ex.org/q"), id("http://ex.org/y"), Comparison::Exact, false, false);

        let text = SparqlGenerator::new().generate_clause(&conj.into()).unwrap();
        assert!(text.starts_with("OPTIONAL {\n"));
        assert!(text.contains("<http://ex.org/p> <http://ex.org/x> .\n"));
        assert!(text.contains("<http://ex.org/q> <http://ex.org/y> .\n"));
    }

    #[test]
    fn test_single_child_conjunction_renders_child() {
        let mut conj = ConjunctiveClause::new(Vec::new(), false).with_subject(alice());
        conj.add_atomic_clause(id("http://ex.org/p"), id("http://ex.org/x"), Comparison::Exact, false, false);

        let text = SparqlGenerator::new().generate_clause(&conj.into()).unwrap();
        assert_eq!(text, "<http://ex.org/alice> <http://ex.org/p> <http://ex.org/x> .\n");
    }

    #[test]
    fn test_single_child_union_layout() {
        let mut query = UnarySelectQuery::new();
        query.add_kinds(vec![id("http://ex.org/A"), id("http://ex.org/B")]);

        let rdf_type = Identifier::rdf_type().n3();
        let expected = format!(
            "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>\n\
             PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n\
             PREFIX text: <http://jena.apache.org/text#>\n\
             SELECT DISTINCT ?_kind ?_subj WHERE {{\n\
             \t{{\n\
             \t\t?_subj {t} ?_kind .\n\
             \t\t?_subj {t} <http://ex.org/A> .\n\
             \t}}\n\
             \tUNION {{\n\
             \t\t\t?_subj {t} <http://ex.org/B> .\n\
             \t}}\n\
             }}\n",
            t = rdf_type
        );
        assert_eq!(query.generate(&SparqlGenerator::new()).unwrap(), expected);
    }

    #[test]
    fn test_fresh_variables_avoid_query_variables() {
        let mut query = UnarySelectQuery::for_subject(alice());
        query.add_match_clause(
            id("http://ex.org/knows"),
            Variable::new("_v0").unwrap(),
            Comparison::Any,
            true,
            false,
        );
        query.add_fetch_clause(id("http://ex.org/age"));

        let text = query.generate(&SparqlGenerator::new()).unwrap();
        assert!(text.contains("SELECT DISTINCT ?_v0 ?_v1 WHERE {\n"));
        assert!(text.contains("\t<http://ex.org/alice> <http://ex.org/knows> ?_v0 .\n"));
        assert!(text.contains("\tOPTIONAL { <http://ex.org/alice> <http://ex.org/age> ?_v1 } .\n"));
    }

    #[test]
    fn test_regex_variable_avoids_clause_variables() {
        let friend = Variable::new("_v0").unwrap();
        let mut conj = ConjunctiveClause::new(Vec::new(), false).with_subject(alice());
        conj.add_atomic_clause(id("http://ex.org/knows"), friend.clone(), Comparison::Any, false, false);
        conj.add_clause(
            AtomicClause::new(id("http://ex.org/name"))
                .with_subject(friend)
                .with_argument(Value::text("ada").unwrap())
                .with_method(Comparison::Regex),
        );

        let text = SparqlGenerator::new().generate_clause(&conj.into()).unwrap();
        assert!(text.contains("?_v0 <http://ex.org/name> ?_v1 .\n\t\tFILTER regex(?_v1, \"ada\", \"i\") .\n"));
    }

    #[test]
    fn test_scored_query_with_limit() {
        let mut query = UnarySelectQuery::new().with_limit(5).with_min_score(0.5);
        query.add_match_clause(
            id("http://ex.org/abstract"),
            Value::text("rust").unwrap(),
            Comparison::Keyword,
            false,
            false,
        );

        let text = query.generate(&SparqlGenerator::new()).unwrap();
        assert!(text.contains("SELECT DISTINCT ?_score WHERE {"));
        assert!(text.contains("\tFILTER (?_score >= 0.5)\n"));
        assert!(text.ends_with("}\nORDER BY DESC(?_score)\nLIMIT 5\n"));
    }

    #[test]
    fn test_nothing_projected_selects_all() {
        let mut query = UnarySelectQuery::for_subject(alice());
        query.add_match_clause(
            id("http://ex.org/knows"),
            id("http://ex.org/bob"),
            Comparison::Exact,
            false,
            false,
        );
        let text = query.generate(&SparqlGenerator::new()).unwrap();
        assert!(text.contains("SELECT DISTINCT * WHERE {"));
    }

    #[test]
    fn test_custom_variable_prefix() {
        assert!(SparqlGenerator::with_variable_prefix("bad prefix").is_err());

        let generator = SparqlGenerator::with_variable_prefix("tmp").unwrap();
        let mut query = UnarySelectQuery::for_subject(alice());
        query.add_fetch_clause(id("http://ex.org/age"));
        let text = query.generate(&generator).unwrap();
        assert!(text.contains("?tmp0"));
        assert_eq!(generator.language(), "SPARQL");
    }
}
