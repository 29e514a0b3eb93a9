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

//! Dict wire format plumbing shared by clauses and queries

use crate::error::{QueryError, Result};
use crate::term::{Subject, Variable};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Sentinel standing for the enclosing query's subject in clause dicts.
pub const QUERY_SUBJECT: &str = "query.subject";

/// Name of the default query subject variable.
pub const SUBJECT_VARIABLE: &str = "_subj";

/// Version of the service dict format.
///
/// `v1.0.0` omits the `type` discriminator on atomic clauses; readers treat
/// an untyped clause as atomic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "latest")]
    Latest,
    #[serde(rename = "v1.0.0")]
    V1_0_0,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::Latest => "latest",
            ApiVersion::V1_0_0 => "v1.0.0",
        }
    }

    /// Whether atomic clause dicts carry the `type` discriminator
    pub fn tags_clauses(&self) -> bool {
        matches!(self, ApiVersion::Latest)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "latest" => Ok(ApiVersion::Latest),
            "v1.0.0" => Ok(ApiVersion::V1_0_0),
            other => Err(QueryError::UnknownVersion(other.to_string())),
        }
    }
}

/// Context a clause is encoded or decoded in: the format version, the subject
/// inherited from the enclosing container and the query's own subject.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DictScope<'a> {
    pub version: ApiVersion,
    pub subject: Option<&'a Subject>,
    pub query_subject: Option<&'a Subject>,
}

impl<'a> DictScope<'a> {
    pub fn new(version: ApiVersion) -> Self {
        Self {
            version,
            subject: None,
            query_subject: None,
        }
    }

    pub fn for_query(version: ApiVersion, subject: &'a Subject) -> Self {
        Self {
            version,
            subject: Some(subject),
            query_subject: Some(subject),
        }
    }

    pub fn with_subject(self, subject: Option<&'a Subject>) -> Self {
        Self { subject, ..self }
    }

    /// Resolves a subject string, honouring the query subject sentinel.
    ///
    /// Outside a query the sentinel stands for the default subject variable.
    pub fn resolve_subject(&self, raw: &str) -> Result<Subject> {
        if raw == QUERY_SUBJECT {
            return Ok(self.query_subject.cloned().unwrap_or_else(|| {
                Subject::Variable(Variable::from_static(SUBJECT_VARIABLE))
            }));
        }
        Subject::parse(raw)
    }

    /// The query subject as a variable, for the `variable` sentinel.
    pub fn query_subject_variable(&self) -> Result<Variable> {
        match self.resolve_subject(QUERY_SUBJECT)? {
            Subject::Variable(var) => Ok(var),
            Subject::Identifier(id) => Err(QueryError::invalid_field(
                "variable",
                format!("query subject {} is not a variable", id),
            )),
        }
    }
}

pub(crate) fn as_object<'v>(data: &'v Value, what: &str) -> Result<&'v Map<String, Value>> {
    data.as_object()
        .ok_or_else(|| QueryError::invalid_field(what, "expected an object"))
}

pub(crate) fn as_str<'v>(value: &'v Value, field: &str) -> Result<&'v str> {
    value
        .as_str()
        .ok_or_else(|| QueryError::invalid_field(field, format!("expected a string, found {}", value)))
}

pub(crate) fn as_bool(value: &Value, field: &str) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| QueryError::invalid_field(field, format!("expected a boolean, found {}", value)))
}

pub(crate) fn as_array<'v>(value: &'v Value, field: &str) -> Result<&'v Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| QueryError::invalid_field(field, format!("expected a list, found {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Identifier;

    #[test]
    fn test_version_parse() {
        assert_eq!("latest".parse::<ApiVersion>().unwrap(), ApiVersion::Latest);
        assert_eq!("v1.0.0".parse::<ApiVersion>().unwrap(), ApiVersion::V1_0_0);
        assert!("v0.9".parse::<ApiVersion>().is_err());
        assert!(ApiVersion::Latest.tags_clauses());
        assert!(!ApiVersion::V1_0_0.tags_clauses());
    }

    #[test]
    fn test_sentinel_resolves_to_query_subject() {
        let subject = Subject::Variable(Variable::new("_subj").unwrap());
        let scope = DictScope::for_query(ApiVersion::Latest, &subject);
        assert_eq!(scope.resolve_subject(QUERY_SUBJECT).unwrap(), subject);

        let detached = DictScope::new(ApiVersion::Latest);
        assert_eq!(
            detached.resolve_subject(QUERY_SUBJECT).unwrap().to_string(),
            "?_subj"
        );
        assert!(detached.resolve_subject("?other").is_ok());
    }

    #[test]
    fn test_identifier_subject_is_not_a_variable() {
        let subject = Subject::Identifier(Identifier::new("http://ex.org/alice").unwrap());
        let scope = DictScope::for_query(ApiVersion::Latest, &subject);
        assert!(scope.query_subject_variable().is_err());
    }
}
