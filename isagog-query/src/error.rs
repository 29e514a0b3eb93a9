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

//! Query errors

use thiserror::Error;

/// Errors raised while building, serializing or rendering queries.
///
/// Every variant except [`QueryError::MalformedQuery`] is a validation error
/// raised at the point of violation.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Bad variable name {0}")]
    InvalidVariable(String),

    #[error("Bad identifier {0}")]
    InvalidIdentifier(String),

    #[error("Bad value string {0}")]
    InvalidValue(String),

    #[error("Invalid subject {0}")]
    InvalidSubject(String),

    /// Rendering or serializing a clause that lacks required parts
    #[error("Clause not defined, missing {}", .missing.join(", "))]
    UndefinedClause { missing: Vec<&'static str> },

    #[error("Invalid union clauses: subject {found} differs from {expected}")]
    MismatchedSubjects { expected: String, found: String },

    #[error("Unknown comparison method {0}")]
    UnknownMethod(String),

    #[error("Unknown clause type {0}")]
    UnknownClauseType(String),

    #[error("Wrong clause type: expected {expected}, found {found}")]
    WrongClauseType {
        expected: &'static str,
        found: String,
    },

    #[error("Unknown list clause type {0}")]
    UnknownListType(&'static str),

    #[error("Invalid clause key {0}")]
    InvalidClauseKey(String),

    #[error("Illegal query key {0}")]
    InvalidQueryKey(String),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Unsupported api version {0}")]
    UnknownVersion(String),

    /// Wraps any failure raised while decoding a whole query dict
    #[error("Malformed query due to: {source}")]
    MalformedQuery {
        #[source]
        source: Box<QueryError>,
    },
}

impl QueryError {
    pub(crate) fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wraps `self` as the cause of a malformed query error.
    pub fn into_malformed(self) -> Self {
        match self {
            already @ QueryError::MalformedQuery { .. } => already,
            other => QueryError::MalformedQuery {
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_undefined_clause_names_missing_parts() {
        let err = QueryError::UndefinedClause {
            missing: vec!["subject", "argument"],
        };
        assert_eq!(err.to_string(), "Clause not defined, missing subject, argument");
    }

    #[test]
    fn test_malformed_query_keeps_cause() {
        let err = QueryError::InvalidClauseKey("colour".into()).into_malformed();
        assert!(err.to_string().contains("Invalid clause key colour"));
        let source = err.source().expect("cause is kept");
        assert_eq!(source.to_string(), "Invalid clause key colour");

        // wrapping twice does not nest
        let again = err.into_malformed();
        assert!(matches!(
            again,
            QueryError::MalformedQuery { ref source } if matches!(**source, QueryError::InvalidClauseKey(_))
        ));
    }
}
