//! Operation model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Header carrying the bearer credential.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Query or mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

/// Whether a query may be answered from the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchPolicy {
    /// Serve a cached result when one exists, otherwise fetch and cache.
    CacheFirst,
    /// Always fetch, never read or write the cache.
    NetworkOnly,
}

/// One GraphQL request with its variables and headers.
///
/// Header names are stored lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Correlates log lines of one logical request, including its retry.
    pub id: Uuid,
    pub name: String,
    pub kind: OperationKind,
    pub document: String,
    pub variables: Map<String, Value>,
    pub headers: BTreeMap<String, String>,
    /// Set only on the re-attempt issued after a credential refresh.
    pub retry_marked: bool,
    pub fetch_policy: FetchPolicy,
}

impl Operation {
    fn new(
        kind: OperationKind,
        name: impl Into<String>,
        document: impl Into<String>,
        fetch_policy: FetchPolicy,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            document: document.into(),
            variables: Map::new(),
            headers: BTreeMap::new(),
            retry_marked: false,
            fetch_policy,
        }
    }

    /// A query, cache-first by default.
    pub fn query(name: impl Into<String>, document: impl Into<String>) -> Self {
        Self::new(OperationKind::Query, name, document, FetchPolicy::CacheFirst)
    }

    /// A mutation. Mutations are never cached.
    pub fn mutation(name: impl Into<String>, document: impl Into<String>) -> Self {
        Self::new(OperationKind::Mutation, name, document, FetchPolicy::NetworkOnly)
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables.extend(variables);
        self
    }

    pub fn with_fetch_policy(mut self, fetch_policy: FetchPolicy) -> Self {
        self.fetch_policy = fetch_policy;
        self
    }

    pub fn is_query(&self) -> bool {
        self.kind == OperationKind::Query
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(&name.to_ascii_lowercase())
    }

    /// Token from an `authorization: Bearer <token>` header.
    pub fn bearer_token(&self) -> Option<&str> {
        self.header(AUTHORIZATION_HEADER)?.strip_prefix("Bearer ")
    }

    /// Copy of this operation flagged as the post-refresh re-attempt.
    pub fn retry(&self) -> Self {
        Self {
            retry_marked: true,
            ..self.clone()
        }
    }

    /// Cache key: operation name plus variables in key order.
    pub fn cache_key(&self) -> String {
        // `serde_json::Map` keeps keys sorted while `preserve_order` is off.
        format!("{}:{}", self.name, Value::Object(self.variables.clone()))
    }
}
