use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store rejected the statement itself; retrying will not help.
    #[error("query error: {0}")]
    Query(String),
}

impl StorageError {
    /// Connectivity failures may succeed on a later attempt; the caller decides.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Connection(_))
    }
}

/// How a query term is compared against a stored column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOp {
    Equals,
    /// SQL `LIKE`: `%` matches any run, `_` one character, `\` escapes.
    Like,
}

/// Subject side of a triple query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectFilter {
    Any,
    Exact(String),
}

/// Pattern query against the triple store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripleQuery {
    pub subject: SubjectFilter,
    pub predicate: String,
    pub object: String,
    pub subject_op: MatchOp,
    pub predicate_op: MatchOp,
    pub object_op: MatchOp,
}

impl TripleQuery {
    /// Exact predicate, `LIKE` on the object, exact or unrestricted subject.
    #[must_use]
    pub fn object_like(
        subject: SubjectFilter,
        predicate: impl Into<String>,
        object_pattern: impl Into<String>,
    ) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object: object_pattern.into(),
            subject_op: MatchOp::Equals,
            predicate_op: MatchOp::Equals,
            object_op: MatchOp::Like,
        }
    }

    /// Compiles the query's `LIKE` terms once for matching many triples.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Query` if a pattern cannot be compiled.
    pub fn matcher(&self) -> Result<TripleMatcher, StorageError> {
        let subject = match &self.subject {
            SubjectFilter::Any => None,
            SubjectFilter::Exact(wanted) => Some(TermMatcher::new(self.subject_op, wanted)?),
        };
        Ok(TripleMatcher {
            subject,
            predicate: TermMatcher::new(self.predicate_op, &self.predicate)?,
            object: TermMatcher::new(self.object_op, &self.object)?,
        })
    }
}

#[derive(Debug, Clone)]
enum TermMatcher {
    Equals(String),
    Like(Regex),
}

impl TermMatcher {
    fn new(op: MatchOp, pattern: &str) -> Result<Self, StorageError> {
        match op {
            MatchOp::Equals => Ok(Self::Equals(pattern.to_owned())),
            MatchOp::Like => like_regex(pattern)
                .map(Self::Like)
                .map_err(|e| StorageError::Query(e.to_string())),
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            Self::Equals(wanted) => wanted == text,
            Self::Like(re) => re.is_match(text),
        }
    }
}

/// A `TripleQuery` ready to test stored triples.
#[derive(Debug, Clone)]
pub struct TripleMatcher {
    subject: Option<TermMatcher>,
    predicate: TermMatcher,
    object: TermMatcher,
}

impl TripleMatcher {
    /// Whether a stored `(subject, predicate, object)` triple satisfies the query.
    #[must_use]
    pub fn matches(&self, subject: &str, predicate: &str, object: &str) -> bool {
        self.subject.as_ref().is_none_or(|m| m.matches(subject))
            && self.predicate.matches(predicate)
            && self.object.matches(object)
    }
}

/// One query hit: the subject (`resource`) and the stored object (`value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub resource: String,
    pub value: String,
}

/// Append-and-query key/pattern store holding progress triples.
///
/// Results come back in insertion order.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Run a pattern query.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is unreachable.
    async fn query(&self, query: &TripleQuery) -> Result<Vec<Triple>, StorageError>;

    /// Append a triple. No uniqueness is enforced here.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is unreachable.
    async fn insert(&self, subject: &str, predicate: &str, value: &str)
    -> Result<(), StorageError>;
}

/// Escapes `LIKE` metacharacters so `literal` only matches itself.
#[must_use]
pub fn escape_like(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Translates a case-sensitive `LIKE` pattern (`\` as escape) into an
/// anchored regex: `%` is any run, `_` any single character.
///
/// # Errors
///
/// Returns `regex::Error` if the translated pattern exceeds regex limits.
pub fn like_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push_str("(?s)^");
    let mut buf = [0_u8; 4];
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            // a trailing backslash stands for itself
            '\\' => {
                let literal = chars.next().unwrap_or('\\');
                re.push_str(&regex::escape(literal.encode_utf8(&mut buf)));
            }
            other => re.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    re.push('$');
    Regex::new(&re)
}

#[derive(Debug, Clone)]
struct StoredTriple {
    subject: String,
    predicate: String,
    object: String,
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryProgressStore {
    triples: Arc<Mutex<Vec<StoredTriple>>>,
}

impl InMemoryProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored triples, whatever their predicate.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        let guard = self
            .triples
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn query(&self, query: &TripleQuery) -> Result<Vec<Triple>, StorageError> {
        let matcher = query.matcher()?;
        let guard = self
            .triples
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|t| matcher.matches(&t.subject, &t.predicate, &t.object))
            .map(|t| Triple {
                resource: t.subject.clone(),
                value: t.object.clone(),
            })
            .collect())
    }

    async fn insert(
        &self,
        subject: &str,
        predicate: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .triples
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(StoredTriple {
            subject: subject.to_owned(),
            predicate: predicate.to_owned(),
            object: value.to_owned(),
        });
        Ok(())
    }
}

/// Bundles the progress store behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            progress: Arc::new(InMemoryProgressStore::new()),
        }
    }
}
