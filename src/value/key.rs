//! Entity keys
//!
//! A key is a project id, an optional namespace and a non-empty ancestor path.
//! Keys have three textual forms:
//!
//! - the key literal `KEY(Kind, 123, Child, 'name')` used in query text and edit strings
//! - the canonical string used to match join references to fetched rows
//! - the URL token used for navigation links (see `wire`)

use std::fmt;

use super::errors::{ValueError, ValueResult};
use super::scan::{quote_name, single_quote, Scanner};

/// Identifier of one path segment: numeric id or string name, never both
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyId {
    Id(i64),
    Name(String),
}

impl From<i64> for KeyId {
    fn from(id: i64) -> Self {
        KeyId::Id(id)
    }
}

impl From<&str> for KeyId {
    fn from(name: &str) -> Self {
        KeyId::Name(name.to_string())
    }
}

impl From<String> for KeyId {
    fn from(name: String) -> Self {
        KeyId::Name(name)
    }
}

/// One `{kind, id-or-name}` segment of a key path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathElement {
    pub kind: String,
    pub id: KeyId,
}

impl PathElement {
    pub fn new(kind: impl Into<String>, id: impl Into<KeyId>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Structured reference to one entity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    project_id: String,
    namespace: Option<String>,
    path: Vec<PathElement>,
}

impl Key {
    /// Create a key, rejecting an empty path
    ///
    /// An empty namespace is the default namespace and is stored as `None`.
    pub fn new(
        project_id: impl Into<String>,
        namespace: Option<String>,
        path: Vec<PathElement>,
    ) -> ValueResult<Self> {
        if path.is_empty() {
            return Err(ValueError::validation("key path must not be empty"));
        }
        Ok(Self {
            project_id: project_id.into(),
            namespace: normalize_namespace(namespace),
            path,
        })
    }

    /// Create a single-segment key in the default namespace
    pub fn root(project_id: impl Into<String>, kind: impl Into<String>, id: impl Into<KeyId>) -> Self {
        Self {
            project_id: project_id.into(),
            namespace: None,
            path: vec![PathElement::new(kind, id)],
        }
    }

    /// Returns a copy of this key with one more path segment
    pub fn child(&self, kind: impl Into<String>, id: impl Into<KeyId>) -> Self {
        let mut key = self.clone();
        key.path.push(PathElement::new(kind, id));
        key
    }

    /// Returns a copy of this key in the given namespace
    pub fn in_namespace(&self, namespace: impl Into<String>) -> Self {
        let mut key = self.clone();
        key.namespace = normalize_namespace(Some(namespace.into()));
        key
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn path(&self) -> &[PathElement] {
        &self.path
    }

    /// Kind of the last path segment
    pub fn kind(&self) -> &str {
        self.path.last().map(|el| el.kind.as_str()).unwrap_or_default()
    }

    /// Deterministic, collision-free string used to match join references
    ///
    /// An empty project id resolves to `current_project`. Every free-form part
    /// is written as a JSON string literal, and segments tag ids and names apart.
    pub fn canonical_string(&self, current_project: &str) -> String {
        let project = if self.project_id.is_empty() {
            current_project
        } else {
            &self.project_id
        };

        let mut out = json_string(project);
        if let Some(ns) = &self.namespace {
            out.push_str("|ns=");
            out.push_str(&json_string(ns));
        }
        for el in &self.path {
            out.push('/');
            out.push_str(&json_string(&el.kind));
            match &el.id {
                KeyId::Id(id) => {
                    out.push_str(":id=");
                    out.push_str(&id.to_string());
                }
                KeyId::Name(name) => {
                    out.push_str(":name=");
                    out.push_str(&json_string(name));
                }
            }
        }
        out
    }

    /// Renders the key literal relative to a project/namespace context
    ///
    /// `PROJECT(...)` and `NAMESPACE(...)` are written only when they differ
    /// from the context, so that parsing with the same context restores the key.
    pub fn to_literal(&self, project: &str, namespace: Option<&str>) -> String {
        let mut parts = Vec::with_capacity(self.path.len() * 2 + 2);
        if self.project_id != project {
            parts.push(format!("PROJECT({})", single_quote(&self.project_id)));
        }
        if self.namespace.as_deref() != normalize_namespace_ref(namespace) {
            let ns = self.namespace.as_deref().unwrap_or_default();
            parts.push(format!("NAMESPACE({})", single_quote(ns)));
        }
        for el in &self.path {
            parts.push(quote_name(&el.kind));
            parts.push(match &el.id {
                KeyId::Id(id) => id.to_string(),
                KeyId::Name(name) => single_quote(name),
            });
        }
        format!("KEY({})", parts.join(", "))
    }

    /// Parses a complete key literal
    pub fn parse_literal(text: &str, project: &str, namespace: Option<&str>) -> ValueResult<Self> {
        let mut scanner = Scanner::new(text);
        let key = Self::parse_from(&mut scanner, project, namespace)?;
        if !scanner.is_at_end() {
            return Err(scanner.unexpected("end of key literal"));
        }
        Ok(key)
    }

    /// Parses a key literal at the scanner's position
    ///
    /// Grammar: `KEY( [PROJECT('p'),] [NAMESPACE('n'),] kind, id-or-name [, kind, id-or-name]* )`
    pub(crate) fn parse_from(
        scanner: &mut Scanner<'_>,
        project: &str,
        namespace: Option<&str>,
    ) -> ValueResult<Self> {
        if !scanner.eat_call("KEY") {
            return Err(scanner.unexpected("KEY("));
        }

        let mut project_id = project.to_string();
        if scanner.eat_call("PROJECT") {
            project_id = scanner.quoted('\'')?;
            scanner.expect(')')?;
            scanner.expect(',')?;
        }

        let mut ns = namespace.map(str::to_string);
        if scanner.eat_call("NAMESPACE") {
            ns = Some(scanner.quoted('\'')?);
            scanner.expect(')')?;
            scanner.expect(',')?;
        }

        let mut path = Vec::new();
        loop {
            let kind = parse_kind(scanner)?;
            scanner.expect(',')?;
            let id = parse_key_id(scanner)?;
            path.push(PathElement { kind, id });

            if scanner.eat(')') {
                break;
            }
            scanner.expect(',')?;
        }

        Key::new(project_id, ns, path)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_literal("", None))
    }
}

fn parse_kind(scanner: &mut Scanner<'_>) -> ValueResult<String> {
    match scanner.peek() {
        Some('`') => scanner.backticked(),
        Some('\'') => scanner.quoted('\''),
        Some('"') => scanner.quoted('"'),
        _ => scanner
            .identifier()
            .map(str::to_string)
            .ok_or_else(|| scanner.unexpected("kind name")),
    }
}

fn parse_key_id(scanner: &mut Scanner<'_>) -> ValueResult<KeyId> {
    match scanner.peek() {
        Some('\'') => Ok(KeyId::Name(scanner.quoted('\'')?)),
        Some('"') => Ok(KeyId::Name(scanner.quoted('"')?)),
        _ => {
            let token = scanner
                .number_token()
                .ok_or_else(|| scanner.unexpected("numeric id or quoted name"))?;
            token
                .parse::<i64>()
                .map(KeyId::Id)
                .map_err(|_| ValueError::validation(format!("'{}' is not a valid key id", token)))
        }
    }
}

fn normalize_namespace(namespace: Option<String>) -> Option<String> {
    namespace.filter(|ns| !ns.is_empty())
}

fn normalize_namespace_ref(namespace: Option<&str>) -> Option<&str> {
    namespace.filter(|ns| !ns.is_empty())
}

fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
