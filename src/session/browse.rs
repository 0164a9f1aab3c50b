//! Browse runs
//!
//! One run: build every query variant, execute them concurrently, concatenate
//! rows in variant order, resolve joins with one lookup and optionally
//! aggregate. Any variant failure fails the run. Dropping the future of a
//! superseded run cancels it.

use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregation;
use crate::join::{resolve_joins, JoinReport};
use crate::observability::{log_event_with_fields, Event};
use crate::query::{build_queries, QuerySpec};
use crate::value::Entity;

use super::collaborators::{KeyLookup, ProjectContext, QueryRunner};
use super::errors::{SessionError, SessionResult};
use super::store::{DraftStore, QueryHistory};

/// Aggregate to compute over the final rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRequest {
    pub op: Aggregation,
    #[serde(default)]
    pub field: String,
}

/// Input of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseRequest {
    pub query: QuerySpec,
    /// Comma-separated join properties
    #[serde(default)]
    pub joins: String,
    #[serde(default)]
    pub aggregate: Option<AggregateRequest>,
}

impl BrowseRequest {
    pub fn new(query: QuerySpec) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn with_joins(mut self, joins: impl Into<String>) -> Self {
        self.joins = joins.into();
        self
    }

    pub fn with_aggregate(mut self, op: Aggregation, field: impl Into<String>) -> Self {
        self.aggregate = Some(AggregateRequest {
            op,
            field: field.into(),
        });
        self
    }
}

/// Result of one run
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseOutcome {
    /// Executed query variants, in execution order
    pub queries: Vec<String>,
    /// Rows after join resolution, with lookup counts
    pub join: JoinReport,
    /// `Some(None)` when an aggregate was requested but had no numeric input
    pub aggregate: Option<Option<f64>>,
}

impl BrowseOutcome {
    pub fn rows(&self) -> &[Entity] {
        &self.join.rows
    }
}

/// Runs browse requests against injected collaborators
pub struct QuerySession<R, L, P> {
    runner: R,
    lookup: L,
    project: P,
    namespace: Option<String>,
    history: Option<(Arc<dyn DraftStore>, QueryHistory)>,
}

impl<R, L, P> QuerySession<R, L, P>
where
    R: QueryRunner,
    L: KeyLookup,
    P: ProjectContext,
{
    pub fn new(runner: R, lookup: L, project: P) -> Self {
        Self {
            runner,
            lookup,
            project,
            namespace: None,
            history: None,
        }
    }

    /// Runs queries in `namespace`; empty means the default namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = if namespace.is_empty() {
            None
        } else {
            Some(namespace)
        };
        self
    }

    /// Records executed queries in `store`
    pub fn with_history(mut self, store: Arc<dyn DraftStore>, history: QueryHistory) -> Self {
        self.history = Some((store, history));
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub async fn browse(&self, request: &BrowseRequest) -> SessionResult<BrowseOutcome> {
        let queries = build_queries(&request.query)?;
        let namespace = self.namespace.as_deref();

        let results = try_join_all(queries.iter().map(|q| self.runner.run_query(q, namespace)))
            .await
            .map_err(|err| {
                log_event_with_fields(
                    Event::QueryFailed,
                    &[("kind", request.query.kind.as_str()), ("error", err.message())],
                );
                SessionError::Execution(err)
            })?;

        let rows: Vec<Entity> = results.into_iter().flatten().collect();
        let variants = queries.len().to_string();
        let row_count = rows.len().to_string();
        log_event_with_fields(
            Event::QueryExecuted,
            &[
                ("kind", request.query.kind.as_str()),
                ("rows", row_count.as_str()),
                ("variants", variants.as_str()),
            ],
        );

        let project = self.project.current_project();
        let join = resolve_joins(&self.lookup, rows, &request.joins, &project)
            .await
            .map_err(SessionError::Lookup)?;

        let aggregate = request
            .aggregate
            .as_ref()
            .map(|agg| agg.op.evaluate(&join.rows, &agg.field));

        if let Some((store, history)) = &self.history {
            for query in &queries {
                history.record(store.as_ref(), query)?;
            }
        }

        Ok(BrowseOutcome {
            queries,
            join,
            aggregate,
        })
    }
}
