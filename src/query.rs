//! Node selection: tag filters and sorters over a node collection.
//!
//! A query starts from a list of node ids ([`Site::select`] for the whole
//! site, [`Site::select_children`] for one node's children) and accumulates a
//! [`Plan`]. Nothing is evaluated until [`Query::pages`] is called:
//!
//! 1. Filters run in the order they were added; a node must pass all of them.
//! 2. Survivors are projected to [`Page`]s.
//! 3. If any sorter was added, pages are stably sorted by the tuple of their
//!    sort keys. Without sorters, discovery order is kept.
//!
//! ```rust,ignore
//! let posts = site.select().with_tag("draft", None).sorted_by_title().pages()?;
//! ```
//!
//! ## Sort key order
//!
//! Metadata values are heterogeneous, so keys are compared under one total
//! order: `null < bool < number < string < anything else`. Values of the same
//! class compare naturally; sequences and mappings compare by their YAML text.

use serde_yaml::Value;
use std::cmp::Ordering;
use thiserror::Error;

use crate::node::{Node, NodeId, Page};
use crate::site::Site;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("{url} has no `{key}` to sort by")]
    MissingSortKey { key: String, url: String },
}

/// Keep nodes whose metadata has `name` (and, if given, equals `value`).
#[derive(Debug, Clone, PartialEq)]
pub struct TagFilter {
    pub name: String,
    pub value: Option<Value>,
}

impl TagFilter {
    pub fn matches(&self, node: &Node) -> bool {
        match (node.meta(&self.name), &self.value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(stored), Some(wanted)) => stored == wanted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sorter {
    Title,
    Tag(String),
}

impl Sorter {
    pub fn key(&self) -> &str {
        match self {
            Sorter::Title => "title",
            Sorter::Tag(name) => name,
        }
    }
}

/// Accumulated filters and sorters of a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub filters: Vec<TagFilter>,
    pub sorters: Vec<Sorter>,
}

impl Plan {
    pub fn with_tag(&mut self, name: impl Into<String>, value: Option<Value>) {
        self.filters.push(TagFilter {
            name: name.into(),
            value,
        });
    }

    pub fn sort_by_title(&mut self) {
        self.sorters.push(Sorter::Title);
    }

    pub fn sort_by_tag(&mut self, name: impl Into<String>) {
        self.sorters.push(Sorter::Tag(name.into()));
    }

    /// Run the plan over `ids`, returning matching nodes in result order.
    pub fn evaluate<'s>(&self, site: &'s Site, ids: &[NodeId]) -> Result<Vec<&'s Node>, QueryError> {
        let survivors: Vec<&Node> = ids
            .iter()
            .filter_map(|&id| site.get(id))
            .filter(|node| self.filters.iter().all(|f| f.matches(node)))
            .collect();

        if self.sorters.is_empty() {
            return Ok(survivors);
        }

        let mut keyed = survivors
            .into_iter()
            .map(|node| Ok((self.sort_keys(node.page())?, node)))
            .collect::<Result<Vec<_>, QueryError>>()?;
        // sort_by is stable: equal keys keep discovery order.
        keyed.sort_by(|(a, _), (b, _)| compare_key_tuples(a, b));
        Ok(keyed.into_iter().map(|(_, node)| node).collect())
    }

    fn sort_keys(&self, page: Page<'_>) -> Result<Vec<SortKey>, QueryError> {
        self.sorters
            .iter()
            .map(|sorter| {
                page.meta()
                    .get(sorter.key())
                    .map(SortKey::from_value)
                    .ok_or_else(|| QueryError::MissingSortKey {
                        key: sorter.key().to_string(),
                        url: page.url().to_string(),
                    })
            })
            .collect()
    }
}

/// A metadata value reduced to something totally ordered.
#[derive(Debug, Clone)]
enum SortKey {
    Null,
    Bool(bool),
    /// Integers keep full precision; `i128` covers both `i64` and `u64`.
    Integer(i128),
    Float(f64),
    Text(String),
    Other(String),
}

impl SortKey {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => SortKey::Null,
            Value::Bool(b) => SortKey::Bool(*b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => SortKey::Integer(i128::from(i)),
                (None, Some(u)) => SortKey::Integer(i128::from(u)),
                (None, None) => SortKey::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => SortKey::Text(s.clone()),
            other => SortKey::Other(serde_yaml::to_string(other).unwrap_or_default()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Null => 0,
            SortKey::Bool(_) => 1,
            SortKey::Integer(_) | SortKey::Float(_) => 2,
            SortKey::Text(_) => 3,
            SortKey::Other(_) => 4,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            (SortKey::Integer(a), SortKey::Integer(b)) => a.cmp(b),
            (SortKey::Float(a), SortKey::Float(b)) => a.total_cmp(b),
            (SortKey::Integer(a), SortKey::Float(b)) => (*a as f64).total_cmp(b),
            (SortKey::Float(a), SortKey::Integer(b)) => a.total_cmp(&(*b as f64)),
            (SortKey::Text(a), SortKey::Text(b)) | (SortKey::Other(a), SortKey::Other(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn compare_key_tuples(a: &[SortKey], b: &[SortKey]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.compare(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// A lazily evaluated selection over part of a [`Site`].
#[derive(Debug, Clone)]
pub struct Query<'s> {
    site: &'s Site,
    nodes: Vec<NodeId>,
    plan: Plan,
}

impl<'s> Query<'s> {
    pub(crate) fn new(site: &'s Site, nodes: Vec<NodeId>) -> Self {
        Self {
            site,
            nodes,
            plan: Plan::default(),
        }
    }

    pub fn with_tag(&mut self, name: &str, value: Option<Value>) -> &mut Self {
        self.plan.with_tag(name, value);
        self
    }

    pub fn sorted_by_title(&mut self) -> &mut Self {
        self.plan.sort_by_title();
        self
    }

    pub fn sorted_by_tag(&mut self, name: &str) -> &mut Self {
        self.plan.sort_by_tag(name);
        self
    }

    #[cfg(test)]
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Matching nodes in result order.
    pub fn nodes(&self) -> Result<Vec<&'s Node>, QueryError> {
        self.plan.evaluate(self.site, &self.nodes)
    }

    /// Matching nodes as pages, in result order.
    pub fn pages(&self) -> Result<Vec<Page<'s>>, QueryError> {
        Ok(self.nodes()?.into_iter().map(Node::page).collect())
    }
}
