//! Template-facing views of the site.
//!
//! Templates never see [`Site`] or [`Node`] directly. They get these
//! read-only `minijinja` objects, which share the built site through an
//! `Arc` and resolve attributes on demand.
//!
//! [`QueryView`] is the one stateful object: `with_tag`, `sorted_by_title`
//! and `sorted_by_tag` add to its plan in place and return the same object,
//! so a chain like `site.select().with_tag("post").sorted_by_title().pages()`
//! accumulates exactly as the Rust [`Query`](crate::query::Query) does.

use minijinja::value::{Enumerator, Object, Value, from_args};
use minijinja::{Error, ErrorKind, State};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::node::{Node, NodeId, NodeKind};
use crate::query::Plan;
use crate::site::Site;

fn none() -> Value {
    Value::from(())
}

fn node_list(site: &Arc<Site>, ids: &[NodeId]) -> Value {
    ids.iter()
        .map(|&id| NodeView::value(site.clone(), id))
        .collect::<Vec<_>>()
        .into()
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

/// The `site` binding.
#[derive(Debug)]
pub struct SiteView {
    site: Arc<Site>,
}

impl SiteView {
    pub fn value(site: Arc<Site>) -> Value {
        Value::from_object(SiteView { site })
    }
}

impl Object for SiteView {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let site = &self.site;
        let value = match key.as_str()? {
            "data" => Value::from_serialize(site.data()),
            "documents" => node_list(site, site.ids_of(NodeKind::Document)),
            "indices" => node_list(site, site.ids_of(NodeKind::Index)),
            "resources" => node_list(site, site.ids_of(NodeKind::Resource)),
            "static" => node_list(site, site.ids_of(NodeKind::Static)),
            "internal" => node_list(site, site.ids_of(NodeKind::Internal)),
            "urls" => site.urls().map(|u| Value::from(u.as_str())).collect::<Vec<_>>().into(),
            _ => return None,
        };
        Some(value)
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&[
            "data",
            "documents",
            "indices",
            "resources",
            "static",
            "internal",
            "urls",
        ])
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "select" => {
                from_args::<()>(args)?;
                let ids = self.site.ids().collect();
                Ok(QueryView::value(self.site.clone(), ids))
            }
            _ => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!("site has no method named {method}"),
            )),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        Self: Sized + 'static,
    {
        write!(f, "<site: {} nodes>", self.site.len())
    }
}

/// The `node` binding, and every node reached from it.
#[derive(Debug)]
pub struct NodeView {
    site: Arc<Site>,
    id: NodeId,
}

impl NodeView {
    pub fn value(site: Arc<Site>, id: NodeId) -> Value {
        Value::from_object(NodeView { site, id })
    }

    fn node(&self) -> &Node {
        &self.site[self.id]
    }
}

impl Object for NodeView {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let node = self.node();
        let value = match key.as_str()? {
            "kind" => Value::from(node.kind().name()),
            "url" => Value::from(node.path().as_str()),
            "source" => node
                .source()
                .map(|s| Value::from(s.display().to_string()))
                .unwrap_or_else(none),
            "meta" => Value::from_serialize(&node.metadata),
            "content" => node.content().map(Value::from).unwrap_or_else(none),
            "parent" => node
                .parent()
                .map(|p| NodeView::value(self.site.clone(), p))
                .unwrap_or_else(none),
            "children" => node_list(&self.site, node.children()),
            _ => return None,
        };
        Some(value)
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["kind", "url", "source", "meta", "content", "parent", "children"])
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "select_children" => {
                from_args::<()>(args)?;
                let ids = self.node().children().to_vec();
                Ok(QueryView::value(self.site.clone(), ids))
            }
            _ => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!("node has no method named {method}"),
            )),
        }
    }

    // Parent and children links form cycles; print the url only.
    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        Self: Sized + 'static,
    {
        f.write_str(self.node().path().as_str())
    }
}

/// A query built from a template.
#[derive(Debug)]
pub struct QueryView {
    site: Arc<Site>,
    nodes: Vec<NodeId>,
    plan: Mutex<Plan>,
}

impl QueryView {
    pub fn value(site: Arc<Site>, nodes: Vec<NodeId>) -> Value {
        Value::from_object(QueryView {
            site,
            nodes,
            plan: Mutex::new(Plan::default()),
        })
    }

    fn update(self: &Arc<Self>, change: impl FnOnce(&mut Plan)) -> Value {
        let mut plan = self.plan.lock().unwrap_or_else(PoisonError::into_inner);
        change(&mut *plan);
        drop(plan);
        Value::from_dyn_object(self.clone())
    }

    fn evaluate(&self) -> Result<Vec<&Node>, Error> {
        let plan = self.plan.lock().unwrap_or_else(PoisonError::into_inner);
        plan.evaluate(&self.site, &self.nodes)
            .map_err(|e| invalid(e.to_string()))
    }
}

impl Object for QueryView {
    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "with_tag" => {
                let (name, value): (String, Option<Value>) = from_args(args)?;
                let value = value
                    .map(|v| serde_yaml::to_value(&v))
                    .transpose()
                    .map_err(|e| invalid(format!("unsupported tag value: {e}")))?;
                Ok(self.update(|plan| plan.with_tag(name, value)))
            }
            "sorted_by_title" => {
                from_args::<()>(args)?;
                Ok(self.update(Plan::sort_by_title))
            }
            "sorted_by_tag" => {
                let (name,): (String,) = from_args(args)?;
                Ok(self.update(|plan| plan.sort_by_tag(name)))
            }
            "pages" => {
                from_args::<()>(args)?;
                let pages: Vec<_> = self.evaluate()?.into_iter().map(Node::page).collect();
                Ok(Value::from_serialize(&pages))
            }
            "nodes" => {
                from_args::<()>(args)?;
                let ids: Vec<NodeId> = self
                    .evaluate()?
                    .into_iter()
                    .filter_map(|n| self.site.id_of(n.path().as_str()))
                    .collect();
                Ok(node_list(&self.site, &ids))
            }
            _ => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!("query has no method named {method}"),
            )),
        }
    }
}
