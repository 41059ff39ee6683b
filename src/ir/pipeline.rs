use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use petgraph::Graph;
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::config::{PassConfig, AST_NORMALIZE, CANONICAL_CHECK};
use crate::error::NormalizeError;

use super::ast::Ast;
use super::transforms::ast_normalize::AstNormalize;
use super::transforms::canonical_check::CanonicalCheck;

/// A rewriting pass over the whole tree.
pub trait Pass: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, ast: &mut Ast);
}

/// A read-only pass that accumulates state about the tree it is shown.
pub trait Observer {
    fn observe(&mut self, ast: &Ast);
}

/// Either a rewrite or an observation.
pub enum TransformKind {
    /// Mutates the tree in place.
    Rewrite(Arc<dyn Pass>),
    /// Reads the tree; the mutex gives the observer somewhere to keep results.
    Observe(Arc<Mutex<dyn Observer + Send>>),
}

impl Clone for TransformKind {
    fn clone(&self) -> Self {
        match self {
            TransformKind::Rewrite(pass) => TransformKind::Rewrite(Arc::clone(pass)),
            TransformKind::Observe(observer) => TransformKind::Observe(Arc::clone(observer)),
        }
    }
}

/// A single step of the pipeline together with the ids it must run after.
#[derive(Clone)]
pub struct Transform {
    pub id: String,
    pub dependencies: Vec<String>,
    pub kind: TransformKind,
}

impl Transform {
    pub fn rewrite(id: impl Into<String>, pass: Arc<dyn Pass>) -> Self {
        Transform { id: id.into(), dependencies: Vec::new(), kind: TransformKind::Rewrite(pass) }
    }

    pub fn observe(id: impl Into<String>, observer: Arc<Mutex<dyn Observer + Send>>) -> Self {
        Transform { id: id.into(), dependencies: Vec::new(), kind: TransformKind::Observe(observer) }
    }

    pub fn after(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }
}

/// Transforms organized in a dependency graph and executed in topological
/// order, so that every transform runs after its prerequisites.
#[derive(Default)]
pub struct Pipeline {
    graph: Graph<Transform, ()>,
    node_indices: HashMap<String, NodeIndex>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline { graph: Graph::new(), node_indices: HashMap::new() }
    }

    /// Builds the standard pipeline: `ast-normalize`, then `canonical-check`
    /// reporting into `check`. Passes disabled in `config` are left out.
    pub fn from_config(config: &PassConfig, check: Arc<Mutex<CanonicalCheck>>) -> Result<Self, NormalizeError> {
        let mut pipeline = Pipeline::new();
        if config.ast_normalize {
            pipeline.add_transform(Transform::rewrite(AST_NORMALIZE, Arc::new(AstNormalize::new())))?;
        }
        if config.canonical_check {
            let mut transform = Transform::observe(CANONICAL_CHECK, check);
            if config.ast_normalize {
                transform = transform.after(AST_NORMALIZE);
            }
            pipeline.add_transform(transform)?;
        }
        Ok(pipeline)
    }

    /// Adds a transformation. Every dependency must already be present.
    pub fn add_transform(&mut self, transform: Transform) -> Result<(), NormalizeError> {
        if self.node_indices.contains_key(&transform.id) {
            return Err(NormalizeError::DuplicateTransform(transform.id));
        }
        let mut deps = Vec::with_capacity(transform.dependencies.len());
        for dep_id in &transform.dependencies {
            match self.node_indices.get(dep_id) {
                Some(dep_node) => deps.push(*dep_node),
                None => {
                    return Err(NormalizeError::UnknownDependency {
                        id: transform.id.clone(),
                        dependency: dep_id.clone(),
                    });
                }
            }
        }
        let id = transform.id.clone();
        let node = self.graph.add_node(transform);
        self.node_indices.insert(id, node);
        for dep_node in deps {
            self.graph.add_edge(dep_node, node, ());
        }
        Ok(())
    }

    /// Removes a transformation by id. Transforms that depended on it keep
    /// running, just without the ordering constraint.
    pub fn remove_transform(&mut self, id: &str) -> Option<Transform> {
        let node = self.node_indices.remove(id)?;
        let removed = self.graph.remove_node(node);
        // The graph moves its last node into the freed slot.
        if let Some(moved) = self.graph.node_weight(node) {
            self.node_indices.insert(moved.id.clone(), node);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Transform ids in execution order.
    pub fn order(&self) -> Result<Vec<&str>, NormalizeError> {
        Ok(self.sorted()?.into_iter().map(|idx| self.graph[idx].id.as_str()).collect())
    }

    /// Runs every transformation on `ast` and returns it along with `payload`,
    /// which no transform touches.
    pub fn apply<P>(&self, mut ast: Ast, payload: P) -> Result<(Ast, P), NormalizeError> {
        for node_idx in self.sorted()? {
            let transform = &self.graph[node_idx];
            debug!("running transform '{}'", transform.id);
            match &transform.kind {
                TransformKind::Rewrite(pass) => pass.run(&mut ast),
                TransformKind::Observe(observer) => observer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .observe(&ast),
            }
        }
        Ok((ast, payload))
    }

    fn sorted(&self) -> Result<Vec<NodeIndex>, NormalizeError> {
        toposort(&self.graph, None)
            .map_err(|cycle| NormalizeError::Cycle { id: self.graph[cycle.node_id()].id.clone() })
    }
}
