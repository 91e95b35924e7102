//! Migration structs and the dependency graph.
//!
//! A [`Migration`] is a named unit of schema change containing a sequence of
//! [`Operation`]s. The [`MigrationGraph`] manages the dependency DAG between
//! migrations across all apps, providing topological ordering, per-app leaf
//! queries, and conflict detection (more than one leaf per app means
//! un-merged branches).

use std::collections::{BTreeMap, VecDeque};

use modelmove_core::{ModelMoveError, ModelMoveResult};

use crate::operations::Operation;

/// A single migration containing a sequence of operations.
///
/// Migrations are identified by `(app_label, name)` and may declare
/// dependencies on other migrations. Operations within a migration are
/// applied in order. Once written to disk a migration is immutable: new
/// changes produce new migrations, never edits.
pub struct Migration {
    /// The migration name (e.g., "0001_initial").
    pub name: String,
    /// The application label this migration belongs to.
    pub app_label: String,
    /// Dependencies on other migrations: `(app_label, migration_name)`.
    pub dependencies: Vec<(String, String)>,
    /// The operations to apply, in order.
    pub operations: Vec<Box<dyn Operation>>,
    /// Whether this is the initial migration for the app.
    pub initial: bool,
}

impl Migration {
    /// Creates a new migration.
    pub fn new(app_label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            app_label: app_label.into(),
            dependencies: Vec::new(),
            operations: Vec::new(),
            initial: false,
        }
    }

    /// Marks this migration as the initial migration.
    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    /// Adds a dependency on another migration.
    pub fn depends_on(mut self, app_label: impl Into<String>, name: impl Into<String>) -> Self {
        self.dependencies.push((app_label.into(), name.into()));
        self
    }

    /// Adds an operation to this migration.
    pub fn add_operation(mut self, op: Box<dyn Operation>) -> Self {
        self.operations.push(op);
        self
    }

    /// Returns the `(app_label, name)` key for this migration.
    pub fn key(&self) -> (String, String) {
        (self.app_label.clone(), self.name.clone())
    }
}

/// A directed acyclic graph of migrations.
#[derive(Debug)]
pub struct MigrationGraph {
    /// All migration keys mapped to whether they are initial migrations.
    nodes: BTreeMap<(String, String), bool>,
    /// Forward edges: from dependency to dependent.
    forward_edges: BTreeMap<(String, String), Vec<(String, String)>>,
    /// Backward edges: from dependent to dependency.
    backward_edges: BTreeMap<(String, String), Vec<(String, String)>>,
}

impl MigrationGraph {
    /// Creates a new empty migration graph.
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            forward_edges: BTreeMap::new(),
            backward_edges: BTreeMap::new(),
        }
    }

    /// Adds a migration to the graph.
    pub fn add_node(
        &mut self,
        app_label: impl Into<String>,
        name: impl Into<String>,
        initial: bool,
    ) {
        let key = (app_label.into(), name.into());
        self.nodes.insert(key.clone(), initial);
        self.forward_edges.entry(key.clone()).or_default();
        self.backward_edges.entry(key).or_default();
    }

    /// Adds a dependency edge: `child` depends on `parent`.
    ///
    /// Both nodes must have been added previously.
    pub fn add_dependency(
        &mut self,
        child: (String, String),
        parent: (String, String),
    ) -> ModelMoveResult<()> {
        if !self.nodes.contains_key(&child) {
            return Err(ModelMoveError::DatabaseError(format!(
                "Migration {child:?} not found in graph"
            )));
        }
        if !self.nodes.contains_key(&parent) {
            return Err(ModelMoveError::DatabaseError(format!(
                "Migration {parent:?} (dependency of {child:?}) not found in graph"
            )));
        }
        self.forward_edges
            .entry(parent.clone())
            .or_default()
            .push(child.clone());
        self.backward_edges.entry(child).or_default().push(parent);
        Ok(())
    }

    /// Returns all migrations in topological order (dependencies first).
    ///
    /// Returns an error if the graph contains a cycle.
    pub fn topological_order(&self) -> ModelMoveResult<Vec<(String, String)>> {
        let mut in_degree: BTreeMap<(String, String), usize> = BTreeMap::new();
        for key in self.nodes.keys() {
            in_degree.insert(key.clone(), 0);
        }
        for children in self.forward_edges.values() {
            for child in children {
                *in_degree.entry(child.clone()).or_insert(0) += 1;
            }
        }

        // BTreeMap iteration keeps the initial queue deterministic.
        let mut queue: VecDeque<(String, String)> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(key, _)| key.clone())
            .collect();

        let mut result = Vec::new();
        while let Some(node) = queue.pop_front() {
            result.push(node.clone());
            if let Some(children) = self.forward_edges.get(&node) {
                let mut sorted_children = children.clone();
                sorted_children.sort();
                for child in &sorted_children {
                    if let Some(deg) = in_degree.get_mut(child) {
                        *deg -= 1;
                        if *deg == 0 {
                            queue.push_back(child.clone());
                        }
                    }
                }
            }
        }

        if result.len() != self.nodes.len() {
            return Err(ModelMoveError::DatabaseError(
                "Circular dependency detected in migration graph".to_string(),
            ));
        }

        Ok(result)
    }

    /// Returns the leaf nodes (migrations with no dependents) for an app.
    pub fn leaf_nodes(&self, app_label: &str) -> Vec<(String, String)> {
        let mut leaves = Vec::new();
        for (key, children) in &self.forward_edges {
            if key.0 == app_label && !children.iter().any(|c| c.0 == app_label) {
                leaves.push(key.clone());
            }
        }
        leaves.sort();
        leaves
    }

    /// Returns apps with more than one leaf node, i.e. un-merged branches.
    pub fn detect_conflicts(&self) -> BTreeMap<String, Vec<String>> {
        let mut conflicts = BTreeMap::new();
        let apps: std::collections::BTreeSet<&str> =
            self.nodes.keys().map(|k| k.0.as_str()).collect();
        for app in apps {
            let leaves = self.leaf_nodes(app);
            if leaves.len() > 1 {
                conflicts.insert(
                    app.to_string(),
                    leaves.into_iter().map(|(_, name)| name).collect(),
                );
            }
        }
        conflicts
    }

    /// Returns all node keys in the graph, sorted.
    pub fn node_keys(&self) -> Vec<(String, String)> {
        self.nodes.keys().cloned().collect()
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns whether the graph contains a given node.
    pub fn contains(&self, key: &(String, String)) -> bool {
        self.nodes.contains_key(key)
    }

    /// Returns the dependencies of a node.
    pub fn dependencies(&self, key: &(String, String)) -> Vec<(String, String)> {
        self.backward_edges.get(key).cloned().unwrap_or_default()
    }

    /// Returns the dependents of a node.
    pub fn dependents(&self, key: &(String, String)) -> Vec<(String, String)> {
        self.forward_edges.get(key).cloned().unwrap_or_default()
    }

    /// Validates that the graph has no cycles.
    pub fn validate(&self) -> ModelMoveResult<()> {
        self.topological_order()?;
        Ok(())
    }
}

impl Default for MigrationGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(app: &str, name: &str) -> (String, String) {
        (app.to_string(), name.to_string())
    }

    #[test]
    fn test_migration_builder() {
        let m = Migration::new("blog", "0002_add_author")
            .initial()
            .depends_on("blog", "0001_initial")
            .depends_on("auth", "0001_initial");
        assert_eq!(m.key(), key("blog", "0002_add_author"));
        assert!(m.initial);
        assert_eq!(m.dependencies.len(), 2);
        assert!(m.operations.is_empty());
    }

    #[test]
    fn test_graph_add_node_and_contains() {
        let mut g = MigrationGraph::new();
        g.add_node("blog", "0001_initial", true);
        assert_eq!(g.len(), 1);
        assert!(g.contains(&key("blog", "0001_initial")));
        assert!(!g.contains(&key("blog", "0002_missing")));
    }

    #[test]
    fn test_graph_add_dependency_missing_nodes() {
        let mut g = MigrationGraph::new();
        g.add_node("blog", "0001_initial", true);
        assert!(g
            .add_dependency(key("blog", "0002_missing"), key("blog", "0001_initial"))
            .is_err());
        assert!(g
            .add_dependency(key("blog", "0001_initial"), key("blog", "0000_missing"))
            .is_err());
    }

    #[test]
    fn test_graph_topological_order_chain() {
        let mut g = MigrationGraph::new();
        g.add_node("blog", "0001_initial", true);
        g.add_node("blog", "0002_add_title", false);
        g.add_node("blog", "0003_add_body", false);
        g.add_dependency(key("blog", "0002_add_title"), key("blog", "0001_initial"))
            .unwrap();
        g.add_dependency(key("blog", "0003_add_body"), key("blog", "0002_add_title"))
            .unwrap();

        let order = g.topological_order().unwrap();
        let pos_1 = order.iter().position(|k| k.1 == "0001_initial").unwrap();
        let pos_2 = order.iter().position(|k| k.1 == "0002_add_title").unwrap();
        let pos_3 = order.iter().position(|k| k.1 == "0003_add_body").unwrap();
        assert!(pos_1 < pos_2);
        assert!(pos_2 < pos_3);
    }

    #[test]
    fn test_graph_topological_order_cross_app() {
        let mut g = MigrationGraph::new();
        g.add_node("auth", "0001_initial", true);
        g.add_node("blog", "0001_initial", true);
        g.add_dependency(key("blog", "0001_initial"), key("auth", "0001_initial"))
            .unwrap();

        let order = g.topological_order().unwrap();
        let pos_auth = order.iter().position(|k| k.0 == "auth").unwrap();
        let pos_blog = order.iter().position(|k| k.0 == "blog").unwrap();
        assert!(pos_auth < pos_blog);
    }

    #[test]
    fn test_graph_cycle_detection() {
        let mut g = MigrationGraph::new();
        g.add_node("app", "A", false);
        g.add_node("app", "B", false);
        g.add_dependency(key("app", "B"), key("app", "A")).unwrap();
        g.add_dependency(key("app", "A"), key("app", "B")).unwrap();
        assert!(g.topological_order().is_err());
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_graph_leaf_nodes() {
        let mut g = MigrationGraph::new();
        g.add_node("blog", "0001_initial", true);
        g.add_node("blog", "0002_add_title", false);
        g.add_dependency(key("blog", "0002_add_title"), key("blog", "0001_initial"))
            .unwrap();

        assert_eq!(g.leaf_nodes("blog"), vec![key("blog", "0002_add_title")]);
    }

    #[test]
    fn test_leaf_ignores_cross_app_dependents() {
        // A migration whose only dependents live in other apps is still the
        // leaf of its own app's lineage.
        let mut g = MigrationGraph::new();
        g.add_node("base_app", "0001_initial", true);
        g.add_node("foreign_app", "0001_initial", true);
        g.add_dependency(
            key("foreign_app", "0001_initial"),
            key("base_app", "0001_initial"),
        )
        .unwrap();

        assert_eq!(
            g.leaf_nodes("base_app"),
            vec![key("base_app", "0001_initial")]
        );
    }

    #[test]
    fn test_detect_conflicts() {
        let mut g = MigrationGraph::new();
        g.add_node("blog", "0001_initial", true);
        g.add_node("blog", "0002_branch_a", false);
        g.add_node("blog", "0002_branch_b", false);
        g.add_dependency(key("blog", "0002_branch_a"), key("blog", "0001_initial"))
            .unwrap();
        g.add_dependency(key("blog", "0002_branch_b"), key("blog", "0001_initial"))
            .unwrap();

        let conflicts = g.detect_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts.get("blog").unwrap(),
            &vec!["0002_branch_a".to_string(), "0002_branch_b".to_string()]
        );
    }

    #[test]
    fn test_detect_conflicts_clean_graph() {
        let mut g = MigrationGraph::new();
        g.add_node("blog", "0001_initial", true);
        g.add_node("auth", "0001_initial", true);
        assert!(g.detect_conflicts().is_empty());
    }

    #[test]
    fn test_graph_dependencies_and_dependents() {
        let mut g = MigrationGraph::new();
        g.add_node("blog", "0001_initial", true);
        g.add_node("blog", "0002_add_title", false);
        g.add_dependency(key("blog", "0002_add_title"), key("blog", "0001_initial"))
            .unwrap();

        assert_eq!(
            g.dependencies(&key("blog", "0002_add_title")),
            vec![key("blog", "0001_initial")]
        );
        assert_eq!(
            g.dependents(&key("blog", "0001_initial")),
            vec![key("blog", "0002_add_title")]
        );
    }

    #[test]
    fn test_empty_graph() {
        let g = MigrationGraph::default();
        assert!(g.is_empty());
        assert!(g.topological_order().unwrap().is_empty());
        assert!(g.detect_conflicts().is_empty());
    }
}
