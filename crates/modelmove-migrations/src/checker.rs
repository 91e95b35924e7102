//! Pre-flight consistency checks.
//!
//! Every check runs before a single migration file is written; any failure
//! is a [`ModelMoveError::Precondition`] and aborts with no side effects.

use modelmove_core::{ModelMoveError, ModelMoveResult};

use crate::executor::MigrationRecorder;
use crate::migration::MigrationGraph;

/// Verifies that the migration graph and the recorded history are in a
/// state the relocation procedure can safely build on.
pub struct ConsistencyChecker<'a> {
    graph: &'a MigrationGraph,
    recorder: &'a MigrationRecorder,
}

impl<'a> ConsistencyChecker<'a> {
    /// Creates a checker over a loaded graph and recorder.
    pub fn new(graph: &'a MigrationGraph, recorder: &'a MigrationRecorder) -> Self {
        Self { graph, recorder }
    }

    /// Runs every check in order.
    pub fn check_all(&self) -> ModelMoveResult<()> {
        self.check_unapplied()?;
        self.check_consistent_history()?;
        self.check_conflicts()
    }

    /// Fails if any migration on disk has not been applied.
    pub fn check_unapplied(&self) -> ModelMoveResult<()> {
        let applied = self.recorder.applied();
        let unapplied: Vec<String> = self
            .graph
            .node_keys()
            .into_iter()
            .filter(|key| !applied.contains(key))
            .map(|(app, name)| format!("{app}.{name}"))
            .collect();

        if unapplied.is_empty() {
            Ok(())
        } else {
            Err(ModelMoveError::Precondition(format!(
                "You have {} unapplied migration(s): {}. Apply them with \
                 'modelmove migrate' before running move_model.",
                unapplied.len(),
                unapplied.join(", ")
            )))
        }
    }

    /// Fails if any applied migration has an unapplied dependency.
    pub fn check_consistent_history(&self) -> ModelMoveResult<()> {
        let applied = self.recorder.applied();
        for key in self.graph.node_keys() {
            if !applied.contains(&key) {
                continue;
            }
            for dep in self.graph.dependencies(&key) {
                if self.graph.contains(&dep) && !applied.contains(&dep) {
                    return Err(ModelMoveError::Precondition(format!(
                        "Inconsistent migration history: {}.{} is applied before \
                         its dependency {}.{}",
                        key.0, key.1, dep.0, dep.1
                    )));
                }
            }
        }
        Ok(())
    }

    /// Fails if any app has more than one leaf node (un-merged branches).
    pub fn check_conflicts(&self) -> ModelMoveResult<()> {
        let conflicts = self.graph.detect_conflicts();
        if conflicts.is_empty() {
            return Ok(());
        }
        let name_str = conflicts
            .iter()
            .map(|(app, names)| format!("{} in {app}", names.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        Err(ModelMoveError::Precondition(format!(
            "Conflicting migrations detected; multiple leaf nodes in the \
             migration graph: ({name_str}). Merge the branches before running \
             this command."
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(app: &str, name: &str) -> (String, String) {
        (app.to_string(), name.to_string())
    }

    fn linear_graph() -> MigrationGraph {
        let mut g = MigrationGraph::new();
        g.add_node("blog", "0001_initial", true);
        g.add_node("blog", "0002_add_title", false);
        g.add_dependency(key("blog", "0002_add_title"), key("blog", "0001_initial"))
            .unwrap();
        g
    }

    #[test]
    fn test_all_checks_pass_on_fully_applied_graph() {
        let graph = linear_graph();
        let mut recorder = MigrationRecorder::new();
        recorder.apply(key("blog", "0001_initial"));
        recorder.apply(key("blog", "0002_add_title"));

        let checker = ConsistencyChecker::new(&graph, &recorder);
        assert!(checker.check_all().is_ok());
    }

    #[test]
    fn test_unapplied_migrations_fail() {
        let graph = linear_graph();
        let mut recorder = MigrationRecorder::new();
        recorder.apply(key("blog", "0001_initial"));

        let checker = ConsistencyChecker::new(&graph, &recorder);
        let err = checker.check_all().unwrap_err();
        assert!(err.is_precondition());
        assert!(err.to_string().contains("unapplied"));
        assert!(err.to_string().contains("blog.0002_add_title"));
    }

    #[test]
    fn test_inconsistent_history_fails() {
        let graph = linear_graph();
        let mut recorder = MigrationRecorder::new();
        // 0002 applied, its dependency 0001 not.
        recorder.apply(key("blog", "0002_add_title"));

        let checker = ConsistencyChecker::new(&graph, &recorder);
        let err = checker.check_consistent_history().unwrap_err();
        assert!(err.is_precondition());
        assert!(err.to_string().contains("Inconsistent"));
    }

    #[test]
    fn test_conflicting_leaves_fail() {
        let mut graph = MigrationGraph::new();
        graph.add_node("blog", "0001_initial", true);
        graph.add_node("blog", "0002_branch_a", false);
        graph.add_node("blog", "0002_branch_b", false);
        graph
            .add_dependency(key("blog", "0002_branch_a"), key("blog", "0001_initial"))
            .unwrap();
        graph
            .add_dependency(key("blog", "0002_branch_b"), key("blog", "0001_initial"))
            .unwrap();

        let mut recorder = MigrationRecorder::new();
        for node in graph.node_keys() {
            recorder.apply(node);
        }

        let checker = ConsistencyChecker::new(&graph, &recorder);
        let err = checker.check_all().unwrap_err();
        assert!(err.is_precondition());
        assert!(err.to_string().contains("Conflicting migrations"));
    }

    #[test]
    fn test_empty_graph_passes() {
        let graph = MigrationGraph::new();
        let recorder = MigrationRecorder::new();
        let checker = ConsistencyChecker::new(&graph, &recorder);
        assert!(checker.check_all().is_ok());
    }
}
