//! Graph construction with incremental cycle avoidance.

use tracing::warn;

use super::adjacency::DependencyGraph;
use crate::registry::VariableTypeRegistry;
use crate::variable::Variable;

/// Build the dependency graph for the given variables.
///
/// `variables` must be in declaration order; the iteration order is part of
/// the contract. For every ordered pair the owning kind's `depends_on` is
/// queried, and an edge that would close a cycle is skipped instead of
/// failing the build. The dropped edge is the later-declared one, so the
/// surviving partial order is deterministic.
pub fn build_graph(variables: &[Variable], registry: &VariableTypeRegistry) -> DependencyGraph {
    let mut graph = DependencyGraph::with_nodes(variables.iter().map(|v| v.name.clone()));

    for (dependent_idx, dependent) in variables.iter().enumerate() {
        let variable_type = registry.get(dependent.kind);
        for (dependency_idx, dependency) in variables.iter().enumerate() {
            if dependent_idx == dependency_idx {
                continue;
            }
            if !variable_type.depends_on(dependent, dependency) {
                continue;
            }
            // Adding dependent -> dependency closes a cycle exactly when the
            // dependency already reaches the dependent.
            if graph.reaches(dependency_idx, dependent_idx) {
                warn!(
                    dependent = %dependent.name,
                    dependency = %dependency.name,
                    "skipping dependency edge that would close a cycle"
                );
                graph.record_dropped(dependent_idx, dependency_idx);
                continue;
            }
            graph.add_edge(dependent_idx, dependency_idx);
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Variable;

    fn registry() -> VariableTypeRegistry {
        VariableTypeRegistry::default()
    }

    fn declared(mut vars: Vec<Variable>) -> Vec<Variable> {
        for (i, v) in vars.iter_mut().enumerate() {
            v.index = i as i64;
        }
        vars
    }

    #[test]
    fn chain_builds_both_edges() {
        let vars = declared(vec![
            Variable::query("c", "items()"),
            Variable::query("b", "items($c)"),
            Variable::query("a", "items($b)"),
        ]);
        let graph = build_graph(&vars, &registry());
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.dependencies_of("a"), vec!["b"]);
        assert_eq!(graph.dependencies_of("b"), vec!["c"]);
        assert!(graph.dropped_edges().is_empty());
    }

    #[test]
    fn three_cycle_drops_exactly_the_last_declared_edge() {
        // a -> b -> c -> a by reference; the c -> a edge is visited last in
        // declaration order, so it is the one dropped.
        let vars = declared(vec![
            Variable::query("a", "items($b)"),
            Variable::query("b", "items($c)"),
            Variable::query("c", "items($a)"),
        ]);
        let graph = build_graph(&vars, &registry());
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.dropped_edges(), &[("c".to_string(), "a".to_string())]);
        assert_eq!(graph.dependencies_of("a"), vec!["b"]);
        assert_eq!(graph.dependencies_of("b"), vec!["c"]);
        assert!(graph.dependencies_of("c").is_empty());
    }

    #[test]
    fn two_cycle_keeps_the_earlier_declared_edge() {
        let vars = declared(vec![
            Variable::query("a", "items($b)"),
            Variable::query("b", "items($a)"),
        ]);
        let graph = build_graph(&vars, &registry());
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dependencies_of("a"), vec!["b"]);
        assert_eq!(graph.dropped_edges(), &[("b".to_string(), "a".to_string())]);
    }

    #[test]
    fn unrelated_variables_produce_no_edges() {
        let vars = declared(vec![
            Variable::query("a", "items()"),
            Variable::custom("b", "x,y"),
        ]);
        let graph = build_graph(&vars, &registry());
        assert_eq!(graph.edge_count(), 0);
    }
}
