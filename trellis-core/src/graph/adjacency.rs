//! Index-based adjacency storage for the dependency graph.

use indexmap::IndexMap;
use smallvec::SmallVec;

type EdgeList = SmallVec<[usize; 4]>;

/// The built dependency graph over one scope's variables.
///
/// Nodes are inserted in declaration order; their insertion index doubles as
/// the node index for the edge lists.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Name → node index, in declaration order.
    names: IndexMap<String, usize>,
    /// Per node: the nodes it depends on.
    dependencies: Vec<EdgeList>,
    /// Per node: the nodes depending on it.
    dependents: Vec<EdgeList>,
    /// Edges skipped to avoid closing a cycle, as (dependent, dependency).
    dropped: Vec<(String, String)>,
}

impl DependencyGraph {
    /// Create a graph with the given nodes (declaration order) and no edges.
    pub fn with_nodes<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut graph = Self::default();
        for name in names {
            let idx = graph.names.len();
            graph.names.insert(name.into(), idx);
            graph.dependencies.push(EdgeList::new());
            graph.dependents.push(EdgeList::new());
        }
        graph
    }

    /// The node index for a name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// The name at a node index.
    fn name_at(&self, index: usize) -> &str {
        self.names
            .get_index(index)
            .map(|(name, _)| name.as_str())
            .unwrap_or_default()
    }

    /// Add the edge "dependent depends on dependency".
    ///
    /// The caller (the builder) is responsible for cycle checks.
    pub(crate) fn add_edge(&mut self, dependent: usize, dependency: usize) {
        if !self.dependencies[dependent].contains(&dependency) {
            self.dependencies[dependent].push(dependency);
            self.dependents[dependency].push(dependent);
        }
    }

    /// Record an edge that was skipped to keep the graph acyclic.
    pub(crate) fn record_dropped(&mut self, dependent: usize, dependency: usize) {
        self.dropped.push((
            self.name_at(dependent).to_string(),
            self.name_at(dependency).to_string(),
        ));
    }

    /// Whether `from` reaches `to` by following dependency edges.
    ///
    /// `reaches(x, x)` is true; a node trivially reaches itself.
    pub fn reaches(&self, from: usize, to: usize) -> bool {
        if from == to {
            return true;
        }
        let mut visited = vec![false; self.names.len()];
        let mut stack: Vec<usize> = vec![from];
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if visited[node] {
                continue;
            }
            visited[node] = true;
            stack.extend(self.dependencies[node].iter().copied());
        }
        false
    }

    /// Names of the nodes `name` directly depends on.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.index_of(name)
            .map(|idx| {
                self.dependencies[idx]
                    .iter()
                    .map(|&d| self.name_at(d))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of the nodes that directly depend on `name`.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.index_of(name)
            .map(|idx| {
                self.dependents[idx]
                    .iter()
                    .map(|&d| self.name_at(d))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of every node that transitively depends on `name`.
    pub fn transitive_dependents_of(&self, name: &str) -> Vec<&str> {
        let Some(start) = self.index_of(name) else {
            return Vec::new();
        };
        let mut visited = vec![false; self.names.len()];
        visited[start] = true;
        let mut queue: Vec<usize> = self.dependents[start].to_vec();
        let mut result = Vec::new();
        while let Some(node) = queue.pop() {
            if visited[node] {
                continue;
            }
            visited[node] = true;
            result.push(self.name_at(node));
            queue.extend(self.dependents[node].iter().copied());
        }
        result
    }

    /// Whether the node has at least one dependent.
    pub fn has_dependents(&self, name: &str) -> bool {
        self.index_of(name)
            .map(|idx| !self.dependents[idx].is_empty())
            .unwrap_or(false)
    }

    /// Node names in declaration order.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// Total number of edges kept in the graph.
    pub fn edge_count(&self) -> usize {
        self.dependencies.iter().map(SmallVec::len).sum()
    }

    /// Edges skipped during the build, as (dependent, dependency) names.
    pub fn dropped_edges(&self) -> &[(String, String)] {
        &self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> DependencyGraph {
        // b depends on a, c depends on b
        let mut g = DependencyGraph::with_nodes(["a", "b", "c"]);
        g.add_edge(1, 0);
        g.add_edge(2, 1);
        g
    }

    #[test]
    fn reachability_follows_dependency_edges() {
        let g = chain();
        assert!(g.reaches(2, 0)); // c -> b -> a
        assert!(g.reaches(1, 0));
        assert!(!g.reaches(0, 2));
        assert!(g.reaches(1, 1));
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let mut g = DependencyGraph::with_nodes(["a", "b"]);
        g.add_edge(1, 0);
        g.add_edge(1, 0);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn dependent_and_dependency_views_agree() {
        let g = chain();
        assert_eq!(g.dependencies_of("c"), vec!["b"]);
        assert_eq!(g.dependents_of("a"), vec!["b"]);
        assert!(g.dependencies_of("a").is_empty());
        assert!(g.has_dependents("b"));
        assert!(!g.has_dependents("c"));
    }

    #[test]
    fn transitive_dependents_cover_the_chain() {
        let g = chain();
        let mut deps = g.transitive_dependents_of("a");
        deps.sort_unstable();
        assert_eq!(deps, vec!["b", "c"]);
        assert!(g.transitive_dependents_of("c").is_empty());
    }
}
