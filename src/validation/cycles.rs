use rustc_hash::{FxHashMap, FxHashSet};

/// Directed graph of internal references.
///
/// Nodes are property paths of values holding a reference; an edge points at
/// the path the reference resolves to. Targets that hold no reference
/// themselves are sinks.
#[derive(Debug, Default)]
pub(crate) struct ReferenceGraph {
    order: Vec<String>,
    edges: FxHashMap<String, Vec<String>>,
}

impl ReferenceGraph {
    pub(crate) fn add_edge(&mut self, from: &str, to: &str) {
        if !self.edges.contains_key(from) {
            self.order.push(from.to_string());
        }
        let targets = self.edges.entry(from.to_string()).or_default();
        if !targets.iter().any(|t| t == to) {
            targets.push(to.to_string());
        }
    }

    /// Every cycle reachable by depth-first search, each reported once.
    ///
    /// A cycle lists its nodes in traversal order and repeats the first node
    /// at the end, so a self-reference yields `[a, a]`.
    pub(crate) fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut visited = FxHashSet::default();
        let mut stack = Vec::new();
        let mut on_stack = FxHashSet::default();
        let mut cycles = Vec::new();

        for start in &self.order {
            if !visited.contains(start.as_str()) {
                self.visit(start, &mut visited, &mut stack, &mut on_stack, &mut cycles);
            }
        }
        cycles
    }

    fn visit<'a>(
        &'a self,
        node: &'a str,
        visited: &mut FxHashSet<&'a str>,
        stack: &mut Vec<&'a str>,
        on_stack: &mut FxHashSet<&'a str>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        visited.insert(node);
        stack.push(node);
        on_stack.insert(node);

        if let Some(targets) = self.edges.get(node) {
            for target in targets {
                let target = target.as_str();
                if on_stack.contains(target) {
                    if let Some(start) = stack.iter().position(|n| *n == target) {
                        let mut cycle: Vec<String> =
                            stack[start..].iter().map(|n| n.to_string()).collect();
                        cycle.push(target.to_string());
                        cycles.push(cycle);
                    }
                } else if !visited.contains(target) {
                    self.visit(target, visited, stack, on_stack, cycles);
                }
            }
        }

        stack.pop();
        on_stack.remove(node);
    }
}
