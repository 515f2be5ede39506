//! Project hierarchy rebuilt from a flat remote listing.
//!
//! The tree is built fresh on every pass and dropped afterwards. Child and
//! root order is listing order.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::warn;

use crate::remote::Project;

/// Rooted forest of remote projects keyed by project id.
#[derive(Debug, Default, Clone)]
pub struct ProjectTree {
    nodes: HashMap<String, Project>,
    children: HashMap<String, Vec<String>>,
    roots: Vec<String>,
    /// Ids in listing order, for deterministic iteration over `nodes`
    order: Vec<String>,
}

impl ProjectTree {
    /// Build the forest in a single pass over the listing.
    ///
    /// Children may arrive before their parent, so `children` is keyed by
    /// parent id without requiring the parent to be registered yet. A node
    /// whose parent never shows up is registered but unreachable from
    /// `roots`; see [`ProjectTree::unreachable`]. A repeated id keeps the
    /// first record.
    pub fn build(projects: impl IntoIterator<Item = Project>) -> Self {
        let mut tree = Self::default();

        for project in projects {
            if tree.nodes.contains_key(&project.id) {
                warn!(
                    "Duplicate project id {} ('{}') in listing, keeping the first record",
                    project.id, project.name
                );
                continue;
            }

            match &project.parent_id {
                Some(parent_id) => tree
                    .children
                    .entry(parent_id.clone())
                    .or_default()
                    .push(project.id.clone()),
                None => tree.roots.push(project.id.clone()),
            }
            tree.order.push(project.id.clone());
            tree.nodes.insert(project.id.clone(), project);
        }

        tree
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Direct children of a project, in listing order
    pub fn children(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_children(&self, id: &str) -> bool {
        !self.children(id).is_empty()
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Number of registered projects (reachable or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All registered projects in listing order
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Reachable projects, breadth-first, grouped by depth.
    pub fn levels(&self) -> Vec<Vec<&Project>> {
        let mut levels = Vec::new();
        let mut current: Vec<&String> = self.roots.iter().collect();

        while !current.is_empty() {
            let level: Vec<&Project> = current.iter().filter_map(|id| self.nodes.get(*id)).collect();
            current = current
                .iter()
                .flat_map(|id| self.children(id).iter())
                .collect();
            levels.push(level);
        }

        levels
    }

    /// Reachable projects, depth-first pre-order, using an explicit stack.
    pub fn depth_first(&self) -> Vec<&Project> {
        let mut visited = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&String> = self.roots.iter().rev().collect();

        while let Some(id) = stack.pop() {
            if let Some(project) = self.nodes.get(id) {
                visited.push(project);
            }
            stack.extend(self.children(id).iter().rev());
        }

        visited
    }

    /// Registered projects that cannot be reached from any root, in listing order.
    ///
    /// These are nodes whose parent (or some ancestor's parent) is missing
    /// from the listing, or which sit on a parent cycle.
    pub fn unreachable(&self) -> Vec<&Project> {
        let mut reachable: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
        let mut queue: VecDeque<&String> = self.roots.iter().collect();
        while let Some(id) = queue.pop_front() {
            reachable.insert(id.as_str());
            queue.extend(self.children(id).iter());
        }

        self.projects()
            .filter(|p| !reachable.contains(p.id.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: &str, name: &str, parent: Option<&str>) -> Project {
        Project::new(id, name, parent)
    }

    fn ids(projects: &[&Project]) -> Vec<String> {
        projects.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn builds_roots_and_children_in_listing_order() {
        let tree = ProjectTree::build(vec![
            p("1", "Work", None),
            p("2", "Home", None),
            p("3", "Website", Some("1")),
            p("4", "Hiring", Some("1")),
        ]);

        assert_eq!(tree.roots(), ["1", "2"]);
        assert_eq!(tree.children("1"), ["3", "4"]);
        assert!(tree.children("2").is_empty());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn child_before_parent_is_linked() {
        let tree = ProjectTree::build(vec![p("3", "Launch", Some("2")), p("2", "Website", Some("1")), p("1", "Work", None)]);

        assert_eq!(tree.roots(), ["1"]);
        assert_eq!(ids(&tree.depth_first()), vec!["1", "2", "3"]);
        assert!(tree.unreachable().is_empty());
    }

    #[test]
    fn orphan_is_registered_but_unreachable() {
        let tree = ProjectTree::build(vec![
            p("1", "Work", None),
            p("5", "Lost", Some("404")),
            p("6", "Lost child", Some("5")),
        ]);

        assert!(tree.contains("5"));
        assert!(tree.contains("6"));
        assert_eq!(ids(&tree.depth_first()), vec!["1"]);
        assert_eq!(ids(&tree.unreachable()), vec!["5", "6"]);
    }

    #[test]
    fn parent_cycle_is_unreachable() {
        let tree = ProjectTree::build(vec![p("a", "A", Some("b")), p("b", "B", Some("a"))]);
        assert!(tree.roots().is_empty());
        assert_eq!(ids(&tree.unreachable()), vec!["a", "b"]);
    }

    #[test]
    fn duplicate_id_keeps_first_record() {
        let tree = ProjectTree::build(vec![p("1", "Work", None), p("1", "Other", None)]);
        assert_eq!(tree.roots(), ["1"]);
        assert_eq!(tree.get("1").unwrap().name, "Work");
    }

    #[test]
    fn levels_are_breadth_first() {
        let tree = ProjectTree::build(vec![
            p("1", "Work", None),
            p("2", "Home", None),
            p("3", "Website", Some("1")),
            p("4", "Garden", Some("2")),
            p("5", "Launch", Some("3")),
        ]);

        let levels: Vec<Vec<String>> = tree.levels().iter().map(|l| ids(l)).collect();
        assert_eq!(levels, vec![vec!["1", "2"], vec!["3", "4"], vec!["5"]]);
    }

    #[test]
    fn every_reachable_node_appears_once() {
        let tree = ProjectTree::build(vec![
            p("1", "Work", None),
            p("3", "Website", Some("1")),
            p("4", "Hiring", Some("1")),
            p("5", "Launch", Some("3")),
        ]);

        let walked = ids(&tree.depth_first());
        let unique: HashSet<_> = walked.iter().collect();
        assert_eq!(walked.len(), unique.len());
        assert_eq!(walked, vec!["1", "3", "5", "4"]);

        for project in tree.depth_first() {
            if let Some(parent) = &project.parent_id {
                assert!(tree.contains(parent));
            }
        }
    }
}
