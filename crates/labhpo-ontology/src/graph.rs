//! In-memory is-a hierarchy with transitive ancestor queries.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use labhpo_model::TermId;

use crate::error::OntologyError;

/// Read-only ancestor lookups over an ontology.
///
/// Implementations must be safe to share between classification or closure
/// workers once loaded.
pub trait AncestorQuery {
    /// Resolve an alternate id to its primary id. Returns `None` for ids the
    /// ontology does not know.
    fn primary_id(&self, term: &TermId) -> Option<TermId>;

    /// Transitive closure of `term` along is-a edges. Returns `None` when the
    /// term (after alternate-id resolution) is not part of the ontology.
    fn ancestors(&self, term: &TermId, include_self: bool) -> Option<BTreeSet<TermId>>;
}

/// Directed acyclic graph of terms related by is-a edges.
#[derive(Debug, Clone, Default)]
pub struct OntologyGraph {
    names: BTreeMap<TermId, Option<String>>,
    parents: HashMap<TermId, Vec<TermId>>,
    alt_ids: HashMap<TermId, TermId>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl OntologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, id: TermId, name: Option<String>) {
        match self.names.get_mut(&id) {
            Some(existing) => {
                if name.is_some() {
                    *existing = name;
                }
            }
            None => {
                self.names.insert(id, name);
            }
        }
    }

    /// Add an is-a edge. Both ends become nodes of the graph.
    pub fn add_is_a(&mut self, child: TermId, parent: TermId) {
        self.names.entry(parent.clone()).or_insert(None);
        self.names.entry(child.clone()).or_insert(None);
        let parents = self.parents.entry(child).or_default();
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }

    pub fn add_alt_id(&mut self, alt: TermId, primary: TermId) {
        self.alt_ids.insert(alt, primary);
    }

    pub fn contains(&self, id: &TermId) -> bool {
        self.names.contains_key(id)
    }

    pub fn name(&self, id: &TermId) -> Option<&str> {
        self.names.get(id).and_then(|name| name.as_deref())
    }

    pub fn parents(&self, id: &TermId) -> &[TermId] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn term_count(&self) -> usize {
        self.names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.parents.values().map(Vec::len).sum()
    }

    /// Fail if any term reaches itself through is-a edges.
    pub fn check_acyclic(&self) -> Result<(), OntologyError> {
        let mut marks: HashMap<&TermId, Mark> = HashMap::new();
        for start in self.names.keys() {
            if marks.contains_key(start) {
                continue;
            }
            marks.insert(start, Mark::Visiting);
            let mut stack: Vec<(&TermId, usize)> = vec![(start, 0)];
            while let Some(&(node, idx)) = stack.last() {
                match self.parents(node).get(idx) {
                    Some(parent) => {
                        if let Some(top) = stack.last_mut() {
                            top.1 += 1;
                        }
                        match marks.get(parent) {
                            Some(Mark::Visiting) => {
                                return Err(OntologyError::Cycle {
                                    term: parent.to_string(),
                                });
                            }
                            Some(Mark::Done) => {}
                            None => {
                                marks.insert(parent, Mark::Visiting);
                                stack.push((parent, 0));
                            }
                        }
                    }
                    None => {
                        marks.insert(node, Mark::Done);
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }
}

impl AncestorQuery for OntologyGraph {
    fn primary_id(&self, term: &TermId) -> Option<TermId> {
        if self.names.contains_key(term) {
            return Some(term.clone());
        }
        self.alt_ids
            .get(term)
            .filter(|primary| self.names.contains_key(*primary))
            .cloned()
    }

    fn ancestors(&self, term: &TermId, include_self: bool) -> Option<BTreeSet<TermId>> {
        let primary = self.primary_id(term)?;
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(primary.clone());
        while let Some(current) = queue.pop_front() {
            for parent in self.parents(&current) {
                if seen.insert(parent.clone()) {
                    queue.push_back(parent.clone());
                }
            }
        }
        if include_self {
            seen.insert(primary);
        }
        Some(seen)
    }
}
