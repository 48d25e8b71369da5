//! # Directed Graph
//!
//! Immutable vertex-indexed graph used for logic definitions.
//!
//! A graph is assembled through [`DiGraphBuilder`] and frozen by `build()`.
//! All maps are `BTreeMap` so equality, hashing and the encoded bytes are
//! independent of the order in which vertices were registered. Successor and
//! predecessor lists keep edge-insertion order.
//!
//! ## Wire Layout
//!
//! ```text
//! [marshal version = 3]
//! [vertex count] [vertex record]*
//! [successor entry count] ([vertex] [count] [successor]*)*
//! [root count] [root]*
//! [predecessor entry count] ([vertex] [count] [predecessor]*)*
//! ```

use crate::entity::Field;
use crate::formats::{BinaryReader, BinaryWriter, Marshal};
use crate::{Nid, TermstoreError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

// =============================================================================
// VERTEX
// =============================================================================

/// Payload stored in a [`DiGraph`]: anything that knows its own index and can
/// be marshalled.
pub trait GraphVertex: Marshal + Clone + PartialEq {
    /// Position of this vertex in the graph's vertex map.
    fn index(&self) -> i32;
}

/// A logic definition vertex: what it means plus its properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vertex {
    pub index: i32,
    /// Concept naming the vertex role (e.g. "and", "role", "concept reference").
    pub meaning: Nid,
    #[serde(default)]
    pub properties: BTreeMap<Nid, Field>,
}

impl Vertex {
    #[must_use]
    pub fn new(index: i32, meaning: Nid) -> Self {
        Self {
            index,
            meaning,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter.
    #[must_use]
    pub fn with_property(mut self, key: Nid, value: Field) -> Self {
        self.properties.insert(key, value);
        self
    }

    #[must_use]
    pub fn property(&self, key: Nid) -> Option<&Field> {
        self.properties.get(&key)
    }
}

impl GraphVertex for Vertex {
    fn index(&self) -> i32 {
        self.index
    }
}

impl Marshal for Vertex {
    const RECORD_NAME: &'static str = "Vertex";
    const MARSHAL_VERSION: i32 = 1;

    fn marshal(&self, out: &mut BinaryWriter) {
        out.put_int(self.index);
        out.put_nid(self.meaning);
        out.put_len(self.properties.len());
        for (key, value) in &self.properties {
            out.put_nid(*key);
            value.write(out);
        }
    }

    fn unmarshal(input: &mut BinaryReader<'_>) -> Result<Self, TermstoreError> {
        let index = input.get_int()?;
        let meaning = input.get_nid()?;
        let count = input.get_len()?;
        let mut properties = BTreeMap::new();
        for _ in 0..count {
            let key = input.get_nid()?;
            properties.insert(key, Field::read(input)?);
        }
        Ok(Self {
            index,
            meaning,
            properties,
        })
    }
}

// =============================================================================
// DIGRAPH
// =============================================================================

/// Immutable directed graph: vertex map, successor map, predecessor map, roots.
///
/// Lookups never return "absent" for adjacency: a vertex without edges has
/// an empty slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiGraph<V> {
    vertices: BTreeMap<i32, V>,
    successors: BTreeMap<i32, Vec<i32>>,
    predecessors: BTreeMap<i32, Vec<i32>>,
    roots: Vec<i32>,
}

impl<V: GraphVertex> DiGraph<V> {
    /// Start an empty builder.
    #[must_use]
    pub fn builder() -> DiGraphBuilder<V> {
        DiGraphBuilder::new()
    }

    /// Root vertex indices in registration order.
    #[must_use]
    pub fn roots(&self) -> &[i32] {
        &self.roots
    }

    /// Root payloads in registration order.
    pub fn root_vertices(&self) -> impl Iterator<Item = &V> + '_ {
        self.roots.iter().filter_map(|root| self.vertices.get(root))
    }

    /// Successors of `vertex` in edge-insertion order.
    #[must_use]
    pub fn successors(&self, vertex: i32) -> &[i32] {
        self.successors.get(&vertex).map_or(&[], Vec::as_slice)
    }

    /// Predecessors of `vertex` in edge-insertion order.
    #[must_use]
    pub fn predecessors(&self, vertex: i32) -> &[i32] {
        self.predecessors.get(&vertex).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn vertex(&self, index: i32) -> Option<&V> {
        self.vertices.get(&index)
    }

    /// All vertices in index order.
    pub fn vertices(&self) -> impl Iterator<Item = &V> + '_ {
        self.vertices.values()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn successor_map(&self) -> &BTreeMap<i32, Vec<i32>> {
        &self.successors
    }

    #[must_use]
    pub fn predecessor_map(&self) -> &BTreeMap<i32, Vec<i32>> {
        &self.predecessors
    }

    /// Vertices reachable from `start` (excluding it) in pre-order.
    ///
    /// Iterative with a visited set, so cycles terminate.
    #[must_use]
    pub fn descendants(&self, start: i32) -> Vec<i32> {
        let mut visited = BTreeSet::new();
        visited.insert(start);
        let mut order = Vec::new();
        let mut stack: Vec<i32> = self.successors(start).iter().rev().copied().collect();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            order.push(current);
            stack.extend(self.successors(current).iter().rev().copied());
        }
        order
    }

    /// True when the successor relation has no cycle.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        let mut in_degree: BTreeMap<i32, usize> =
            self.vertices.keys().map(|index| (*index, 0)).collect();
        for targets in self.successors.values() {
            for target in targets {
                *in_degree.entry(*target).or_default() += 1;
            }
        }

        let mut ready: VecDeque<i32> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(index, _)| *index)
            .collect();
        let mut seen = 0usize;

        while let Some(current) = ready.pop_front() {
            seen += 1;
            for target in self.successors(current) {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(*target);
                    }
                }
            }
        }
        seen == in_degree.len()
    }

    /// Check referential integrity: every index named by an edge or a root
    /// exists in the vertex map, and every vertex sits under its own index.
    pub fn validate(&self) -> Result<(), TermstoreError> {
        for (index, vertex) in &self.vertices {
            if vertex.index() != *index {
                return Err(TermstoreError::MalformedGraph(format!(
                    "vertex stored at {} reports index {}",
                    index,
                    vertex.index()
                )));
            }
        }
        let missing = |index: &i32| !self.vertices.contains_key(index);
        for root in &self.roots {
            if missing(root) {
                return Err(TermstoreError::MalformedGraph(format!(
                    "root {} is not a vertex",
                    root
                )));
            }
        }
        for (label, map) in [
            ("successor", &self.successors),
            ("predecessor", &self.predecessors),
        ] {
            for (from, targets) in map {
                if missing(from) {
                    return Err(TermstoreError::MalformedGraph(format!(
                        "{} map key {} is not a vertex",
                        label, from
                    )));
                }
                if let Some(target) = targets.iter().find(|target| missing(target)) {
                    return Err(TermstoreError::MalformedGraph(format!(
                        "{} of {} references unknown vertex {}",
                        label, from, target
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<V: GraphVertex> Marshal for DiGraph<V> {
    const RECORD_NAME: &'static str = "DiGraph";
    const MARSHAL_VERSION: i32 = 3;

    fn marshal(&self, out: &mut BinaryWriter) {
        out.put_len(self.vertices.len());
        for vertex in self.vertices.values() {
            out.put_record(vertex);
        }
        out.put_int_list_map(&self.successors);
        out.put_int_list(&self.roots);
        out.put_int_list_map(&self.predecessors);
    }

    fn unmarshal(input: &mut BinaryReader<'_>) -> Result<Self, TermstoreError> {
        let vertex_count = input.get_len()?;
        let mut vertices = BTreeMap::new();
        for _ in 0..vertex_count {
            let vertex: V = input.get_record()?;
            if vertices.insert(vertex.index(), vertex).is_some() {
                return Err(TermstoreError::MalformedGraph(
                    "duplicate vertex index".to_string(),
                ));
            }
        }
        let successors = input.get_int_list_map()?;
        let roots = input.get_int_list()?;
        let predecessors = input.get_int_list_map()?;

        let graph = Self {
            vertices,
            successors,
            predecessors,
            roots,
        };
        graph.validate()?;
        Ok(graph)
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Additive builder for [`DiGraph`].
///
/// Errors (unknown parent, conflicting payloads) are reported by `build()`.
#[derive(Debug, Clone)]
pub struct DiGraphBuilder<V> {
    vertices: BTreeMap<i32, V>,
    successors: BTreeMap<i32, Vec<i32>>,
    predecessors: BTreeMap<i32, Vec<i32>>,
    roots: Vec<i32>,
    conflicts: Vec<i32>,
}

impl<V: GraphVertex> Default for DiGraphBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: GraphVertex> DiGraphBuilder<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertices: BTreeMap::new(),
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
            roots: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    fn register(&mut self, vertex: V) -> i32 {
        let index = vertex.index();
        match self.vertices.get(&index) {
            Some(existing) if *existing != vertex => self.conflicts.push(index),
            Some(_) => {}
            None => {
                self.vertices.insert(index, vertex);
            }
        }
        index
    }

    /// Register a root (a vertex with no predecessor).
    pub fn add_root(&mut self, root: V) -> &mut Self {
        let index = self.register(root);
        if !self.roots.contains(&index) {
            self.roots.push(index);
        }
        self
    }

    /// Register `child` and the edge `parent -> child`.
    pub fn add(&mut self, child: V, parent: i32) -> &mut Self {
        let child_index = self.register(child);
        self.successors.entry(parent).or_default().push(child_index);
        self.predecessors
            .entry(child_index)
            .or_default()
            .push(parent);
        self
    }

    /// Freeze into an immutable graph.
    pub fn build(&self) -> Result<DiGraph<V>, TermstoreError> {
        if let Some(index) = self.conflicts.first() {
            return Err(TermstoreError::MalformedGraph(format!(
                "vertex {} registered with two different payloads",
                index
            )));
        }
        if let Some(index) = self.vertices.keys().find(|index| **index < 0) {
            return Err(TermstoreError::MalformedGraph(format!(
                "negative vertex index {}",
                index
            )));
        }
        let graph = DiGraph {
            vertices: self.vertices.clone(),
            successors: self.successors.clone(),
            predecessors: self.predecessors.clone(),
            roots: self.roots.clone(),
        };
        graph.validate()?;
        Ok(graph)
    }
}

// =============================================================================
// TESTS
// =============================================================================
