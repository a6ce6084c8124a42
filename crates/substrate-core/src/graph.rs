//! Graph store: node/edge arenas with free-list reuse (§4.1).
//!
//! Nodes and edges are never referenced outside this store's lifetime;
//! everything outside sees them only by [`NodeId`]/[`EdgeId`] slot index.
//! A free slot is represented as `None` in the backing `Vec`, an
//! adjacency-list-building style kept mutable and indexed by stable slot
//! rather than rebuilt per call.

use std::collections::HashMap;

use crate::edge::{Edge, EdgeId};
use crate::error::{ArenaKind, SubstrateError};
use crate::node::{Node, NodeId};

/// Owns the node and edge arenas plus their free lists.
#[derive(Debug)]
pub struct GraphStore {
	nodes: Vec<Option<Node>>,
	edges: Vec<Option<Edge>>,
	free_nodes: Vec<NodeId>,
	free_edges: Vec<EdgeId>,
	/// `(src, dst) -> edge slot`, the secondary index `find_edge` uses
	/// instead of a linear scan.
	edge_index: HashMap<(NodeId, NodeId), EdgeId>,
	next_id: u32,
	node_cap: u32,
	edge_cap: u32,
	live_nodes: u32,
	live_edges: u32,
}

impl GraphStore {
	/// Create an empty store with the given hard capacities.
	#[must_use]
	pub fn new(node_cap: u32, edge_cap: u32) -> Self {
		Self {
			nodes: Vec::new(),
			edges: Vec::new(),
			free_nodes: Vec::new(),
			free_edges: Vec::new(),
			edge_index: HashMap::new(),
			next_id: 0,
			node_cap,
			edge_cap,
			live_nodes: 0,
			live_edges: 0,
		}
	}

	/// Number of currently live nodes.
	#[must_use]
	pub fn node_count(&self) -> u32 {
		self.live_nodes
	}

	/// Number of currently live edges.
	#[must_use]
	pub fn edge_count(&self) -> u32 {
		self.live_edges
	}

	/// Configured node capacity.
	#[must_use]
	pub fn node_cap(&self) -> u32 {
		self.node_cap
	}

	/// Configured edge capacity.
	#[must_use]
	pub fn edge_cap(&self) -> u32 {
		self.edge_cap
	}

	/// Next stable id that would be assigned by `create_node`, without
	/// consuming it. Used by the persistence layer to round-trip the
	/// counter.
	#[must_use]
	pub fn next_id(&self) -> u32 {
		self.next_id
	}

	/// Restore the next-id counter (used when loading a snapshot).
	pub fn set_next_id(&mut self, next_id: u32) {
		self.next_id = next_id;
	}

	/// Allocate a node from the free list or extend the arena.
	///
	/// # Errors
	///
	/// Returns [`SubstrateError::CapacityExhausted`] if the arena is full.
	pub fn create_node(&mut self) -> Result<NodeId, SubstrateError> {
		if self.live_nodes >= self.node_cap {
			return Err(SubstrateError::CapacityExhausted {
				kind: ArenaKind::Node,
				live: self.live_nodes,
				cap: self.node_cap,
			});
		}
		let id = self.next_id;
		self.next_id += 1;
		let node = Node::new(id);
		let slot = if let Some(slot) = self.free_nodes.pop() {
			self.nodes[slot as usize] = Some(node);
			slot
		} else {
			let slot = self.nodes.len() as u32;
			self.nodes.push(Some(node));
			slot
		};
		self.live_nodes += 1;
		Ok(slot)
	}

	/// Free a node slot. The caller must ensure no edge still references
	/// it. Idempotent: freeing an already-free slot is a no-op.
	pub fn delete_node(&mut self, idx: NodeId) {
		if let Some(slot) = self.nodes.get_mut(idx as usize) {
			if slot.take().is_some() {
				self.live_nodes -= 1;
				self.free_nodes.push(idx);
			}
		}
	}

	/// Borrow a live node, if the slot is occupied.
	#[must_use]
	pub fn node(&self, idx: NodeId) -> Option<&Node> {
		self.nodes.get(idx as usize)?.as_ref()
	}

	/// Mutably borrow a live node, if the slot is occupied.
	#[must_use]
	pub fn node_mut(&mut self, idx: NodeId) -> Option<&mut Node> {
		self.nodes.get_mut(idx as usize)?.as_mut()
	}

	/// Iterate over live `(slot, node)` pairs.
	pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
		self.nodes
			.iter()
			.enumerate()
			.filter_map(|(i, slot)| slot.as_ref().map(|n| (i as u32, n)))
	}

	/// Iterate over live node slot indices only.
	pub fn iter_node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
		self.nodes
			.iter()
			.enumerate()
			.filter_map(|(i, slot)| slot.as_ref().map(|_| i as u32))
	}

	/// Allocate an edge from the free list or extend the arena, updating
	/// both endpoints' degree counters.
	///
	/// # Errors
	///
	/// Returns [`SubstrateError::CapacityExhausted`] if the arena is full.
	pub fn create_edge(&mut self, src: NodeId, dst: NodeId) -> Result<EdgeId, SubstrateError> {
		if self.live_edges >= self.edge_cap {
			return Err(SubstrateError::CapacityExhausted {
				kind: ArenaKind::Edge,
				live: self.live_edges,
				cap: self.edge_cap,
			});
		}
		let edge = Edge::new(src, dst);
		let slot = if let Some(slot) = self.free_edges.pop() {
			self.edges[slot as usize] = Some(edge);
			slot
		} else {
			let slot = self.edges.len() as u32;
			self.edges.push(Some(edge));
			slot
		};
		self.live_edges += 1;
		self.edge_index.insert((src, dst), slot);
		if let Some(n) = self.node_mut(src) {
			n.out_deg += 1;
		}
		if let Some(n) = self.node_mut(dst) {
			n.in_deg += 1;
		}
		Ok(slot)
	}

	/// Free an edge slot, decrementing both endpoints' degree counters.
	pub fn delete_edge(&mut self, idx: EdgeId) {
		let Some(slot) = self.edges.get_mut(idx as usize) else {
			return;
		};
		let Some(edge) = slot.take() else {
			return;
		};
		self.live_edges -= 1;
		self.free_edges.push(idx);
		self.edge_index.remove(&(edge.src, edge.dst));
		if let Some(n) = self.node_mut(edge.src) {
			n.out_deg = n.out_deg.saturating_sub(1);
		}
		if let Some(n) = self.node_mut(edge.dst) {
			n.in_deg = n.in_deg.saturating_sub(1);
		}
	}

	/// Borrow a live edge, if the slot is occupied.
	#[must_use]
	pub fn edge(&self, idx: EdgeId) -> Option<&Edge> {
		self.edges.get(idx as usize)?.as_ref()
	}

	/// Mutably borrow a live edge, if the slot is occupied.
	#[must_use]
	pub fn edge_mut(&mut self, idx: EdgeId) -> Option<&mut Edge> {
		self.edges.get_mut(idx as usize)?.as_mut()
	}

	/// Find any edge `src -> dst` via the secondary index.
	#[must_use]
	pub fn find_edge(&self, src: NodeId, dst: NodeId) -> Option<EdgeId> {
		self.edge_index.get(&(src, dst)).copied()
	}

	/// Iterate over live `(slot, edge)` pairs.
	pub fn iter_edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
		self.edges
			.iter()
			.enumerate()
			.filter_map(|(i, slot)| slot.as_ref().map(|e| (i as u32, e)))
	}

	/// Slot indices of every live edge, snapshotted up front so callers may
	/// mutate nodes/edges while iterating the list.
	#[must_use]
	pub fn live_edge_ids(&self) -> Vec<EdgeId> {
		self.iter_edges().map(|(id, _)| id).collect()
	}

	/// Slot indices of every live node, snapshotted up front for the same
	/// reason as [`Self::live_edge_ids`].
	#[must_use]
	pub fn live_node_ids(&self) -> Vec<NodeId> {
		self.iter_node_ids().collect()
	}

	/// Rebuild the `(src, dst) -> slot` index from scratch. Used after
	/// loading a snapshot, where edges are inserted directly rather than
	/// through `create_edge`.
	pub(crate) fn rebuild_edge_index(&mut self) {
		self.edge_index.clear();
		for (id, edge) in self.iter_edges() {
			self.edge_index.insert((edge.src, edge.dst), id);
		}
	}

	/// Raw access to the node slots, for the persistence layer.
	pub(crate) fn nodes_raw(&self) -> &[Option<Node>] {
		&self.nodes
	}

	/// Raw access to the edge slots, for the persistence layer.
	pub(crate) fn edges_raw(&self) -> &[Option<Edge>] {
		&self.edges
	}

	/// Replace the node arena wholesale (snapshot load).
	pub(crate) fn load_nodes(&mut self, nodes: Vec<Option<Node>>) {
		self.live_nodes = nodes.iter().filter(|n| n.is_some()).count() as u32;
		self.free_nodes = nodes
			.iter()
			.enumerate()
			.filter_map(|(i, n)| n.is_none().then_some(i as u32))
			.collect();
		self.nodes = nodes;
	}

	/// Replace the edge arena wholesale (snapshot load).
	pub(crate) fn load_edges(&mut self, edges: Vec<Option<Edge>>) {
		self.live_edges = edges.iter().filter(|e| e.is_some()).count() as u32;
		self.free_edges = edges
			.iter()
			.enumerate()
			.filter_map(|(i, e)| e.is_none().then_some(i as u32))
			.collect();
		self.edges = edges;
		self.rebuild_edge_index();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn create_and_delete_node_returns_slot_to_free_list() {
		let mut g = GraphStore::new(8, 32);
		let a = g.create_node().unwrap();
		assert_eq!(g.node_count(), 1);
		g.delete_node(a);
		assert_eq!(g.node_count(), 0);
		let b = g.create_node().unwrap();
		assert_eq!(a, b, "freed slot should be reused");
	}

	#[test]
	fn node_capacity_is_enforced() {
		let mut g = GraphStore::new(1, 32);
		g.create_node().unwrap();
		assert!(g.create_node().is_err());
	}

	#[test]
	fn create_edge_updates_degrees_and_index() {
		let mut g = GraphStore::new(8, 32);
		let a = g.create_node().unwrap();
		let b = g.create_node().unwrap();
		let e = g.create_edge(a, b).unwrap();
		assert_eq!(g.node(a).unwrap().out_deg, 1);
		assert_eq!(g.node(b).unwrap().in_deg, 1);
		assert_eq!(g.find_edge(a, b), Some(e));
	}

	#[test]
	fn delete_edge_restores_pre_call_counts_and_degrees() {
		let mut g = GraphStore::new(8, 32);
		let a = g.create_node().unwrap();
		let b = g.create_node().unwrap();
		let before_edges = g.edge_count();
		let e = g.create_edge(a, b).unwrap();
		g.delete_edge(e);
		assert_eq!(g.edge_count(), before_edges);
		assert_eq!(g.node(a).unwrap().out_deg, 0);
		assert_eq!(g.node(b).unwrap().in_deg, 0);
		assert_eq!(g.find_edge(a, b), None);
	}

	#[test]
	fn delete_node_is_idempotent() {
		let mut g = GraphStore::new(8, 32);
		let a = g.create_node().unwrap();
		g.delete_node(a);
		g.delete_node(a);
		assert_eq!(g.node_count(), 0);
	}

	#[test]
	fn edge_capacity_is_enforced() {
		let mut g = GraphStore::new(8, 1);
		let a = g.create_node().unwrap();
		let b = g.create_node().unwrap();
		let c = g.create_node().unwrap();
		g.create_edge(a, b).unwrap();
		assert!(g.create_edge(b, c).is_err());
	}
}
