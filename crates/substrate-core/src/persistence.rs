//! Snapshot persistence (§6).
//!
//! Two flat binary files, `nodes.bin` and `edges.bin`, written with
//! `bincode` every `snapshot_period` ticks. The arena's free slots are
//! preserved as `None` entries rather than compacted away: an edge's
//! `src`/`dst` are arena slot indices, not a separately stable id, so a
//! reload must reproduce the exact slot layout it saved.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::error::SubstrateError;
use crate::graph::GraphStore;
use crate::node::Node;

/// On-disk layout of `nodes.bin`.
#[derive(Debug, Serialize, Deserialize)]
struct NodeFile {
	count: u32,
	next_id: u32,
	records: Vec<Option<Node>>,
}

/// On-disk layout of `edges.bin`.
#[derive(Debug, Serialize, Deserialize)]
struct EdgeFile {
	count: u32,
	records: Vec<Option<Edge>>,
}

fn io_fail(context: &str, err: impl std::fmt::Display) -> SubstrateError {
	SubstrateError::PersistenceFailed(format!("{context}: {err}"))
}

/// Write both snapshot files into `dir`, creating it if necessary.
///
/// # Errors
///
/// Returns [`SubstrateError::PersistenceFailed`] if the directory cannot
/// be created or either file cannot be written.
pub fn save(dir: &Path, graph: &GraphStore) -> Result<(), SubstrateError> {
	fs::create_dir_all(dir).map_err(|e| io_fail("creating snapshot directory", e))?;

	let node_file = NodeFile {
		count: graph.node_count(),
		next_id: graph.next_id(),
		records: graph.nodes_raw().to_vec(),
	};
	let edge_file = EdgeFile {
		count: graph.edge_count(),
		records: graph.edges_raw().to_vec(),
	};

	let node_bytes = bincode::serialize(&node_file).map_err(|e| io_fail("encoding nodes.bin", e))?;
	let edge_bytes = bincode::serialize(&edge_file).map_err(|e| io_fail("encoding edges.bin", e))?;

	fs::write(dir.join("nodes.bin"), node_bytes).map_err(|e| io_fail("writing nodes.bin", e))?;
	fs::write(dir.join("edges.bin"), edge_bytes).map_err(|e| io_fail("writing edges.bin", e))?;
	Ok(())
}

/// Load both snapshot files from `dir` into `graph`, replacing its
/// current contents wholesale.
///
/// # Errors
///
/// Returns [`SubstrateError::PersistenceFailed`] if either file is
/// missing or does not decode.
pub fn load(dir: &Path, graph: &mut GraphStore) -> Result<(), SubstrateError> {
	let node_bytes = fs::read(dir.join("nodes.bin")).map_err(|e| io_fail("reading nodes.bin", e))?;
	let edge_bytes = fs::read(dir.join("edges.bin")).map_err(|e| io_fail("reading edges.bin", e))?;

	let node_file: NodeFile = bincode::deserialize(&node_bytes).map_err(|e| io_fail("decoding nodes.bin", e))?;
	let edge_file: EdgeFile = bincode::deserialize(&edge_bytes).map_err(|e| io_fail("decoding edges.bin", e))?;

	graph.load_nodes(node_file.records);
	graph.set_next_id(node_file.next_id);
	graph.load_edges(edge_file.records);

	debug_assert_eq!(graph.node_count(), node_file.count);
	debug_assert_eq!(graph.edge_count(), edge_file.count);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trip_preserves_graph_shape() {
		let dir = std::env::temp_dir().join(format!("substrate-persistence-test-{}", std::process::id()));
		let mut g = GraphStore::new(8, 8);
		let a = g.create_node().unwrap();
		let b = g.create_node().unwrap();
		let c = g.create_node().unwrap();
		g.delete_node(b);
		let e = g.create_edge(a, c).unwrap();
		g.edge_mut(e).unwrap().w_fast = 200;

		save(&dir, &g).unwrap();

		let mut loaded = GraphStore::new(8, 8);
		load(&dir, &mut loaded).unwrap();

		assert_eq!(loaded.node_count(), g.node_count());
		assert_eq!(loaded.edge_count(), g.edge_count());
		assert_eq!(loaded.next_id(), g.next_id());
		assert_eq!(loaded.find_edge(a, c), g.find_edge(a, c));
		assert_eq!(loaded.edge(e).unwrap().w_fast, 200);
		assert!(loaded.node(b).is_none());

		fs::remove_dir_all(&dir).ok();
	}

	#[test]
	fn loading_missing_snapshot_fails_without_panicking() {
		let dir = std::env::temp_dir().join("substrate-persistence-missing-dir-that-does-not-exist");
		let mut g = GraphStore::new(4, 4);
		assert!(load(&dir, &mut g).is_err());
	}
}
