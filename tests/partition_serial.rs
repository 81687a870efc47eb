use mesh_partition::document::Node;
use mesh_partition::mesh_error::MeshError;
use mesh_partition::mesh_generation::tiled;
use mesh_partition::partitioning::{
    Chunk, LargestSelection, Partitioner, PartitionerConfig, SerialPartitioner,
};

/// A line mesh with `n` elements.
fn lines(n: usize) -> Node {
    let mut m = Node::new();
    m.set(
        "coordsets/coords/values/x",
        (0..=n).map(|i| i as f64).collect::<Vec<_>>(),
    );
    m.set("coordsets/coords/type", "explicit");
    m.set("topologies/mesh/type", "unstructured");
    m.set("topologies/mesh/coordset", "coords");
    m.set("topologies/mesh/elements/shape", "line");
    m.set(
        "topologies/mesh/elements/connectivity",
        (0..n as i64).flat_map(|i| [i, i + 1]).collect::<Vec<_>>(),
    );
    m
}

#[test]
fn greedy_assignment_in_global_order() {
    let meshes: Vec<Node> = [7, 3, 5, 5, 1].into_iter().map(lines).collect();
    let chunks: Vec<_> = meshes.iter().map(Chunk::borrowed).collect();
    let p = SerialPartitioner::new();
    let map = p.map_chunks(&chunks, 2).unwrap();
    assert_eq!(map.dest_domain, vec![0, 1, 1, 0, 1]);
    assert_eq!(map.dest_rank, vec![0; 5]);
    assert_eq!(map.offsets, vec![0]);
    assert_eq!(map.counts, vec![5]);
    assert_eq!(map.domain_count(), 2);
}

#[test]
fn redistribute_owns_every_result() {
    let meshes: Vec<Node> = [4, 2, 6].into_iter().map(lines).collect();
    let chunks: Vec<_> = meshes.iter().map(Chunk::borrowed).collect();
    let out = SerialPartitioner::new().redistribute(&chunks, 3).unwrap();
    assert_eq!(out.len(), 3);
    assert_eq!(out.domains, vec![0, 1, 2]);
    assert_eq!(out.domain_ids(), vec![0, 1, 2]);
    for (chunk, domain) in out.chunks.iter().zip(&out.domains) {
        assert!(chunk.owns_mesh());
        assert_eq!(chunk.destination_rank, 0);
        assert_eq!(chunk.destination_domain, *domain);
    }
    // inputs keep their own state
    assert!(meshes.iter().all(|m| !m.has_path("state")));
    let a = meshes[2].array_at("topologies/mesh/elements/connectivity").unwrap();
    let b = out.chunks[2]
        .mesh()
        .array_at("topologies/mesh/elements/connectivity")
        .unwrap();
    assert!(a.shares_storage(b));
}

#[test]
fn more_domains_than_chunks_leaves_empty_domains() {
    let meshes = [lines(3)];
    let chunks: Vec<_> = meshes.iter().map(Chunk::borrowed).collect();
    let map = SerialPartitioner::new().map_chunks(&chunks, 4).unwrap();
    assert_eq!(map.dest_domain, vec![0]);
}

#[test]
fn pinned_chunks_pass_through() {
    let meshes: Vec<Node> = [2, 2, 2].into_iter().map(lines).collect();
    let chunks: Vec<_> = meshes
        .iter()
        .zip([3, 3, 1])
        .map(|(m, d)| Chunk::borrowed(m).with_destination(0, d))
        .collect();
    let p = SerialPartitioner::new();
    // two unique domains against a target of 5 is only a warning
    let map = p.map_chunks(&chunks, 5).unwrap();
    assert_eq!(map.dest_domain, vec![3, 3, 1]);
    let out = p.communicate_chunks(&chunks, &map).unwrap();
    assert_eq!(out.domains, vec![3, 3, 1]);
    assert_eq!(out.domain_ids(), vec![0, 1, 2]);
}

#[test]
fn mixed_destinations_rejected() {
    let meshes = [lines(1), lines(1)];
    let chunks = vec![
        Chunk::borrowed(&meshes[0]).with_destination(0, 0),
        Chunk::borrowed(&meshes[1]),
    ];
    assert!(matches!(
        SerialPartitioner::new().map_chunks(&chunks, 1),
        Err(MeshError::MixedDestinations { pinned: 1, free: 1 })
    ));
}

#[test]
fn pinned_rank_outside_world_rejected() {
    let meshes = [lines(1)];
    let chunks = vec![Chunk::borrowed(&meshes[0]).with_destination(1, 0)];
    assert!(matches!(
        SerialPartitioner::new().map_chunks(&chunks, 1),
        Err(MeshError::InvalidDestination { chunk: 0, rank: 1, size: 1 })
    ));
}

#[test]
fn zero_target_with_free_chunks_rejected() {
    let meshes = [lines(1)];
    let chunks = vec![Chunk::borrowed(&meshes[0])];
    assert!(matches!(
        SerialPartitioner::new().map_chunks(&chunks, 0),
        Err(MeshError::InvalidTarget)
    ));
}

#[test]
fn no_chunks_is_an_empty_map() {
    let p = SerialPartitioner::new();
    let map = p.map_chunks(&[], 3).unwrap();
    assert!(map.is_empty());
    assert!(p.communicate_chunks(&[], &map).unwrap().is_empty());
}

#[test]
fn unknown_topology_type_is_reported() {
    let mut m = lines(2);
    m.set("topologies/other/type", "polyhedral-soup");
    let chunks = vec![Chunk::borrowed(&m)];
    assert!(matches!(
        SerialPartitioner::new().map_chunks(&chunks, 1),
        Err(MeshError::UnsupportedTopology(t)) if t == "polyhedral-soup"
    ));
}

#[test]
fn selection_coordination() {
    let p = SerialPartitioner::new();
    assert_eq!(p.total_selections(&[5u64, 8, 8]).unwrap(), 3);
    assert_eq!(
        p.largest_selection(&[5u64, 8, 8]).unwrap(),
        LargestSelection { rank: 0, index: Some(1) }
    );
    assert_eq!(p.total_selections::<u64>(&[]).unwrap(), 0);
    assert_eq!(p.largest_selection::<u64>(&[]).unwrap().index, None);
}

#[test]
fn target_agreement_is_local() {
    let p = SerialPartitioner::new();
    assert_eq!(p.agree_target(Some(4)).unwrap(), Some(4));
    assert_eq!(p.agree_target(None).unwrap(), None);
    let cfg = PartitionerConfig::from_node(&Node::from_json(r#"{"target": -2}"#).unwrap());
    assert_eq!(p.agree_target(cfg.target).unwrap(), None);
}

#[test]
fn tiled_meshes_split_by_element_count() {
    let big = tiled(2, 2, 0, &Node::new()).unwrap();
    let small = tiled(1, 1, 0, &Node::new()).unwrap();
    let meshes = [big, small.clone(), small.clone(), small];
    let chunks: Vec<_> = meshes.iter().map(Chunk::borrowed).collect();
    // 128, 40, 40, 40 elements counting the boundary topologies
    let map = SerialPartitioner::new().map_chunks(&chunks, 2).unwrap();
    assert_eq!(map.dest_domain, vec![0, 1, 1, 1]);
}
