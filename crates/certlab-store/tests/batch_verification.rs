use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use certlab_kernel::{
    Certificate, ClaimType, GeneratorInfo, Graph, Instance, InstanceId, Payload, VerifyError,
};
use certlab_store::{verify_batch, CheckError, DirStore, InstanceStore, MemoryStore};
use chrono::{TimeZone, Utc};
use serde_json::json;

fn tmp_dir(prefix: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be monotonic enough for tests")
        .as_nanos();
    path.push(format!("{}_{}_{}", prefix, std::process::id(), nanos));
    path
}

/// Path graph 0-1-...-(n-1).
fn path_instance(index: u32, n: u32) -> Instance {
    Instance::new(
        InstanceId::parse(&format!("path-s0-{index:04}")).unwrap(),
        0,
        index,
        Utc.with_ymd_and_hms(2024, 4, 4, 0, 0, 0).unwrap(),
        GeneratorInfo {
            tool: "test".into(),
            version: "0".into(),
            model: "path".into(),
            parameters: BTreeMap::new(),
        },
        Payload::Graph(Graph::from_edges(n, (1..n).map(|v| (v - 1, v))).unwrap()),
    )
}

fn edge_cert(index: u32, edge: [u32; 2]) -> Certificate {
    Certificate::new(
        InstanceId::parse(&format!("path-s0-{index:04}")).unwrap(),
        ClaimType::HasEdge,
        None,
        json!({ "edge": edge }),
    )
}

#[test]
fn batch_results_follow_input_order_for_any_worker_count() {
    let mut store = MemoryStore::new();
    for index in 0..6 {
        store.put(&path_instance(index, 5)).unwrap();
    }
    let certificates: Vec<Certificate> = (0..24)
        .map(|i| {
            let index = i % 6;
            if i % 3 == 0 {
                edge_cert(index, [0, 4])
            } else {
                edge_cert(index, [1, 2])
            }
        })
        .collect();

    let sequential = verify_batch(&store, &certificates, 1);
    for workers in [2, 4, 7, 64] {
        let parallel = verify_batch(&store, &certificates, workers);
        assert_eq!(parallel.len(), certificates.len());
        for (i, (a, b)) in sequential.iter().zip(&parallel).enumerate() {
            let a = a.as_ref().unwrap();
            let b = b.as_ref().unwrap();
            assert_eq!(a.instance_id, b.instance_id, "certificate {i}");
            assert_eq!(a.verdict, b.verdict, "certificate {i}");
            assert_eq!(a.verdict, i % 3 != 0, "certificate {i}");
        }
    }
}

#[test]
fn missing_instances_fail_individually() {
    let root = tmp_dir("certlab_batch_missing");
    let mut store = DirStore::create(&root).unwrap();
    store.put(&path_instance(0, 3)).unwrap();
    let certificates = vec![
        edge_cert(0, [0, 1]),
        edge_cert(9, [0, 1]),
        edge_cert(0, [1, 2]),
    ];
    let results = verify_batch(&store, &certificates, 3);
    assert!(results[0].as_ref().unwrap().verdict);
    assert!(matches!(
        results[1],
        Err(CheckError::Verify(VerifyError::InstanceNotFound { ref id })) if id == "path-s0-0009"
    ));
    assert!(results[2].as_ref().unwrap().verdict);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn empty_batch_is_empty() {
    let store = MemoryStore::new();
    assert!(verify_batch(&store, &[], 0).is_empty());
}
