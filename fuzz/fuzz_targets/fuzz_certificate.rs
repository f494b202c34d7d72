#![no_main]
use std::collections::BTreeMap;

use certlab_kernel::{check, Certificate, GeneratorInfo, Graph, Instance, InstanceId, Payload};
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

fn house() -> Instance {
    let graph = Graph::from_edges(5, [(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (0, 2)])
        .expect("static graph is canonical");
    Instance::new(
        InstanceId::parse("fuzz").expect("static id is valid"),
        0,
        0,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        GeneratorInfo {
            tool: "fuzz".into(),
            version: "0".into(),
            model: "house".into(),
            parameters: BTreeMap::new(),
        },
        Payload::Graph(graph),
    )
}

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Decoding and checking must never panic, whatever the witness holds.
        if let Ok(mut certificate) = Certificate::from_json(s) {
            let _ = certificate.sha256();
            certificate.instance_id = InstanceId::parse("fuzz").unwrap();
            let _ = check(&house(), &certificate);
        }
        let _ = Certificate::from_jsonl(s);
    }
});
