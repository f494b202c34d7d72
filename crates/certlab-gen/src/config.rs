//! Generator configuration and its validation.

use std::collections::BTreeMap;

use certlab_kernel::{sha256_hex_bytes, Graph};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::GenerateError;

/// Random graph model with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case", deny_unknown_fields)]
pub enum GraphModel {
    /// Erdős–Rényi `G(n, p)`.
    Gnp { edge_probability: f64 },
    /// Erdős–Rényi `G(n, m)`.
    Gnm { edges: u64 },
    /// `G(n, p)` plus a clique on `clique_size` uniformly chosen vertices.
    PlantedClique {
        edge_probability: f64,
        clique_size: u32,
    },
}

impl GraphModel {
    pub fn name(&self) -> &'static str {
        match self {
            GraphModel::Gnp { .. } => "gnp",
            GraphModel::Gnm { .. } => "gnm",
            GraphModel::PlantedClique { .. } => "planted_clique",
        }
    }

    /// Parameters recorded in each instance's provenance.
    pub fn parameters(&self, vertices: u32) -> BTreeMap<String, Value> {
        let mut parameters = BTreeMap::new();
        parameters.insert("vertices".to_string(), json!(vertices));
        match self {
            GraphModel::Gnp { edge_probability } => {
                parameters.insert("edge_probability".to_string(), json!(edge_probability));
            }
            GraphModel::Gnm { edges } => {
                parameters.insert("edges".to_string(), json!(edges));
            }
            GraphModel::PlantedClique {
                edge_probability,
                clique_size,
            } => {
                parameters.insert("edge_probability".to_string(), json!(edge_probability));
                parameters.insert("clique_size".to_string(), json!(clique_size));
            }
        }
        parameters
    }
}

/// Hex digits of the parameter digest kept in instance ids.
const PARAMETER_DIGEST_LEN: usize = 8;

/// Everything that determines a generated batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Number of instances in the batch.
    pub count: u32,
    /// Vertices per generated graph.
    pub vertices: u32,
    pub seed: u64,
    pub model: GraphModel,
    /// Timestamp written into every record of the batch.
    pub created_at: DateTime<Utc>,
}

impl GeneratorConfig {
    pub fn from_json(text: &str) -> Result<Self, GenerateError> {
        serde_json::from_str(text).map_err(|e| {
            GenerateError::InvalidConfiguration(format!("cannot parse configuration: {e}"))
        })
    }

    /// Stem shared by every instance id of the batch:
    /// `{model}-n{vertices}-p{digest}-s{seed}`.
    ///
    /// `digest` is a short SHA-256 prefix of the canonical JSON of
    /// [`GraphModel::parameters`], so two batches that differ in any
    /// generating setting never share ids. `created_at` and `count` are left
    /// out: the same graphs stamped at another time are a conflict, and a
    /// longer batch extends a shorter one.
    pub fn id_prefix(&self) -> String {
        let parameters: Map<String, Value> =
            self.model.parameters(self.vertices).into_iter().collect();
        let digest = sha256_hex_bytes(Value::Object(parameters).to_string().as_bytes());
        format!(
            "{}-n{}-p{}-s{}",
            self.model.name(),
            self.vertices,
            &digest[..PARAMETER_DIGEST_LEN],
            self.seed
        )
    }

    /// Reject configurations that cannot produce a well-defined batch.
    pub fn validate(&self) -> Result<(), GenerateError> {
        let invalid = |reason: String| Err(GenerateError::InvalidConfiguration(reason));
        if self.count == 0 {
            return invalid("count must be at least 1".into());
        }
        if self.vertices == 0 {
            return invalid("vertices must be at least 1".into());
        }
        match &self.model {
            GraphModel::Gnp { edge_probability } => check_probability(*edge_probability)?,
            GraphModel::Gnm { edges } => {
                let max = Graph::max_edges(self.vertices);
                if *edges > max {
                    return invalid(format!(
                        "gnm asks for {edges} edges but {} vertices allow at most {max}",
                        self.vertices
                    ));
                }
            }
            GraphModel::PlantedClique {
                edge_probability,
                clique_size,
            } => {
                check_probability(*edge_probability)?;
                if *clique_size == 0 || *clique_size > self.vertices {
                    return invalid(format!(
                        "clique_size must be in 1..={}, got {clique_size}",
                        self.vertices
                    ));
                }
            }
        }
        Ok(())
    }
}

fn check_probability(p: f64) -> Result<(), GenerateError> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(GenerateError::InvalidConfiguration(format!(
            "edge_probability must be a finite number in [0, 1], got {p}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config(model: GraphModel) -> GeneratorConfig {
        GeneratorConfig {
            count: 2,
            vertices: 5,
            seed: 1,
            model,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn rejection(config: &GeneratorConfig) -> String {
        match config.validate() {
            Err(GenerateError::InvalidConfiguration(reason)) => reason,
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn accepts_boundary_values() {
        config(GraphModel::Gnp { edge_probability: 0.0 }).validate().unwrap();
        config(GraphModel::Gnp { edge_probability: 1.0 }).validate().unwrap();
        config(GraphModel::Gnm { edges: 10 }).validate().unwrap();
        config(GraphModel::PlantedClique {
            edge_probability: 0.5,
            clique_size: 5,
        })
        .validate()
        .unwrap();
    }

    #[test]
    fn rejects_empty_batches_and_graphs() {
        let mut c = config(GraphModel::Gnm { edges: 0 });
        c.count = 0;
        assert!(rejection(&c).contains("count"));
        let mut c = config(GraphModel::Gnm { edges: 0 });
        c.vertices = 0;
        assert!(rejection(&c).contains("vertices"));
    }

    #[test]
    fn rejects_bad_model_parameters() {
        for p in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            let reason = rejection(&config(GraphModel::Gnp { edge_probability: p }));
            assert!(reason.contains("edge_probability"), "{reason}");
        }
        assert!(rejection(&config(GraphModel::Gnm { edges: 11 })).contains("at most 10"));
        for clique_size in [0, 6] {
            let reason = rejection(&config(GraphModel::PlantedClique {
                edge_probability: 0.5,
                clique_size,
            }));
            assert!(reason.contains("clique_size"), "{reason}");
        }
    }

    #[test]
    fn json_configuration_uses_tagged_models() {
        let parsed = GeneratorConfig::from_json(
            r#"{"count":3,"vertices":4,"seed":42,
                "model":{"name":"planted_clique","edge_probability":0.25,"clique_size":3},
                "created_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.model,
            GraphModel::PlantedClique {
                edge_probability: 0.25,
                clique_size: 3
            }
        );
        let err = GeneratorConfig::from_json(
            r#"{"count":3,"vertices":4,"seed":42,"model":{"name":"gnm","edges":1},
                "created_at":"2024-01-01T00:00:00Z","extra":true}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidConfiguration(_)));
    }

    #[test]
    fn id_prefix_separates_generating_settings() {
        let base = config(GraphModel::Gnp { edge_probability: 0.5 });
        let prefix = base.id_prefix();
        assert!(prefix.starts_with("gnp-n5-p"), "{prefix}");
        assert!(prefix.ends_with("-s1"), "{prefix}");
        assert_eq!(prefix.len(), "gnp-n5-p".len() + PARAMETER_DIGEST_LEN + "-s1".len());

        let mut later = base.clone();
        later.created_at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        later.count = 9;
        assert_eq!(later.id_prefix(), prefix);

        let mut wider = base.clone();
        wider.vertices = 6;
        let denser = config(GraphModel::Gnp { edge_probability: 0.2 });
        let planted = config(GraphModel::PlantedClique {
            edge_probability: 0.5,
            clique_size: 3,
        });
        for other in [wider, denser, planted] {
            assert_ne!(other.id_prefix(), prefix);
        }
    }

    #[test]
    fn provenance_parameters_include_model_settings() {
        let params = GraphModel::PlantedClique {
            edge_probability: 0.5,
            clique_size: 3,
        }
        .parameters(8);
        assert_eq!(params["vertices"], json!(8));
        assert_eq!(params["clique_size"], json!(3));
        assert_eq!(params["edge_probability"], json!(0.5));
    }
}
