use std::collections::HashMap;
use std::fmt::Write as _;

use crate::{ComputationGraph, OperatorNode, Tensor};

/// Operator set a model draws its nodes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpsetImport {
    /// Empty for the default ONNX domain
    pub domain: String,
    pub version: i64,
}

impl Default for OpsetImport {
    fn default() -> Self {
        OpsetImport {
            domain: String::new(),
            version: 1,
        }
    }
}

/// Descriptive model information
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetadata {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub domain: Option<String>,
    pub doc_string: Option<String>,
    pub producer_name: Option<String>,
    pub producer_version: Option<String>,
    pub ir_version: Option<i64>,
    /// Never empty
    pub opset_imports: Vec<OpsetImport>,
    /// `metadata_props` entries in source order
    pub properties: Vec<(String, String)>,
}

impl ModelMetadata {
    /// Version of the opset imported for `domain`
    pub fn opset_version(&self, domain: &str) -> Option<i64> {
        self.opset_imports
            .iter()
            .find(|op| op.domain == domain)
            .map(|op| op.version)
    }

    /// Value of a `metadata_props` entry
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Initializers indexed by name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeightCollection {
    tensors: HashMap<String, Tensor>,
}

impl WeightCollection {
    /// Index `initializers` by name; a later tensor replaces an earlier one
    /// of the same name
    pub fn from_initializers(initializers: &[Tensor]) -> Self {
        let mut tensors = HashMap::with_capacity(initializers.len());
        for tensor in initializers {
            if tensors
                .insert(tensor.name().to_string(), tensor.clone())
                .is_some()
            {
                tracing::warn!(
                    name = tensor.name(),
                    "duplicate initializer name, keeping the later tensor"
                );
            }
        }
        WeightCollection { tensors }
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.tensors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Weight names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tensors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Sum of inline payload sizes
    pub fn total_bytes(&self) -> usize {
        self.tensors.values().map(|t| t.data().len()).sum()
    }
}

/// A decoded and adapted model
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkModel {
    metadata: ModelMetadata,
    graph: ComputationGraph,
    weights: WeightCollection,
}

impl NetworkModel {
    pub(crate) fn new(
        metadata: ModelMetadata,
        graph: ComputationGraph,
        weights: WeightCollection,
    ) -> Self {
        NetworkModel {
            metadata,
            graph,
            weights,
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn graph(&self) -> &ComputationGraph {
        &self.graph
    }

    pub fn weights(&self) -> &WeightCollection {
        &self.weights
    }

    /// Get weight tensor by name
    pub fn weight(&self, name: &str) -> Option<&Tensor> {
        self.weights.get(name)
    }

    /// Get node by id
    pub fn node(&self, id: &str) -> Option<&OperatorNode> {
        self.graph.node(id)
    }

    /// Human-readable overview of the model
    pub fn summary(&self) -> String {
        let meta = &self.metadata;
        let mut out = String::new();
        let _ = writeln!(out, "=== ONNX Model: {} (v{}) ===", meta.name, meta.version);
        if let Some(producer) = &meta.producer_name {
            let _ = writeln!(
                out,
                "Producer: {} {}",
                producer,
                meta.producer_version.as_deref().unwrap_or("")
            );
        }
        if let Some(ir_version) = meta.ir_version {
            let _ = writeln!(out, "IR version: {ir_version}");
        }
        let opsets: Vec<String> = meta
            .opset_imports
            .iter()
            .map(|op| {
                let domain = if op.domain.is_empty() {
                    "ai.onnx"
                } else {
                    &op.domain
                };
                format!("{domain}:{}", op.version)
            })
            .collect();
        let _ = writeln!(out, "Opsets: {}", opsets.join(", "));

        let graph = &self.graph;
        let _ = writeln!(
            out,
            "Inputs: {} | Outputs: {} | Nodes: {} | Initializers: {}",
            graph.inputs().len(),
            graph.outputs().len(),
            graph.nodes().len(),
            graph.initializers().len()
        );

        let counts = graph.count_by_op_type();
        for op_type in graph.operator_types() {
            let _ = writeln!(out, "  {}: {}", op_type, counts.get(op_type).unwrap_or(&0));
        }

        let _ = writeln!(
            out,
            "Weights: {} ({} bytes)",
            self.weights.len(),
            self.weights.total_bytes()
        );
        out
    }
}
