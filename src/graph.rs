use std::collections::{HashMap, HashSet, VecDeque};

use crate::{Error, OperatorNode, Result, Tensor, ValueInfo};

/// Nodes, values and constants of one ONNX graph
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComputationGraph {
    name: Option<String>,
    doc_string: Option<String>,
    nodes: Vec<OperatorNode>,
    inputs: Vec<ValueInfo>,
    outputs: Vec<ValueInfo>,
    initializers: Vec<Tensor>,
    value_infos: Vec<ValueInfo>,
}

impl ComputationGraph {
    pub(crate) fn new(
        nodes: Vec<OperatorNode>,
        inputs: Vec<ValueInfo>,
        outputs: Vec<ValueInfo>,
        initializers: Vec<Tensor>,
        value_infos: Vec<ValueInfo>,
    ) -> Self {
        ComputationGraph {
            name: None,
            doc_string: None,
            nodes,
            inputs,
            outputs,
            initializers,
            value_infos,
        }
    }

    pub(crate) fn with_name(mut self, name: Option<String>, doc_string: Option<String>) -> Self {
        self.name = name;
        self.doc_string = doc_string;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn doc_string(&self) -> Option<&str> {
        self.doc_string.as_deref()
    }

    /// Nodes in source order
    pub fn nodes(&self) -> &[OperatorNode] {
        &self.nodes
    }

    pub fn inputs(&self) -> &[ValueInfo] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ValueInfo] {
        &self.outputs
    }

    /// Constant tensors (weights) in source order
    pub fn initializers(&self) -> &[Tensor] {
        &self.initializers
    }

    /// Declared types of intermediate values
    pub fn value_infos(&self) -> &[ValueInfo] {
        &self.value_infos
    }

    /// First node whose id matches
    pub fn node(&self, id: &str) -> Option<&OperatorNode> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    /// First initializer with the given name
    pub fn initializer(&self, name: &str) -> Option<&Tensor> {
        self.initializers.iter().find(|t| t.name() == name)
    }

    /// Get all nodes of a specific operator type
    pub fn nodes_by_op_type(&self, op_type: &str) -> Vec<&OperatorNode> {
        self.nodes.iter().filter(|n| n.is_op_type(op_type)).collect()
    }

    /// Distinct operator types, sorted
    pub fn operator_types(&self) -> Vec<&str> {
        let set: HashSet<&str> = self.nodes.iter().map(OperatorNode::op_type).collect();
        let mut op_types: Vec<&str> = set.into_iter().collect();
        op_types.sort_unstable();
        op_types
    }

    /// Count nodes by operator type
    pub fn count_by_op_type(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            *counts.entry(node.op_type()).or_insert(0) += 1;
        }
        counts
    }

    /// Graph inputs that are not satisfied by an initializer
    pub fn input_names_excluding_initializers(&self) -> Vec<&str> {
        let initializer_names: HashSet<&str> =
            self.initializers.iter().map(Tensor::name).collect();
        self.inputs
            .iter()
            .map(|vi| vi.name.as_str())
            .filter(|name| !initializer_names.contains(name))
            .collect()
    }

    /// Nodes ordered so that every producer precedes its consumers.
    ///
    /// Kahn's algorithm; nodes that become ready together keep their source
    /// order. Inputs not produced by any node (graph inputs, initializers,
    /// empty optional slots) impose no ordering. A cycle is reported as
    /// [`Error::InvalidGraphStructure`].
    pub fn topological_order(&self) -> Result<Vec<&OperatorNode>> {
        let node_count = self.nodes.len();

        // map value name -> producer node index
        let mut producer: HashMap<&str, usize> = HashMap::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            for out in node.outputs() {
                if !out.is_empty() {
                    producer.entry(out.as_str()).or_insert(idx);
                }
            }
        }

        // map value name -> consumer node indices
        let mut consumers: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut indegree: Vec<usize> = vec![0; node_count];
        for (idx, node) in self.nodes.iter().enumerate() {
            for input in node.inputs() {
                if input.is_empty() || !producer.contains_key(input.as_str()) {
                    continue;
                }
                consumers.entry(input.as_str()).or_default().push(idx);
                indegree[idx] += 1;
            }
        }

        let mut queue: VecDeque<usize> = indegree
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d == 0)
            .map(|(idx, _)| idx)
            .collect();

        let mut ordered: Vec<&OperatorNode> = Vec::with_capacity(node_count);

        while let Some(idx) = queue.pop_front() {
            let node = &self.nodes[idx];
            ordered.push(node);

            let mut released: HashSet<&str> = HashSet::new();
            for out in node.outputs() {
                // only the first producer of a name releases its consumers
                if out.is_empty()
                    || producer.get(out.as_str()) != Some(&idx)
                    || !released.insert(out.as_str())
                {
                    continue;
                }
                if let Some(cons_list) = consumers.get(out.as_str()) {
                    for &cidx in cons_list {
                        indegree[cidx] -= 1;
                        if indegree[cidx] == 0 {
                            queue.push_back(cidx);
                        }
                    }
                }
            }
        }

        if ordered.len() != node_count {
            return Err(Error::invalid_graph(
                format!(
                    "graph has a cycle: {} of {} nodes could not be ordered",
                    node_count - ordered.len(),
                    node_count
                ),
                None,
            ));
        }
        Ok(ordered)
    }
}
