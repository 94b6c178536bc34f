use crate::{AttributeMap, AttributeValue, Tensor};

/// An operator invocation in the computation graph
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorNode {
    id: String,
    op_type: String,
    name: Option<String>,
    inputs: Vec<String>,
    outputs: Vec<String>,
    attributes: AttributeMap,
    domain: Option<String>,
    doc_string: Option<String>,
}

impl OperatorNode {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: String,
        op_type: String,
        name: Option<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        attributes: AttributeMap,
        domain: Option<String>,
        doc_string: Option<String>,
    ) -> Self {
        OperatorNode {
            id,
            op_type,
            name,
            inputs,
            outputs,
            attributes,
            domain,
            doc_string,
        }
    }

    /// Node name, or `node_<index>` when the source left it unnamed
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Operator set domain, `None` for the default ONNX domain
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn doc_string(&self) -> Option<&str> {
        self.doc_string.as_deref()
    }

    /// Get attribute by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Get integer attribute by name
    pub fn int_attribute(&self, name: &str) -> Option<i64> {
        self.attribute(name)?.as_int()
    }

    /// Get float attribute by name
    pub fn float_attribute(&self, name: &str) -> Option<f32> {
        self.attribute(name)?.as_float()
    }

    /// Get string attribute by name
    pub fn string_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name)?.as_string()
    }

    /// Get integer array attribute by name
    pub fn ints_attribute(&self, name: &str) -> Option<&[i64]> {
        self.attribute(name)?.as_ints()
    }

    /// Get float array attribute by name
    pub fn floats_attribute(&self, name: &str) -> Option<&[f32]> {
        self.attribute(name)?.as_floats()
    }

    pub fn tensor_attribute(&self, name: &str) -> Option<&Tensor> {
        self.attribute(name)?.as_tensor()
    }

    /// Check if operation has a specific attribute
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Attribute names in sorted order
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Check if this is a specific operation type
    pub fn is_op_type(&self, op_type: &str) -> bool {
        self.op_type == op_type
    }
}
