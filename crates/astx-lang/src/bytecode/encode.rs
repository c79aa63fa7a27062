//! Tree to bytecode.
//!
//! Bottom-up recursion: a node's children are emitted first, so every
//! record reference points strictly backwards. The `File` wrapper is
//! skipped; the program node becomes the last record.

use compact_str::{CompactString, ToCompactString};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    ast::{Field, NodeId, NodeKind, Tree},
    bytecode::{CompiledProgram, DictValue, Operand, Record},
    error::EncodeError,
    names::NameTable,
    schema,
};

/// Encodes a tree into a [`CompiledProgram`].
///
/// `declared` is the set of binding names eligible for renaming; every
/// other identifier passes through as its original string.
pub fn encode(
    tree: &Tree,
    declared: &FxHashSet<CompactString>,
) -> Result<CompiledProgram, EncodeError> {
    let root = tree.root().ok_or(EncodeError::EmptyTree)?;
    let top = match tree.kind(root) {
        NodeKind::File => tree
            .child(root, "program")
            .ok_or_else(|| EncodeError::MalformedNode("File wrapper has no program".into()))?,
        _ => root,
    };

    let mut encoder = Encoder {
        tree,
        declared,
        names: NameTable::new(),
        type_dict: Vec::new(),
        type_lookup: FxHashMap::default(),
        value_dict: Vec::new(),
        records: Vec::new(),
        null_record: None,
    };
    encoder.encode_node(top)?;

    Ok(CompiledProgram {
        type_dict: encoder.type_dict,
        value_dict: encoder.value_dict,
        bytecode: encoder.records,
    })
}

struct Encoder<'a> {
    tree: &'a Tree,
    declared: &'a FxHashSet<CompactString>,
    names: NameTable,
    type_dict: Vec<CompactString>,
    type_lookup: FxHashMap<CompactString, u32>,
    value_dict: Vec<DictValue>,
    records: Vec<Record>,
    null_record: Option<u32>,
}

impl Encoder<'_> {
    fn encode_node(&mut self, id: NodeId) -> Result<u32, EncodeError> {
        let tree = self.tree;
        let kind = tree.kind(id).clone();
        let field_names = schema::fields(&kind)
            .ok_or_else(|| EncodeError::UnsupportedConstruct(kind.to_compact_string()))?;
        let type_index = self.intern_type(&kind);
        let node_fields = &tree[id].fields;

        if kind == NodeKind::TemplateElement {
            return self.encode_template_element(type_index, node_fields.as_slice());
        }

        if node_fields.len() != field_names.len() {
            return Err(EncodeError::FieldArity {
                kind: kind.to_compact_string(),
                expected: field_names.len(),
                got: node_fields.len(),
            });
        }

        let mut operands = Vec::with_capacity(field_names.len());
        for (name, field) in field_names.iter().zip(node_fields.iter()) {
            operands.push(self.encode_field(&kind, name, field)?);
        }

        Ok(self.push_record(type_index, operands))
    }

    fn encode_template_element(
        &mut self,
        type_index: u32,
        fields: &[Field],
    ) -> Result<u32, EncodeError> {
        let (Some(Field::Template { raw, cooked }), Some(Field::Bool(tail))) =
            (fields.first(), fields.get(1))
        else {
            return Err(EncodeError::MalformedNode(
                "TemplateElement must carry a raw/cooked pair and a tail flag".into(),
            ));
        };
        let value_index = self.intern_value(DictValue::Template {
            raw: raw.clone(),
            cooked: cooked.clone(),
        });
        Ok(self.push_record(
            type_index,
            vec![Operand::Index(value_index), Operand::Bool(*tail)],
        ))
    }

    fn encode_field(
        &mut self,
        kind: &NodeKind,
        name: &str,
        field: &Field,
    ) -> Result<Operand, EncodeError> {
        // Renameable identifier slot.
        if *kind == NodeKind::Identifier
            && name == "name"
            && let Field::String(ident) = field
        {
            return Ok(if self.declared.contains(ident) {
                Operand::Index(self.names.id_for(ident))
            } else {
                Operand::String(ident.clone())
            });
        }

        // Literal value slot, interned into the value dictionary.
        if kind.has_literal_value() && name == "value" {
            let value = match field {
                Field::String(s) => DictValue::String(s.clone()),
                Field::Number(n) => DictValue::Number(*n),
                Field::Bool(b) => DictValue::Bool(*b),
                Field::Null => DictValue::Null,
                _ => {
                    return Err(EncodeError::MalformedNode(format!(
                        "{kind} value field holds a non-literal"
                    )));
                }
            };
            return Ok(Operand::Index(self.intern_value(value)));
        }

        self.encode_plain(field)
    }

    fn encode_plain(&mut self, field: &Field) -> Result<Operand, EncodeError> {
        let operand = match field {
            Field::Node(child) => Operand::Index(self.encode_node(*child)?),
            Field::List(items) => {
                let mut operands = Vec::with_capacity(items.len());
                for item in items {
                    operands.push(self.encode_plain(item)?);
                }
                Operand::List(operands)
            }
            Field::String(s) => Operand::String(s.clone()),
            Field::Number(n) => Operand::Number(*n),
            Field::Bool(b) => Operand::Bool(*b),
            Field::Null => Operand::Index(self.null_record()),
            Field::Absent => Operand::Absent,
            Field::Template { .. } => {
                return Err(EncodeError::MalformedNode(
                    "template fragment outside a TemplateElement".into(),
                ));
            }
        };
        Ok(operand)
    }

    fn intern_type(&mut self, kind: &NodeKind) -> u32 {
        let tag = kind.to_compact_string();
        if let Some(index) = self.type_lookup.get(&tag) {
            return *index;
        }
        let index = self.type_dict.len() as u32;
        self.type_dict.push(tag.clone());
        self.type_lookup.insert(tag, index);
        index
    }

    fn intern_value(&mut self, value: DictValue) -> u32 {
        if let Some(index) = self.value_dict.iter().position(|known| *known == value) {
            return index as u32;
        }
        self.value_dict.push(value);
        (self.value_dict.len() - 1) as u32
    }

    /// The single shared record standing in for explicit `null` fields.
    fn null_record(&mut self) -> u32 {
        if let Some(index) = self.null_record {
            return index;
        }
        let type_index = self.intern_type(&NodeKind::Null);
        let index = self.push_record(type_index, Vec::new());
        self.null_record = Some(index);
        index
    }

    fn push_record(&mut self, type_index: u32, operands: Vec<Operand>) -> u32 {
        let index = self.records.len() as u32;
        self.records.push(Record {
            type_index,
            operands,
        });
        index
    }
}
