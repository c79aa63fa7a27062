//! Bytecode to tree.
//!
//! The last record is the program root; decoding recurses through record
//! references, which must always point backwards. Out-of-range dictionary
//! or record indices fail the whole decode rather than fabricating nodes.

use std::str::FromStr;

use crate::{
    ast::{Field, NodeId, NodeKind, Tree},
    bytecode::{CompiledProgram, DictValue, Operand, Record},
    error::DecodeError,
    names, schema,
};

/// Rebuilds a tree from a [`CompiledProgram`], wrapping the decoded
/// program in a fresh `File` root.
pub fn decode(compiled: &CompiledProgram) -> Result<Tree, DecodeError> {
    if compiled.bytecode.is_empty() {
        return Err(DecodeError::EmptyBytecode);
    }
    let mut decoder = Decoder {
        compiled,
        tree: Tree::new(),
    };
    let top = compiled.bytecode.len() - 1;
    let program = match decoder.decode_record(top)? {
        Decoded::Node(id) if *decoder.tree.kind(id) == NodeKind::Program => id,
        _ => return Err(DecodeError::InvalidTopLevel),
    };
    decoder.tree.file(program);
    Ok(decoder.tree)
}

struct Decoder<'a> {
    compiled: &'a CompiledProgram,
    tree: Tree,
}

enum Decoded {
    Node(NodeId),
    /// The canonical absence record.
    Null,
}

impl Decoder<'_> {
    fn decode_record(&mut self, index: usize) -> Result<Decoded, DecodeError> {
        let compiled = self.compiled;
        let record = compiled
            .bytecode
            .get(index)
            .ok_or(DecodeError::RecordIndexOutOfRange(index))?;
        let tag = compiled
            .type_dict
            .get(record.type_index as usize)
            .ok_or(DecodeError::TypeIndexOutOfRange(record.type_index))?;
        // EnumString never fails here; unknown tags land in Custom.
        let kind = NodeKind::from_str(tag).unwrap_or(NodeKind::Null);
        if let NodeKind::Custom(tag) = &kind {
            return Err(DecodeError::UnknownType(tag.clone()));
        }
        if kind == NodeKind::Null {
            return Ok(Decoded::Null);
        }

        if kind == NodeKind::TemplateElement {
            return self.decode_template_element(record, index).map(Decoded::Node);
        }

        let field_names =
            schema::fields(&kind).ok_or_else(|| DecodeError::UnknownType(tag.clone()))?;
        if record.operands.len() != field_names.len() {
            return Err(DecodeError::MalformedRecord(index));
        }

        let mut fields = Vec::with_capacity(field_names.len());
        for (name, operand) in field_names.iter().zip(record.operands.iter()) {
            fields.push(self.decode_operand(&kind, name, operand, index)?);
        }
        Ok(Decoded::Node(self.tree.node(kind, fields)))
    }

    fn decode_template_element(
        &mut self,
        record: &Record,
        index: usize,
    ) -> Result<NodeId, DecodeError> {
        let (Some(Operand::Index(value_index)), Some(Operand::Bool(tail))) =
            (record.operands.first(), record.operands.get(1))
        else {
            return Err(DecodeError::MalformedRecord(index));
        };
        let value = self
            .compiled
            .value_dict
            .get(*value_index as usize)
            .ok_or(DecodeError::ValueIndexOutOfRange(*value_index))?;

        let DictValue::Template { raw, cooked } = value else {
            return Err(DecodeError::MalformedRecord(index));
        };
        let (raw, cooked) = (raw.clone(), cooked.clone());
        Ok(self.tree.template_element(raw, cooked, *tail))
    }

    fn decode_operand(
        &mut self,
        kind: &NodeKind,
        name: &str,
        operand: &Operand,
        current: usize,
    ) -> Result<Field, DecodeError> {
        // Renamed identifier slot: integers are rename ids, strings are
        // external names carried through unchanged.
        if *kind == NodeKind::Identifier && name == "name" {
            return match operand {
                Operand::Index(id) => Ok(Field::String(names::short_name(*id))),
                Operand::String(s) => Ok(Field::String(s.clone())),
                _ => Err(DecodeError::MalformedRecord(current)),
            };
        }

        // Literal value slot.
        if kind.has_literal_value() && name == "value" {
            let Operand::Index(value_index) = operand else {
                return Err(DecodeError::MalformedRecord(current));
            };
            let value = self
                .compiled
                .value_dict
                .get(*value_index as usize)
                .ok_or(DecodeError::ValueIndexOutOfRange(*value_index))?;
            return match value {
                DictValue::String(s) => Ok(Field::String(s.clone())),
                DictValue::Number(n) => Ok(Field::Number(*n)),
                DictValue::Bool(b) => Ok(Field::Bool(*b)),
                DictValue::Null => Ok(Field::Null),
                DictValue::Template { .. } => Err(DecodeError::MalformedRecord(current)),
            };
        }

        self.decode_plain(operand, current)
    }

    fn decode_plain(&mut self, operand: &Operand, current: usize) -> Result<Field, DecodeError> {
        let field = match operand {
            Operand::Index(reference) => {
                let reference = *reference as usize;
                if reference >= current {
                    return Err(DecodeError::ForwardReference {
                        record: current,
                        reference,
                    });
                }
                match self.decode_record(reference)? {
                    Decoded::Node(id) => Field::Node(id),
                    Decoded::Null => Field::Null,
                }
            }
            Operand::List(items) => {
                let mut fields = Vec::with_capacity(items.len());
                for item in items {
                    fields.push(self.decode_plain(item, current)?);
                }
                Field::List(fields)
            }
            Operand::String(s) => Field::String(s.clone()),
            Operand::Number(n) => Field::Number(*n),
            Operand::Bool(b) => Field::Bool(*b),
            Operand::Absent => Field::Absent,
        };
        Ok(field)
    }
}
