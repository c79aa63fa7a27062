use compact_str::CompactString;
use miette::Diagnostic;

/// Encoding failures. All of them abort the encode pass; a tree that trips
/// any of these is outside the supported subset or structurally broken.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EncodeError {
    #[error("unsupported construct \"{0}\" has no schema entry")]
    UnsupportedConstruct(CompactString),
    #[error("{kind} carries {got} fields, schema expects {expected}")]
    FieldArity {
        kind: CompactString,
        expected: usize,
        got: usize,
    },
    #[error("malformed node: {0}")]
    MalformedNode(String),
    #[error("tree has no root")]
    EmptyTree,
}

/// Decoding failures. Every variant means the payload is corrupt or was
/// produced by something other than the encoder; nothing is fabricated.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DecodeError {
    #[error("bytecode is empty")]
    EmptyBytecode,
    #[error("type index {0} is outside the type dictionary")]
    TypeIndexOutOfRange(u32),
    #[error("value index {0} is outside the value dictionary")]
    ValueIndexOutOfRange(u32),
    #[error("record index {0} is outside the record table")]
    RecordIndexOutOfRange(usize),
    #[error("record {record} references record {reference}, which is not behind it")]
    ForwardReference { record: usize, reference: usize },
    #[error("unknown type tag \"{0}\"")]
    UnknownType(CompactString),
    #[error("record {0} does not match its schema entry")]
    MalformedRecord(usize),
    #[error("top-level record is not a program")]
    InvalidTopLevel,
}

/// Container framing failures, all raised before decompression is tried.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("invalid file format: bad magic number")]
    BadMagic,
    #[error("unsupported version: {found} | current version: {current}")]
    UnsupportedVersion { found: u8, current: u8 },
    #[error("container is truncated")]
    Truncated,
    #[error(transparent)]
    Compression(#[from] std::io::Error),
    #[error(transparent)]
    Payload(#[from] postcard::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let c = match self {
            Error::Encode(EncodeError::UnsupportedConstruct(_)) => {
                "EncodeError::UnsupportedConstruct"
            }
            Error::Encode(EncodeError::FieldArity { .. }) => "EncodeError::FieldArity",
            Error::Encode(EncodeError::MalformedNode(_)) => "EncodeError::MalformedNode",
            Error::Encode(EncodeError::EmptyTree) => "EncodeError::EmptyTree",
            Error::Decode(DecodeError::EmptyBytecode) => "DecodeError::EmptyBytecode",
            Error::Decode(DecodeError::TypeIndexOutOfRange(_)) => {
                "DecodeError::TypeIndexOutOfRange"
            }
            Error::Decode(DecodeError::ValueIndexOutOfRange(_)) => {
                "DecodeError::ValueIndexOutOfRange"
            }
            Error::Decode(DecodeError::RecordIndexOutOfRange(_)) => {
                "DecodeError::RecordIndexOutOfRange"
            }
            Error::Decode(DecodeError::ForwardReference { .. }) => "DecodeError::ForwardReference",
            Error::Decode(DecodeError::UnknownType(_)) => "DecodeError::UnknownType",
            Error::Decode(DecodeError::MalformedRecord(_)) => "DecodeError::MalformedRecord",
            Error::Decode(DecodeError::InvalidTopLevel) => "DecodeError::InvalidTopLevel",
            Error::Container(ContainerError::BadMagic) => "ContainerError::BadMagic",
            Error::Container(ContainerError::UnsupportedVersion { .. }) => {
                "ContainerError::UnsupportedVersion"
            }
            Error::Container(ContainerError::Truncated) => "ContainerError::Truncated",
            Error::Container(ContainerError::Compression(_)) => "ContainerError::Compression",
            Error::Container(ContainerError::Payload(_)) => "ContainerError::Payload",
        };
        Some(Box::new(c))
    }
}
