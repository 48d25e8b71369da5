//! Version bodies and field values.
//!
//! Each version kind is a [`Marshal`] record so it can be stored as one
//! chunk of a spine record and compared byte-for-byte during merges.

use crate::formats::{BinaryReader, BinaryWriter, Marshal, to_record_bytes};
use crate::graph::{DiGraph, Vertex};
use crate::{Nid, Stamp, Status, TermstoreError};
use serde::{Deserialize, Serialize};

/// Anything carrying a STAMP.
pub trait Versioned {
    fn stamp(&self) -> &Stamp;

    /// Stored encoding; orders versions that share a stamp.
    fn version_bytes(&self) -> Vec<u8>;
}

impl Versioned for Stamp {
    fn stamp(&self) -> &Stamp {
        self
    }

    fn version_bytes(&self) -> Vec<u8> {
        to_record_bytes(self)
    }
}

impl<T: Versioned> Versioned for &T {
    fn stamp(&self) -> &Stamp {
        (**self).stamp()
    }

    fn version_bytes(&self) -> Vec<u8> {
        (**self).version_bytes()
    }
}

impl Marshal for Stamp {
    const RECORD_NAME: &'static str = "Stamp";
    const MARSHAL_VERSION: i32 = 1;

    fn marshal(&self, out: &mut BinaryWriter) {
        out.put_byte(self.status.token());
        out.put_long(self.time);
        out.put_nid(self.author);
        out.put_nid(self.module);
        out.put_nid(self.path);
    }

    fn unmarshal(input: &mut BinaryReader<'_>) -> Result<Self, TermstoreError> {
        Ok(Self {
            status: Status::from_token(input.get_byte()?)?,
            time: input.get_long()?,
            author: input.get_nid()?,
            module: input.get_nid()?,
            path: input.get_nid()?,
        })
    }
}

// =============================================================================
// FIELD
// =============================================================================

/// A semantic field value or vertex property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Field {
    Nid(Nid),
    Int(i32),
    Long(i64),
    Bool(bool),
    Text(String),
    NidList(Vec<Nid>),
    Graph(DiGraph<Vertex>),
}

impl Field {
    const NID: u8 = 0;
    const INT: u8 = 1;
    const LONG: u8 = 2;
    const BOOL: u8 = 3;
    const TEXT: u8 = 4;
    const NID_LIST: u8 = 5;
    const GRAPH: u8 = 6;

    /// Tag byte followed by the value.
    pub fn write(&self, out: &mut BinaryWriter) {
        match self {
            Field::Nid(nid) => {
                out.put_byte(Self::NID);
                out.put_nid(*nid);
            }
            Field::Int(value) => {
                out.put_byte(Self::INT);
                out.put_int(*value);
            }
            Field::Long(value) => {
                out.put_byte(Self::LONG);
                out.put_long(*value);
            }
            Field::Bool(value) => {
                out.put_byte(Self::BOOL);
                out.put_bool(*value);
            }
            Field::Text(value) => {
                out.put_byte(Self::TEXT);
                out.put_string(value);
            }
            Field::NidList(nids) => {
                out.put_byte(Self::NID_LIST);
                out.put_nid_list(nids);
            }
            Field::Graph(graph) => {
                out.put_byte(Self::GRAPH);
                out.put_record(graph);
            }
        }
    }

    pub fn read(input: &mut BinaryReader<'_>) -> Result<Self, TermstoreError> {
        match input.get_byte()? {
            Self::NID => Ok(Field::Nid(input.get_nid()?)),
            Self::INT => Ok(Field::Int(input.get_int()?)),
            Self::LONG => Ok(Field::Long(input.get_long()?)),
            Self::BOOL => Ok(Field::Bool(input.get_bool()?)),
            Self::TEXT => Ok(Field::Text(input.get_string()?)),
            Self::NID_LIST => Ok(Field::NidList(input.get_nid_list()?)),
            Self::GRAPH => Ok(Field::Graph(input.get_record()?)),
            other => Err(TermstoreError::DeserializationError(format!(
                "Unknown field tag: {}",
                other
            ))),
        }
    }

    #[must_use]
    pub fn as_nid(&self) -> Option<Nid> {
        match self {
            Field::Nid(nid) => Some(*nid),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Field::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_graph(&self) -> Option<&DiGraph<Vertex>> {
        match self {
            Field::Graph(graph) => Some(graph),
            _ => None,
        }
    }
}

// =============================================================================
// VERSIONS
// =============================================================================

/// A concept version carries nothing but its stamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptVersion {
    pub stamp: Stamp,
}

/// A semantic version: ordered field values laid out by the pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SemanticVersion {
    pub stamp: Stamp,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl SemanticVersion {
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }
}

/// One field slot declared by a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub meaning: Nid,
    pub purpose: Nid,
    pub data_type: Nid,
}

/// A pattern version: what semantics of this pattern mean and hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternVersion {
    pub stamp: Stamp,
    pub meaning: Nid,
    pub purpose: Nid,
    #[serde(default)]
    pub field_definitions: Vec<FieldDefinition>,
}

/// A logic definition version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphVersion {
    pub stamp: Stamp,
    pub graph: DiGraph<Vertex>,
}

macro_rules! impl_versioned {
    ($($ty:ty),*) => {
        $(impl Versioned for $ty {
            fn stamp(&self) -> &Stamp {
                &self.stamp
            }

            fn version_bytes(&self) -> Vec<u8> {
                to_record_bytes(self)
            }
        })*
    };
}

impl_versioned!(ConceptVersion, SemanticVersion, PatternVersion, GraphVersion);

impl Marshal for ConceptVersion {
    const RECORD_NAME: &'static str = "ConceptVersion";
    const MARSHAL_VERSION: i32 = 1;

    fn marshal(&self, out: &mut BinaryWriter) {
        out.put_record(&self.stamp);
    }

    fn unmarshal(input: &mut BinaryReader<'_>) -> Result<Self, TermstoreError> {
        Ok(Self {
            stamp: input.get_record()?,
        })
    }
}

impl Marshal for SemanticVersion {
    const RECORD_NAME: &'static str = "SemanticVersion";
    const MARSHAL_VERSION: i32 = 1;

    fn marshal(&self, out: &mut BinaryWriter) {
        out.put_record(&self.stamp);
        out.put_len(self.fields.len());
        for field in &self.fields {
            field.write(out);
        }
    }

    fn unmarshal(input: &mut BinaryReader<'_>) -> Result<Self, TermstoreError> {
        let stamp = input.get_record()?;
        let count = input.get_len()?;
        let fields = (0..count)
            .map(|_| Field::read(input))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { stamp, fields })
    }
}

impl Marshal for PatternVersion {
    const RECORD_NAME: &'static str = "PatternVersion";
    const MARSHAL_VERSION: i32 = 1;

    fn marshal(&self, out: &mut BinaryWriter) {
        out.put_record(&self.stamp);
        out.put_nid(self.meaning);
        out.put_nid(self.purpose);
        out.put_len(self.field_definitions.len());
        for definition in &self.field_definitions {
            out.put_nid(definition.meaning);
            out.put_nid(definition.purpose);
            out.put_nid(definition.data_type);
        }
    }

    fn unmarshal(input: &mut BinaryReader<'_>) -> Result<Self, TermstoreError> {
        let stamp = input.get_record()?;
        let meaning = input.get_nid()?;
        let purpose = input.get_nid()?;
        let count = input.get_len()?;
        let mut field_definitions = Vec::with_capacity(count.min(input.remaining() / 12));
        for _ in 0..count {
            field_definitions.push(FieldDefinition {
                meaning: input.get_nid()?,
                purpose: input.get_nid()?,
                data_type: input.get_nid()?,
            });
        }
        Ok(Self {
            stamp,
            meaning,
            purpose,
            field_definitions,
        })
    }
}

impl Marshal for GraphVersion {
    const RECORD_NAME: &'static str = "GraphVersion";
    const MARSHAL_VERSION: i32 = 1;

    fn marshal(&self, out: &mut BinaryWriter) {
        out.put_record(&self.stamp);
        out.put_record(&self.graph);
    }

    fn unmarshal(input: &mut BinaryReader<'_>) -> Result<Self, TermstoreError> {
        Ok(Self {
            stamp: input.get_record()?,
            graph: input.get_record()?,
        })
    }
}
