//! # Entities
//!
//! The stored form of a chronology.
//!
//! An entity is encoded as a framed spine record: chunk 0 is the
//! [`EntityHeader`], every following chunk is one version record. The spine
//! store merges records chunk by chunk without looking inside them, so the
//! version encoding must be deterministic (same version, same bytes).

mod chronology;
mod version;

pub use chronology::{
    Chronology, ConceptChronology, GraphChronology, PatternChronology, SemanticChronology,
    to_entity,
};
pub use version::{
    ConceptVersion, Field, FieldDefinition, GraphVersion, PatternVersion, SemanticVersion,
    Versioned,
};

use crate::formats::{BinaryReader, BinaryWriter, Marshal, from_record_bytes, to_record_bytes};
use crate::spine::record::{join_chunks, split_chunks};
use crate::{Nid, Stamp, TermstoreError};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// KIND & HEADER
// =============================================================================

/// Component kind carried in the record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Concept,
    Semantic,
    Pattern,
    Graph,
}

impl EntityKind {
    #[must_use]
    pub const fn token(self) -> u8 {
        match self {
            EntityKind::Concept => 0,
            EntityKind::Semantic => 1,
            EntityKind::Pattern => 2,
            EntityKind::Graph => 3,
        }
    }

    pub fn from_token(token: u8) -> Result<Self, TermstoreError> {
        match token {
            0 => Ok(EntityKind::Concept),
            1 => Ok(EntityKind::Semantic),
            2 => Ok(EntityKind::Pattern),
            3 => Ok(EntityKind::Graph),
            other => Err(TermstoreError::DeserializationError(format!(
                "Unknown entity kind token: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Concept => "concept",
            EntityKind::Semantic => "semantic",
            EntityKind::Pattern => "pattern",
            EntityKind::Graph => "graph",
        };
        f.write_str(name)
    }
}

/// Chunk 0 of every entity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityHeader {
    pub kind: EntityKind,
    pub nid: Nid,
    pub definition: Nid,
    /// `Nid::NOT_A_SEMANTIC` when the entity references nothing.
    pub referenced_component: Nid,
}

impl Marshal for EntityHeader {
    const RECORD_NAME: &'static str = "EntityHeader";
    const MARSHAL_VERSION: i32 = 1;

    fn marshal(&self, out: &mut BinaryWriter) {
        out.put_byte(self.kind.token());
        out.put_nid(self.nid);
        out.put_nid(self.definition);
        out.put_nid(self.referenced_component);
    }

    fn unmarshal(input: &mut BinaryReader<'_>) -> Result<Self, TermstoreError> {
        Ok(Self {
            kind: EntityKind::from_token(input.get_byte()?)?,
            nid: input.get_nid()?,
            definition: input.get_nid()?,
            referenced_component: input.get_nid()?,
        })
    }
}

// =============================================================================
// ENTITY
// =============================================================================

/// One component with all of its versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord<V> {
    pub nid: Nid,
    pub definition: Nid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_component: Option<Nid>,
    pub versions: Vec<V>,
}

impl<V: Marshal> EntityRecord<V> {
    fn header(&self, kind: EntityKind) -> EntityHeader {
        EntityHeader {
            kind,
            nid: self.nid,
            definition: self.definition,
            referenced_component: self.referenced_component.unwrap_or(Nid::NOT_A_SEMANTIC),
        }
    }

    fn encode(&self, kind: EntityKind) -> Vec<u8> {
        let mut chunks = Vec::with_capacity(self.versions.len() + 1);
        chunks.push(to_record_bytes(&self.header(kind)));
        chunks.extend(self.versions.iter().map(to_record_bytes));
        join_chunks(&chunks)
    }

    fn decode(header: EntityHeader, chunks: &[&[u8]]) -> Result<Self, TermstoreError> {
        let versions = chunks
            .iter()
            .map(|chunk| from_record_bytes::<V>(chunk))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            nid: header.nid,
            definition: header.definition,
            referenced_component: (!header.referenced_component.is_sentinel())
                .then_some(header.referenced_component),
            versions,
        })
    }
}

/// Tagged entity: one case per component kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Concept(EntityRecord<ConceptVersion>),
    Semantic(EntityRecord<SemanticVersion>),
    Pattern(EntityRecord<PatternVersion>),
    Graph(EntityRecord<GraphVersion>),
}

/// An owned version of any kind, as handed out by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityVersion {
    Concept(ConceptVersion),
    Semantic(SemanticVersion),
    Pattern(PatternVersion),
    Graph(GraphVersion),
}

impl Versioned for EntityVersion {
    fn stamp(&self) -> &Stamp {
        match self {
            EntityVersion::Concept(v) => &v.stamp,
            EntityVersion::Semantic(v) => &v.stamp,
            EntityVersion::Pattern(v) => &v.stamp,
            EntityVersion::Graph(v) => &v.stamp,
        }
    }

    fn version_bytes(&self) -> Vec<u8> {
        match self {
            EntityVersion::Concept(v) => v.version_bytes(),
            EntityVersion::Semantic(v) => v.version_bytes(),
            EntityVersion::Pattern(v) => v.version_bytes(),
            EntityVersion::Graph(v) => v.version_bytes(),
        }
    }
}

impl Entity {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Concept(_) => EntityKind::Concept,
            Entity::Semantic(_) => EntityKind::Semantic,
            Entity::Pattern(_) => EntityKind::Pattern,
            Entity::Graph(_) => EntityKind::Graph,
        }
    }

    #[must_use]
    pub fn nid(&self) -> Nid {
        match self {
            Entity::Concept(r) => r.nid,
            Entity::Semantic(r) => r.nid,
            Entity::Pattern(r) => r.nid,
            Entity::Graph(r) => r.nid,
        }
    }

    /// Pattern (or component-kind definition) of this entity.
    #[must_use]
    pub fn definition_nid(&self) -> Nid {
        match self {
            Entity::Concept(r) => r.definition,
            Entity::Semantic(r) => r.definition,
            Entity::Pattern(r) => r.definition,
            Entity::Graph(r) => r.definition,
        }
    }

    /// Referenced component, or the sentinel when there is none.
    #[must_use]
    pub fn referenced_component_nid(&self) -> Nid {
        let referenced = match self {
            Entity::Concept(r) => r.referenced_component,
            Entity::Semantic(r) => r.referenced_component,
            Entity::Pattern(r) => r.referenced_component,
            Entity::Graph(r) => r.referenced_component,
        };
        referenced.unwrap_or(Nid::NOT_A_SEMANTIC)
    }

    #[must_use]
    pub fn version_count(&self) -> usize {
        match self {
            Entity::Concept(r) => r.versions.len(),
            Entity::Semantic(r) => r.versions.len(),
            Entity::Pattern(r) => r.versions.len(),
            Entity::Graph(r) => r.versions.len(),
        }
    }

    /// All versions in stored order (sorted by encoding).
    #[must_use]
    pub fn versions(&self) -> Vec<EntityVersion> {
        match self {
            Entity::Concept(r) => r.versions.iter().cloned().map(EntityVersion::Concept).collect(),
            Entity::Semantic(r) => r
                .versions
                .iter()
                .cloned()
                .map(EntityVersion::Semantic)
                .collect(),
            Entity::Pattern(r) => r.versions.iter().cloned().map(EntityVersion::Pattern).collect(),
            Entity::Graph(r) => r.versions.iter().cloned().map(EntityVersion::Graph).collect(),
        }
    }

    /// Encode as a framed spine record.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Entity::Concept(r) => r.encode(EntityKind::Concept),
            Entity::Semantic(r) => r.encode(EntityKind::Semantic),
            Entity::Pattern(r) => r.encode(EntityKind::Pattern),
            Entity::Graph(r) => r.encode(EntityKind::Graph),
        }
    }

    /// Decode a framed spine record.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TermstoreError> {
        let chunks = split_chunks(bytes)?;
        let (first, versions) = chunks.split_first().ok_or_else(|| {
            TermstoreError::DeserializationError("Entity record has no header".to_string())
        })?;
        let header: EntityHeader = from_record_bytes(first)?;
        let entity = match header.kind {
            EntityKind::Concept => Entity::Concept(EntityRecord::decode(header, versions)?),
            EntityKind::Semantic => Entity::Semantic(EntityRecord::decode(header, versions)?),
            EntityKind::Pattern => Entity::Pattern(EntityRecord::decode(header, versions)?),
            EntityKind::Graph => Entity::Graph(EntityRecord::decode(header, versions)?),
        };
        Ok(entity)
    }

    /// Semantic view, if this is a semantic.
    #[must_use]
    pub fn as_semantic(&self) -> Option<&EntityRecord<SemanticVersion>> {
        match self {
            Entity::Semantic(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Status, terms};

    fn stamp(time: i64) -> Stamp {
        Stamp::new(
            Status::Active,
            time,
            terms::USER,
            terms::SOLOR_MODULE,
            terms::MASTER_PATH,
        )
    }

    #[test]
    fn semantic_entity_bytes_roundtrip() {
        let entity = Entity::Semantic(EntityRecord {
            nid: Nid(100),
            definition: terms::DESCRIPTION_PATTERN,
            referenced_component: Some(Nid(64)),
            versions: vec![
                SemanticVersion {
                    stamp: stamp(1),
                    fields: vec![Field::Text("Heart".into())],
                },
                SemanticVersion {
                    stamp: stamp(2),
                    fields: vec![Field::Text("Heart structure".into())],
                },
            ],
        });
        let restored = Entity::from_bytes(&entity.to_bytes()).expect("decode");
        assert_eq!(restored, entity);
        assert_eq!(restored.referenced_component_nid(), Nid(64));
        assert_eq!(restored.version_count(), 2);
    }

    #[test]
    fn concept_has_sentinel_reference() {
        let entity = Entity::Concept(EntityRecord {
            nid: Nid(64),
            definition: terms::CONCEPT_DEFINITION,
            referenced_component: None,
            versions: vec![ConceptVersion { stamp: stamp(1) }],
        });
        assert!(entity.referenced_component_nid().is_sentinel());
        let restored = Entity::from_bytes(&entity.to_bytes()).expect("decode");
        assert_eq!(restored.kind(), EntityKind::Concept);
        assert_eq!(restored, entity);
    }

    #[test]
    fn empty_record_rejected() {
        let bytes = join_chunks::<Vec<u8>>(&[]);
        assert!(Entity::from_bytes(&bytes).is_err());
    }

    #[test]
    fn version_chunk_of_wrong_kind_rejected() {
        let header = EntityHeader {
            kind: EntityKind::Pattern,
            nid: Nid(70),
            definition: terms::PATTERN_DEFINITION,
            referenced_component: Nid::NOT_A_SEMANTIC,
        };
        let bytes = join_chunks(&[
            to_record_bytes(&header),
            to_record_bytes(&ConceptVersion { stamp: stamp(1) }),
        ]);
        assert!(Entity::from_bytes(&bytes).is_err());
    }
}
