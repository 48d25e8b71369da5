//! Input chronologies and their conversion into entities.

use super::version::{ConceptVersion, Field, GraphVersion, PatternVersion, SemanticVersion};
use super::{Entity, EntityRecord};
use crate::{Nid, TermstoreError, terms};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptChronology {
    pub nid: Nid,
    pub versions: Vec<ConceptVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticChronology {
    pub nid: Nid,
    pub pattern: Nid,
    pub referenced_component: Nid,
    pub versions: Vec<SemanticVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternChronology {
    pub nid: Nid,
    pub versions: Vec<PatternVersion>,
}

/// Logic definition: a semantic whose versions are graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphChronology {
    pub nid: Nid,
    pub pattern: Nid,
    pub referenced_component: Nid,
    pub versions: Vec<GraphVersion>,
}

/// A chronology as supplied by callers (and by the JSON import).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chronology {
    Concept(ConceptChronology),
    Semantic(SemanticChronology),
    Pattern(PatternChronology),
    Graph(GraphChronology),
}

impl Chronology {
    #[must_use]
    pub fn nid(&self) -> Nid {
        match self {
            Chronology::Concept(c) => c.nid,
            Chronology::Semantic(c) => c.nid,
            Chronology::Pattern(c) => c.nid,
            Chronology::Graph(c) => c.nid,
        }
    }
}

/// Convert a chronology into its stored form.
///
/// Byte-identical duplicate versions are dropped, keeping the first
/// occurrence.
pub fn to_entity(chronology: &Chronology) -> Result<Entity, TermstoreError> {
    match chronology {
        Chronology::Concept(c) => concept_entity(c).map(Entity::Concept),
        Chronology::Semantic(c) => semantic_entity(c).map(Entity::Semantic),
        Chronology::Pattern(c) => pattern_entity(c).map(Entity::Pattern),
        Chronology::Graph(c) => graph_entity(c).map(Entity::Graph),
    }
}

fn concept_entity(c: &ConceptChronology) -> Result<EntityRecord<ConceptVersion>, TermstoreError> {
    Ok(EntityRecord {
        nid: c.nid.check()?,
        definition: terms::CONCEPT_DEFINITION,
        referenced_component: None,
        versions: distinct_versions(c.nid, &c.versions)?,
    })
}

fn semantic_entity(
    c: &SemanticChronology,
) -> Result<EntityRecord<SemanticVersion>, TermstoreError> {
    for version in &c.versions {
        for field in &version.fields {
            check_field(c.nid, field)?;
        }
    }
    Ok(EntityRecord {
        nid: c.nid.check()?,
        definition: c.pattern.check()?,
        referenced_component: Some(referenced(c.nid, c.referenced_component)?),
        versions: distinct_versions(c.nid, &c.versions)?,
    })
}

fn pattern_entity(c: &PatternChronology) -> Result<EntityRecord<PatternVersion>, TermstoreError> {
    Ok(EntityRecord {
        nid: c.nid.check()?,
        definition: terms::PATTERN_DEFINITION,
        referenced_component: None,
        versions: distinct_versions(c.nid, &c.versions)?,
    })
}

fn graph_entity(c: &GraphChronology) -> Result<EntityRecord<GraphVersion>, TermstoreError> {
    for version in &c.versions {
        version.graph.validate()?;
    }
    Ok(EntityRecord {
        nid: c.nid.check()?,
        definition: c.pattern.check()?,
        referenced_component: Some(referenced(c.nid, c.referenced_component)?),
        versions: distinct_versions(c.nid, &c.versions)?,
    })
}

fn referenced(nid: Nid, component: Nid) -> Result<Nid, TermstoreError> {
    if component.is_sentinel() {
        return Err(TermstoreError::InvalidChronology(format!(
            "Semantic {} must reference a component",
            nid
        )));
    }
    component.check()
}

// Graph-valued fields arrive through serde and have not been validated yet.
fn check_field(nid: Nid, field: &Field) -> Result<(), TermstoreError> {
    match field {
        Field::Graph(graph) => graph.validate().map_err(|e| {
            TermstoreError::InvalidChronology(format!("Semantic {} field: {}", nid, e))
        }),
        _ => Ok(()),
    }
}

fn distinct_versions<V: Clone + PartialEq>(nid: Nid, versions: &[V]) -> Result<Vec<V>, TermstoreError> {
    if versions.is_empty() {
        return Err(TermstoreError::InvalidChronology(format!(
            "Chronology {} has no versions",
            nid
        )));
    }
    let mut distinct: Vec<V> = Vec::with_capacity(versions.len());
    for version in versions {
        if !distinct.contains(version) {
            distinct.push(version.clone());
        }
    }
    Ok(distinct)
}
