//! # Description Ranking
//!
//! Picks the description of a concept that best fits a
//! [`LanguageCoordinate`].
//!
//! Candidates must match the coordinate's pattern list, type list and
//! language (unless the coordinate language is the `terms::LANGUAGE`
//! wildcard). Survivors are ordered by:
//!
//! 1. pattern rank
//! 2. description type rank
//! 3. dialect rank: `(dialect index, preferred = 0 / acceptable = 1)` from the
//!    first listed dialect that annotates the description; unannotated
//!    descriptions come after annotated ones
//! 4. module rank: unlisted modules come last
//!
//! and finally by lowest nid.

use crate::coordinate::LanguageCoordinate;
use crate::entity::{Entity, SemanticVersion, Versioned};
use crate::spine::SpineStore;
use crate::stamp::StampCalculator;
use crate::{Nid, TermstoreError, terms};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field positions of description and dialect semantics.
pub mod layout {
    pub const DESCRIPTION_LANGUAGE: usize = 0;
    pub const DESCRIPTION_TEXT: usize = 1;
    pub const DESCRIPTION_CASE_SIGNIFICANCE: usize = 2;
    pub const DESCRIPTION_TYPE: usize = 3;

    pub const DIALECT_ACCEPTABILITY: usize = 0;
}

/// One description version competing for a concept's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionCandidate {
    pub nid: Nid,
    pub pattern: Nid,
    pub language: Nid,
    pub description_type: Nid,
    pub case_significance: Nid,
    pub text: String,
    pub module: Nid,
    /// Dialect pattern -> acceptability (`terms::PREFERRED` / `terms::ACCEPTABLE`).
    #[serde(default)]
    pub acceptability: BTreeMap<Nid, Nid>,
}

impl DescriptionCandidate {
    /// Read a description version laid out as in [`layout`].
    pub fn from_version(
        nid: Nid,
        pattern: Nid,
        version: &SemanticVersion,
    ) -> Result<Self, TermstoreError> {
        let nid_field = |index: usize, name: &str| {
            version
                .field(index)
                .and_then(|f| f.as_nid())
                .ok_or_else(|| malformed(nid, name))
        };
        Ok(Self {
            nid,
            pattern,
            language: nid_field(layout::DESCRIPTION_LANGUAGE, "language")?,
            description_type: nid_field(layout::DESCRIPTION_TYPE, "description type")?,
            case_significance: nid_field(
                layout::DESCRIPTION_CASE_SIGNIFICANCE,
                "case significance",
            )?,
            text: version
                .field(layout::DESCRIPTION_TEXT)
                .and_then(|f| f.as_text())
                .ok_or_else(|| malformed(nid, "text"))?
                .to_string(),
            module: version.stamp().module,
            acceptability: BTreeMap::new(),
        })
    }
}

fn malformed(nid: Nid, field: &str) -> TermstoreError {
    TermstoreError::InvalidChronology(format!("Description {} has no {} field", nid, field))
}

// =============================================================================
// RANKING
// =============================================================================

type RankKey = (usize, usize, (usize, u8), usize, Nid);

fn rank_key(candidate: &DescriptionCandidate, coordinate: &LanguageCoordinate) -> Option<RankKey> {
    let position = |list: &[Nid], nid: Nid| list.iter().position(|n| *n == nid);

    let pattern_rank = position(&coordinate.description_patterns, candidate.pattern)?;
    let type_rank = position(&coordinate.description_types, candidate.description_type)?;
    if coordinate.language != terms::LANGUAGE && coordinate.language != candidate.language {
        return None;
    }

    let dialect_rank = if coordinate.dialect_patterns.is_empty() {
        (0, 0)
    } else {
        coordinate
            .dialect_patterns
            .iter()
            .enumerate()
            .find_map(|(index, dialect)| {
                candidate.acceptability.get(dialect).map(|acceptability| {
                    let level = match *acceptability {
                        terms::PREFERRED => 0,
                        terms::ACCEPTABLE => 1,
                        _ => 2,
                    };
                    (index, level)
                })
            })
            .unwrap_or((coordinate.dialect_patterns.len(), 0))
    };

    let module_rank =
        position(&coordinate.module_order, candidate.module).unwrap_or(coordinate.module_order.len());

    Some((pattern_rank, type_rank, dialect_rank, module_rank, candidate.nid))
}

/// Surviving candidates, best first.
#[must_use]
pub fn rank_descriptions<'a>(
    candidates: &'a [DescriptionCandidate],
    coordinate: &LanguageCoordinate,
) -> Vec<&'a DescriptionCandidate> {
    let mut ranked: Vec<(RankKey, &DescriptionCandidate)> = candidates
        .iter()
        .filter_map(|c| rank_key(c, coordinate).map(|key| (key, c)))
        .collect();
    ranked.sort_by(|a, b| a.0.cmp(&b.0));
    ranked.into_iter().map(|(_, c)| c).collect()
}

/// The best candidate, if any survives.
#[must_use]
pub fn best_description<'a>(
    candidates: &'a [DescriptionCandidate],
    coordinate: &LanguageCoordinate,
) -> Option<&'a DescriptionCandidate> {
    candidates
        .iter()
        .filter_map(|c| rank_key(c, coordinate).map(|key| (key, c)))
        .min_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, c)| c)
}

// =============================================================================
// CALCULATOR
// =============================================================================

/// Resolves concept descriptions from a store under a stamp view.
#[derive(Debug)]
pub struct LanguageCalculator<'a> {
    store: &'a SpineStore,
    stamp: StampCalculator,
    coordinate: LanguageCoordinate,
}

impl<'a> LanguageCalculator<'a> {
    #[must_use]
    pub fn new(store: &'a SpineStore, stamp: StampCalculator, coordinate: LanguageCoordinate) -> Self {
        Self {
            store,
            stamp,
            coordinate,
        }
    }

    #[must_use]
    pub fn coordinate(&self) -> &LanguageCoordinate {
        &self.coordinate
    }

    /// Latest visible version of a semantic, if it is one and anything is visible.
    fn latest_semantic(&self, nid: Nid) -> Result<Option<SemanticVersion>, TermstoreError> {
        let Some(entity) = self.store.get_entity(nid)? else {
            return Ok(None);
        };
        let Entity::Semantic(record) = entity else {
            return Err(TermstoreError::InvalidChronology(format!(
                "Expected semantic at {}, found {}",
                nid,
                entity.kind()
            )));
        };
        Ok(self.stamp.latest(&record.versions).into_value())
    }

    /// Every visible description of `concept` matching the coordinate's
    /// patterns, with dialect annotations attached. Unranked.
    pub fn candidates(&self, concept: Nid) -> Result<Vec<DescriptionCandidate>, TermstoreError> {
        let mut candidates = Vec::new();
        for pattern in &self.coordinate.description_patterns {
            for nid in self
                .store
                .semantic_nids_for_component_of_pattern(concept, *pattern)?
            {
                let Some(version) = self.latest_semantic(nid)? else {
                    continue;
                };
                let mut candidate = DescriptionCandidate::from_version(nid, *pattern, &version)?;
                candidate.acceptability = self.acceptability(nid)?;
                candidates.push(candidate);
            }
        }
        Ok(candidates)
    }

    fn acceptability(&self, description: Nid) -> Result<BTreeMap<Nid, Nid>, TermstoreError> {
        let mut acceptability = BTreeMap::new();
        for dialect in &self.coordinate.dialect_patterns {
            for nid in self
                .store
                .semantic_nids_for_component_of_pattern(description, *dialect)?
            {
                let value = self
                    .latest_semantic(nid)?
                    .and_then(|v| v.field(layout::DIALECT_ACCEPTABILITY).and_then(|f| f.as_nid()));
                if let Some(value) = value {
                    acceptability.entry(*dialect).or_insert(value);
                }
            }
        }
        Ok(acceptability)
    }

    /// Best description of `concept`.
    pub fn description(&self, concept: Nid) -> Result<Option<DescriptionCandidate>, TermstoreError> {
        let candidates = self.candidates(concept)?;
        Ok(best_description(&candidates, &self.coordinate).cloned())
    }

    /// Text of the best description of `concept`.
    pub fn description_text(&self, concept: Nid) -> Result<Option<String>, TermstoreError> {
        Ok(self.description(concept)?.map(|d| d.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::presets;

    fn candidate(nid: i32, description_type: Nid, text: &str) -> DescriptionCandidate {
        DescriptionCandidate {
            nid: Nid(nid),
            pattern: terms::DESCRIPTION_PATTERN,
            language: terms::ENGLISH_LANGUAGE,
            description_type,
            case_significance: terms::DESCRIPTION_NOT_CASE_SENSITIVE,
            text: text.to_string(),
            module: terms::SOLOR_MODULE,
            acceptability: BTreeMap::new(),
        }
    }

    #[test]
    fn type_order_beats_creation_order() {
        let fqn = candidate(100, terms::FULLY_QUALIFIED_NAME_DESCRIPTION_TYPE, "Heart (structure)");
        let regular = candidate(101, terms::REGULAR_NAME_DESCRIPTION_TYPE, "Heart");
        let coordinate = presets::language::us_english_regular_name();

        for candidates in [vec![fqn.clone(), regular.clone()], vec![regular.clone(), fqn.clone()]] {
            let best = best_description(&candidates, &coordinate).expect("description");
            assert_eq!(best.text, "Heart");
        }
    }

    #[test]
    fn unlisted_type_and_wrong_language_dropped() {
        let mut spanish = candidate(100, terms::REGULAR_NAME_DESCRIPTION_TYPE, "Corazón");
        spanish.language = terms::SPANISH_LANGUAGE;
        let definition = candidate(101, terms::DEFINITION_DESCRIPTION_TYPE, "Muscular organ");

        let english = presets::language::us_english_regular_name();
        assert!(best_description(&[spanish.clone(), definition.clone()], &english).is_none());

        let any = presets::language::any_language_regular_name();
        let candidates = [spanish, definition];
        let best = best_description(&candidates, &any).expect("wildcard language");
        assert_eq!(best.text, "Corazón");
    }

    #[test]
    fn dialect_preference_ranks() {
        let mut acceptable = candidate(100, terms::REGULAR_NAME_DESCRIPTION_TYPE, "Colour");
        acceptable
            .acceptability
            .insert(terms::US_DIALECT_PATTERN, terms::ACCEPTABLE);
        let mut preferred = candidate(101, terms::REGULAR_NAME_DESCRIPTION_TYPE, "Color");
        preferred
            .acceptability
            .insert(terms::US_DIALECT_PATTERN, terms::PREFERRED);
        let unannotated = candidate(99, terms::REGULAR_NAME_DESCRIPTION_TYPE, "Hue");

        let candidates = [acceptable, preferred, unannotated];
        let ranked = rank_descriptions(&candidates, &presets::language::us_english_regular_name());
        let texts: Vec<&str> = ranked.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Color", "Colour", "Hue"]);
    }

    #[test]
    fn module_order_then_lowest_nid() {
        let mut overlay = candidate(200, terms::REGULAR_NAME_DESCRIPTION_TYPE, "Overlay");
        overlay.module = terms::SOLOR_OVERLAY_MODULE;
        let base = candidate(150, terms::REGULAR_NAME_DESCRIPTION_TYPE, "Base");
        let other = candidate(120, terms::REGULAR_NAME_DESCRIPTION_TYPE, "Other");
        let mut unlisted = candidate(110, terms::REGULAR_NAME_DESCRIPTION_TYPE, "Unlisted");
        unlisted.module = terms::PRIMORDIAL_MODULE;

        let candidates = [base, overlay, other, unlisted];
        let coordinate = presets::language::spanish_preferred_name();
        let english = LanguageCoordinate {
            language: terms::ENGLISH_LANGUAGE,
            ..coordinate
        };
        let ranked = rank_descriptions(&candidates, &english);
        let texts: Vec<&str> = ranked.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Overlay", "Other", "Base", "Unlisted"]);
    }

    #[test]
    fn empty_survivors_none() {
        assert!(best_description(&[], &presets::language::us_english_regular_name()).is_none());
    }
}
