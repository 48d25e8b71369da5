//! Standard coordinates.

/// Positions at the head of the standard paths.
pub mod position {
    use crate::coordinate::StampPosition;
    use crate::terms;

    #[must_use]
    pub fn latest_on_development() -> StampPosition {
        StampPosition::latest_on(terms::DEVELOPMENT_PATH)
    }

    #[must_use]
    pub fn latest_on_master() -> StampPosition {
        StampPosition::latest_on(terms::MASTER_PATH)
    }
}

/// Stamp coordinates over the standard paths.
pub mod stamp {
    use super::position;
    use crate::coordinate::{StampCoordinate, StateSet};

    #[must_use]
    pub fn development_latest() -> StampCoordinate {
        StampCoordinate::new(
            StateSet::active_and_inactive(),
            position::latest_on_development(),
        )
    }

    #[must_use]
    pub fn development_latest_active_only() -> StampCoordinate {
        StampCoordinate::new(StateSet::active_only(), position::latest_on_development())
    }

    #[must_use]
    pub fn master_latest() -> StampCoordinate {
        StampCoordinate::new(StateSet::active_and_inactive(), position::latest_on_master())
    }

    #[must_use]
    pub fn master_latest_active_only() -> StampCoordinate {
        StampCoordinate::new(StateSet::active_only(), position::latest_on_master())
    }
}

/// The standard path tree: primordial <- sandbox <- development,
/// primordial <- master.
pub mod path {
    use crate::coordinate::{StampPath, StampPosition};
    use crate::terms;

    #[must_use]
    pub fn primordial() -> StampPath {
        StampPath::root(terms::PRIMORDIAL_PATH)
    }

    #[must_use]
    pub fn sandbox() -> StampPath {
        StampPath::new(
            terms::SANDBOX_PATH,
            [StampPosition::latest_on(terms::PRIMORDIAL_PATH)],
        )
    }

    #[must_use]
    pub fn master() -> StampPath {
        StampPath::new(
            terms::MASTER_PATH,
            [StampPosition::latest_on(terms::PRIMORDIAL_PATH)],
        )
    }

    #[must_use]
    pub fn development() -> StampPath {
        StampPath::new(
            terms::DEVELOPMENT_PATH,
            [StampPosition::latest_on(terms::SANDBOX_PATH)],
        )
    }

    /// All four standard paths.
    #[must_use]
    pub fn standard() -> Vec<StampPath> {
        vec![primordial(), sandbox(), master(), development()]
    }
}

/// Language coordinates.
pub mod language {
    use crate::Nid;
    use crate::coordinate::LanguageCoordinate;
    use crate::terms;

    fn any_language(description_type: Nid) -> LanguageCoordinate {
        LanguageCoordinate {
            language: terms::LANGUAGE,
            description_patterns: vec![terms::DESCRIPTION_PATTERN],
            description_types: vec![description_type],
            dialect_patterns: Vec::new(),
            module_order: Vec::new(),
        }
    }

    fn coordinate(language: Nid, types: [Nid; 2], dialects: Vec<Nid>) -> LanguageCoordinate {
        LanguageCoordinate {
            language,
            description_patterns: vec![terms::DESCRIPTION_PATTERN],
            description_types: types.to_vec(),
            dialect_patterns: dialects,
            module_order: vec![terms::SOLOR_OVERLAY_MODULE, terms::SOLOR_MODULE],
        }
    }

    const FQN_FIRST: [Nid; 2] = [
        terms::FULLY_QUALIFIED_NAME_DESCRIPTION_TYPE,
        terms::REGULAR_NAME_DESCRIPTION_TYPE,
    ];
    const REGULAR_FIRST: [Nid; 2] = [
        terms::REGULAR_NAME_DESCRIPTION_TYPE,
        terms::FULLY_QUALIFIED_NAME_DESCRIPTION_TYPE,
    ];

    /// Regular names in any language; ranks by type and module only.
    #[must_use]
    pub fn any_language_regular_name() -> LanguageCoordinate {
        any_language(terms::REGULAR_NAME_DESCRIPTION_TYPE)
    }

    #[must_use]
    pub fn any_language_fully_qualified_name() -> LanguageCoordinate {
        any_language(terms::FULLY_QUALIFIED_NAME_DESCRIPTION_TYPE)
    }

    #[must_use]
    pub fn any_language_definition() -> LanguageCoordinate {
        any_language(terms::DEFINITION_DESCRIPTION_TYPE)
    }

    /// US English, FQN first, falling back to regular names.
    #[must_use]
    pub fn us_english_fully_qualified_name() -> LanguageCoordinate {
        coordinate(
            terms::ENGLISH_LANGUAGE,
            FQN_FIRST,
            vec![terms::US_DIALECT_PATTERN, terms::GB_DIALECT_PATTERN],
        )
    }

    #[must_use]
    pub fn us_english_regular_name() -> LanguageCoordinate {
        coordinate(
            terms::ENGLISH_LANGUAGE,
            REGULAR_FIRST,
            vec![terms::US_DIALECT_PATTERN, terms::GB_DIALECT_PATTERN],
        )
    }

    #[must_use]
    pub fn gb_english_fully_qualified_name() -> LanguageCoordinate {
        coordinate(
            terms::ENGLISH_LANGUAGE,
            FQN_FIRST,
            vec![terms::GB_DIALECT_PATTERN, terms::US_DIALECT_PATTERN],
        )
    }

    #[must_use]
    pub fn gb_english_preferred_name() -> LanguageCoordinate {
        coordinate(
            terms::ENGLISH_LANGUAGE,
            REGULAR_FIRST,
            vec![terms::GB_DIALECT_PATTERN, terms::US_DIALECT_PATTERN],
        )
    }

    #[must_use]
    pub fn spanish_fully_qualified_name() -> LanguageCoordinate {
        coordinate(terms::SPANISH_LANGUAGE, FQN_FIRST, Vec::new())
    }

    #[must_use]
    pub fn spanish_preferred_name() -> LanguageCoordinate {
        coordinate(terms::SPANISH_LANGUAGE, REGULAR_FIRST, Vec::new())
    }

    /// Preset names accepted by [`by_name`].
    pub const NAMES: [&str; 9] = [
        "any-language-regular-name",
        "any-language-fully-qualified-name",
        "any-language-definition",
        "us-english-fully-qualified-name",
        "us-english-regular-name",
        "gb-english-fully-qualified-name",
        "gb-english-preferred-name",
        "spanish-fully-qualified-name",
        "spanish-preferred-name",
    ];

    /// Look a preset up by its kebab-case name.
    #[must_use]
    pub fn by_name(name: &str) -> Option<LanguageCoordinate> {
        let coordinate = match name {
            "any-language-regular-name" => any_language_regular_name(),
            "any-language-fully-qualified-name" => any_language_fully_qualified_name(),
            "any-language-definition" => any_language_definition(),
            "us-english-fully-qualified-name" => us_english_fully_qualified_name(),
            "us-english-regular-name" => us_english_regular_name(),
            "gb-english-fully-qualified-name" => gb_english_fully_qualified_name(),
            "gb-english-preferred-name" => gb_english_preferred_name(),
            "spanish-fully-qualified-name" => spanish_fully_qualified_name(),
            "spanish-preferred-name" => spanish_preferred_name(),
            _ => return None,
        };
        Some(coordinate)
    }
}
