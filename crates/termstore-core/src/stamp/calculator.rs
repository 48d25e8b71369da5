use super::path::{PathBound, PathRegistry};
use super::{Latest, RelativePosition};
use crate::coordinate::{StampCoordinate, StampPosition};
use crate::entity::{Entity, EntityVersion, Versioned};
use crate::{Nid, Stamp, Status, TermstoreError};
use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;

/// Resolves versions against one stamp coordinate.
///
/// The effective path set is computed once at construction; every query
/// after that is a pure function of its input versions.
#[derive(Debug, Clone)]
pub struct StampCalculator {
    coordinate: StampCoordinate,
    registry: PathRegistry,
    bounds: BTreeMap<Nid, PathBound>,
}

impl StampCalculator {
    pub fn new(
        coordinate: StampCoordinate,
        registry: &PathRegistry,
    ) -> Result<Self, TermstoreError> {
        let bounds = registry.ancestry(coordinate.position)?;
        Ok(Self {
            coordinate,
            registry: registry.clone(),
            bounds,
        })
    }

    #[must_use]
    pub fn coordinate(&self) -> &StampCoordinate {
        &self.coordinate
    }

    /// Path distance of a stamp visible under this coordinate, ignoring status.
    fn distance(&self, stamp: &Stamp) -> Option<u32> {
        if self.coordinate.excludes_module(stamp.module) {
            return None;
        }
        self.bounds
            .get(&stamp.path)
            .filter(|bound| stamp.time <= bound.time)
            .map(|bound| bound.distance)
    }

    /// On an effective path, within its bound, module not excluded.
    #[must_use]
    pub fn is_visible(&self, stamp: &Stamp) -> bool {
        self.distance(stamp).is_some()
    }

    /// Every visible version, oldest first.
    pub fn visible_versions<V: Versioned + Clone>(&self, versions: &[V]) -> Vec<V> {
        let mut visible: Vec<V> = versions
            .iter()
            .filter(|v| self.is_visible(v.stamp()))
            .cloned()
            .collect();
        visible.sort_by(|a, b| {
            a.stamp()
                .time
                .cmp(&b.stamp().time)
                .then_with(|| a.stamp().cmp(b.stamp()))
        });
        visible
    }

    /// Latest visible version, before the status filter.
    fn pick<V: Versioned + Clone>(&self, versions: &[V]) -> Latest<V> {
        let mut best: Option<(i64, Reverse<u32>)> = None;
        let mut tied: Vec<&V> = Vec::new();
        for version in versions {
            let Some(distance) = self.distance(version.stamp()) else {
                continue;
            };
            let key = (version.stamp().time, Reverse(distance));
            match best {
                Some(current) if key < current => {}
                Some(current) if key == current => tied.push(version),
                _ => {
                    best = Some(key);
                    tied.clear();
                    tied.push(version);
                }
            }
        }

        // Largest stamp wins a tie, then the largest encoding.
        let Some(winner_index) = tied
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| tie_order(**a, **b))
            .map(|(i, _)| i)
        else {
            return Latest::absent();
        };
        let winner = tied.remove(winner_index).clone();
        if tied.is_empty() {
            return Latest::of(winner);
        }

        tracing::debug!(
            time = winner.stamp().time,
            path = %winner.stamp().path,
            tied = tied.len(),
            "Contradictory latest versions"
        );
        let mut contradictions: Vec<V> = tied.into_iter().cloned().collect();
        contradictions.sort_by(|a, b| tie_order(b, a));
        Latest::contested(winner, contradictions)
    }

    /// The latest visible version, absent when its status is not allowed.
    pub fn latest<V: Versioned + Clone>(&self, versions: &[V]) -> Latest<V> {
        let latest = self.pick(versions);
        let allowed = latest
            .value()
            .is_some_and(|version| self.coordinate.allows(version.stamp().status));
        if allowed { latest } else { Latest::absent() }
    }

    pub fn latest_entity_version(&self, entity: &Entity) -> Latest<EntityVersion> {
        self.latest(&entity.versions())
    }

    /// True when the latest visible version is active, whatever the
    /// coordinate's state set.
    pub fn is_latest_active<V: Versioned + Clone>(&self, versions: &[V]) -> bool {
        self.pick(versions)
            .value()
            .is_some_and(|v| v.stamp().status == Status::Active)
    }

    /// Order of two stamps in path history.
    ///
    /// `Before` when `a` is visible from `b`'s position, `After` for the
    /// converse, `Contradiction` for edits on branches sharing an ancestor
    /// that cannot see each other, `Unreachable` otherwise.
    pub fn relative_position(
        &self,
        a: &Stamp,
        b: &Stamp,
    ) -> Result<RelativePosition, TermstoreError> {
        if a.path == b.path {
            return Ok(match a.time.cmp(&b.time) {
                Ordering::Less => RelativePosition::Before,
                Ordering::Greater => RelativePosition::After,
                Ordering::Equal => RelativePosition::Equal,
            });
        }

        let from_a = self.registry.ancestry(StampPosition::new(a.time, a.path))?;
        let from_b = self.registry.ancestry(StampPosition::new(b.time, b.path))?;

        let sees = |ancestry: &BTreeMap<Nid, PathBound>, stamp: &Stamp| {
            ancestry
                .get(&stamp.path)
                .is_some_and(|bound| stamp.time <= bound.time)
        };
        if sees(&from_b, a) {
            return Ok(RelativePosition::Before);
        }
        if sees(&from_a, b) {
            return Ok(RelativePosition::After);
        }

        // Neither sees the other: parallel branches, or no common history.
        let full_a = self.registry.ancestry(StampPosition::latest_on(a.path))?;
        let full_b = self.registry.ancestry(StampPosition::latest_on(b.path))?;
        if full_a.keys().any(|path| full_b.contains_key(path)) {
            Ok(RelativePosition::Contradiction)
        } else {
            Ok(RelativePosition::Unreachable)
        }
    }
}

/// Total order over versions tied on time and path distance.
fn tie_order<V: Versioned>(a: &V, b: &V) -> Ordering {
    a.stamp()
        .cmp(b.stamp())
        .then_with(|| a.version_bytes().cmp(&b.version_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::{StampPath, StateSet, presets};
    use crate::primitives::PREMUNDANE_TIME;
    use crate::terms;

    fn stamp(status: Status, time: i64, path: Nid) -> Stamp {
        Stamp::new(status, time, terms::USER, terms::SOLOR_MODULE, path)
    }

    fn calculator(coordinate: StampCoordinate) -> StampCalculator {
        let registry = PathRegistry::standard().expect("standard paths");
        StampCalculator::new(coordinate, &registry).expect("calculator")
    }

    #[test]
    fn inactive_latest_hides_older_active() {
        let versions = [
            stamp(Status::Active, 100, terms::MASTER_PATH),
            stamp(Status::Inactive, 200, terms::MASTER_PATH),
        ];
        let both = presets::stamp::master_latest();

        let at_150 = calculator(both.at_time(150)).latest(&versions);
        assert_eq!(at_150.value().map(|s| s.time), Some(100));

        let at_250 = calculator(both.at_time(250)).latest(&versions);
        assert_eq!(at_250.value().map(|s| s.time), Some(200));

        let active_only = calculator(both.at_time(250).with_states(StateSet::active_only()));
        assert!(!active_only.latest(&versions).is_present());
        assert!(!active_only.is_latest_active(&versions));
    }

    #[test]
    fn ancestor_versions_visible_until_origin() {
        let registry = PathRegistry::new([
            presets::path::primordial(),
            StampPath::new(
                terms::MASTER_PATH,
                [StampPosition::new(100, terms::PRIMORDIAL_PATH)],
            ),
        ])
        .expect("registry");
        let calc = StampCalculator::new(presets::stamp::master_latest(), &registry)
            .expect("calculator");
        assert!(calc.is_visible(&stamp(Status::Active, 100, terms::PRIMORDIAL_PATH)));
        assert!(!calc.is_visible(&stamp(Status::Active, 101, terms::PRIMORDIAL_PATH)));
    }

    #[test]
    fn closer_path_wins_equal_time() {
        let versions = [
            stamp(Status::Active, 100, terms::PRIMORDIAL_PATH),
            stamp(Status::Inactive, 100, terms::MASTER_PATH),
        ];
        let latest = calculator(presets::stamp::master_latest()).latest(&versions);
        assert_eq!(latest.value().map(|s| s.path), Some(terms::MASTER_PATH));
        assert!(!latest.is_contradicted());
    }

    #[test]
    fn equal_time_same_path_is_contradiction() {
        let a = stamp(Status::Active, 100, terms::MASTER_PATH);
        let b = Stamp::new(
            Status::Active,
            100,
            terms::USER,
            terms::SOLOR_OVERLAY_MODULE,
            terms::MASTER_PATH,
        );
        let calc = calculator(presets::stamp::master_latest());
        let forward = calc.latest(&[a, b]);
        let backward = calc.latest(&[b, a]);
        assert_eq!(forward, backward);
        assert_eq!(forward.value(), Some(&b));
        assert_eq!(forward.contradictions(), &[a]);
        assert!(forward.uncontested().is_none());
    }

    #[test]
    fn same_stamp_versions_resolve_by_encoding() {
        use crate::entity::{Field, SemanticVersion};

        let shared = stamp(Status::Active, 100, terms::MASTER_PATH);
        let text = |value: &str| SemanticVersion {
            stamp: shared,
            fields: vec![Field::Text(value.to_string())],
        };
        let (left, right) = (text("left"), text("right"));
        let calc = calculator(presets::stamp::master_latest());

        let forward = calc.latest(&[left.clone(), right.clone()]);
        let backward = calc.latest(&[right.clone(), left.clone()]);
        assert_eq!(forward, backward);
        assert_eq!(forward.value(), Some(&right));
        assert_eq!(forward.contradictions(), &[left]);
    }

    #[test]
    fn excluded_module_invisible() {
        let versions = [stamp(Status::Active, 100, terms::MASTER_PATH)];
        let coordinate = presets::stamp::master_latest().excluding_modules([terms::SOLOR_MODULE]);
        assert!(!calculator(coordinate).latest(&versions).is_present());
    }

    #[test]
    fn visible_versions_time_ordered() {
        let versions = [
            stamp(Status::Active, 300, terms::MASTER_PATH),
            stamp(Status::Active, 100, terms::MASTER_PATH),
            stamp(Status::Active, 200, terms::DEVELOPMENT_PATH),
        ];
        let visible = calculator(presets::stamp::master_latest()).visible_versions(&versions);
        let times: Vec<i64> = visible.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![100, 300]);
    }

    #[test]
    fn relative_positions() {
        let calc = calculator(presets::stamp::master_latest());
        let early = stamp(Status::Active, 100, terms::MASTER_PATH);
        let late = stamp(Status::Active, 200, terms::MASTER_PATH);
        let primordial = stamp(Status::Primordial, PREMUNDANE_TIME, terms::PRIMORDIAL_PATH);
        let development = stamp(Status::Active, 150, terms::DEVELOPMENT_PATH);

        let position = |a: &Stamp, b: &Stamp| calc.relative_position(a, b).expect("position");

        assert_eq!(position(&early, &late), RelativePosition::Before);
        assert_eq!(position(&late, &early), RelativePosition::After);
        assert_eq!(position(&early, &early), RelativePosition::Equal);
        assert_eq!(position(&primordial, &early), RelativePosition::Before);
        assert_eq!(
            position(&development, &early),
            RelativePosition::Contradiction
        );
    }

    #[test]
    fn unknown_path_is_error() {
        let registry = PathRegistry::standard().expect("standard paths");
        let coordinate = presets::stamp::master_latest().on_path(Nid(99));
        assert!(matches!(
            StampCalculator::new(coordinate, &registry),
            Err(TermstoreError::UnknownPath(Nid(99)))
        ));
    }
}
