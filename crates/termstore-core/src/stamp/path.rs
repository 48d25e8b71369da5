//! Path registry and ancestry.

use crate::coordinate::{StampPath, StampPosition, presets};
use crate::primitives::MAX_PATH_CLOSURE;
use crate::{Nid, TermstoreError};
use std::collections::{BTreeMap, VecDeque};

/// How far back a path is visible from a queried position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathBound {
    /// Latest visible time on this path (inclusive).
    pub time: i64,
    /// Origin hops from the queried path; 0 for the queried path itself.
    pub distance: u32,
}

/// All registered paths. Validated acyclic and closed under origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRegistry {
    paths: BTreeMap<Nid, StampPath>,
}

impl PathRegistry {
    /// Register `paths`. Origins listed for the same path twice are unioned.
    ///
    /// Fails with `UnknownPath` for an origin nobody registered and with
    /// `PathCycle` when a path is its own ancestor.
    pub fn new(paths: impl IntoIterator<Item = StampPath>) -> Result<Self, TermstoreError> {
        let mut registered: BTreeMap<Nid, StampPath> = BTreeMap::new();
        for path in paths {
            path.path.check()?;
            registered
                .entry(path.path)
                .or_insert_with(|| StampPath::root(path.path))
                .origins
                .extend(path.origins);
        }

        for path in registered.values() {
            for origin in &path.origins {
                if !registered.contains_key(&origin.path) {
                    return Err(TermstoreError::UnknownPath(origin.path));
                }
            }
        }

        let registry = Self { paths: registered };
        registry.check_acyclic()?;
        Ok(registry)
    }

    /// Primordial, sandbox, master and development.
    pub fn standard() -> Result<Self, TermstoreError> {
        Self::new(presets::path::standard())
    }

    #[must_use]
    pub fn get(&self, path: Nid) -> Option<&StampPath> {
        self.paths.get(&path)
    }

    #[must_use]
    pub fn contains(&self, path: Nid) -> bool {
        self.paths.contains_key(&path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &StampPath> + '_ {
        self.paths.values()
    }

    // Iterative three-colour DFS over origin edges.
    fn check_acyclic(&self) -> Result<(), TermstoreError> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Open,
            Done,
        }

        let mut marks: BTreeMap<Nid, Mark> = BTreeMap::new();
        for start in self.paths.keys() {
            if marks.contains_key(start) {
                continue;
            }
            // (path, index of the next origin to visit)
            let mut stack: Vec<(Nid, usize)> = vec![(*start, 0)];
            marks.insert(*start, Mark::Open);

            while let Some((path, next)) = stack.pop() {
                let origins: Vec<Nid> = self
                    .paths
                    .get(&path)
                    .map(|p| p.origins.iter().map(|o| o.path).collect())
                    .unwrap_or_default();
                let Some(origin) = origins.get(next).copied() else {
                    marks.insert(path, Mark::Done);
                    continue;
                };
                stack.push((path, next + 1));
                match marks.get(&origin) {
                    Some(Mark::Open) => return Err(TermstoreError::PathCycle(origin)),
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(origin, Mark::Open);
                        stack.push((origin, 0));
                    }
                }
            }
        }
        Ok(())
    }

    /// Paths visible from `position`, with their time bound and distance.
    ///
    /// The bound inherited through an origin `(t, ancestor)` is
    /// `min(bound(child), t)`. When several routes reach the same ancestor
    /// the largest bound and the smallest distance are kept.
    pub fn ancestry(
        &self,
        position: StampPosition,
    ) -> Result<BTreeMap<Nid, PathBound>, TermstoreError> {
        if !self.contains(position.path) {
            return Err(TermstoreError::UnknownPath(position.path));
        }

        let mut bounds: BTreeMap<Nid, PathBound> = BTreeMap::new();
        bounds.insert(
            position.path,
            PathBound {
                time: position.time,
                distance: 0,
            },
        );
        let mut work: VecDeque<Nid> = VecDeque::from([position.path]);
        let mut steps = 0usize;

        while let Some(path) = work.pop_front() {
            steps += 1;
            if steps > MAX_PATH_CLOSURE {
                return Err(TermstoreError::InvalidConfig(format!(
                    "Closure of path {} exceeds {} steps",
                    position.path, MAX_PATH_CLOSURE
                )));
            }
            let Some(current) = bounds.get(&path).copied() else {
                continue;
            };
            let Some(stamp_path) = self.paths.get(&path) else {
                return Err(TermstoreError::UnknownPath(path));
            };
            for origin in &stamp_path.origins {
                let inherited = PathBound {
                    time: current.time.min(origin.time),
                    distance: current.distance + 1,
                };
                let improved = match bounds.get_mut(&origin.path) {
                    None => {
                        bounds.insert(origin.path, inherited);
                        true
                    }
                    Some(existing) => {
                        let wider = inherited.time > existing.time;
                        let closer = inherited.distance < existing.distance;
                        existing.time = existing.time.max(inherited.time);
                        existing.distance = existing.distance.min(inherited.distance);
                        wider || closer
                    }
                };
                if improved {
                    work.push_back(origin.path);
                }
            }
        }
        Ok(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms;

    fn path(nid: i32, origins: &[(i64, i32)]) -> StampPath {
        StampPath::new(
            Nid(nid),
            origins.iter().map(|(t, p)| StampPosition::new(*t, Nid(*p))),
        )
    }

    #[test]
    fn standard_registry_is_valid() {
        let registry = PathRegistry::standard().expect("standard paths");
        let ancestry = registry
            .ancestry(StampPosition::latest_on(terms::DEVELOPMENT_PATH))
            .expect("ancestry");
        let paths: Vec<Nid> = ancestry.keys().copied().collect();
        assert_eq!(
            paths,
            vec![
                terms::PRIMORDIAL_PATH,
                terms::SANDBOX_PATH,
                terms::DEVELOPMENT_PATH
            ]
        );
        assert_eq!(ancestry[&terms::PRIMORDIAL_PATH].distance, 2);
    }

    #[test]
    fn origin_time_bounds_ancestor() {
        let registry = PathRegistry::new([path(1, &[]), path(2, &[(100, 1)])]).expect("registry");
        let ancestry = registry
            .ancestry(StampPosition::new(500, Nid(2)))
            .expect("ancestry");
        assert_eq!(ancestry[&Nid(2)].time, 500);
        assert_eq!(ancestry[&Nid(1)].time, 100);

        let early = registry
            .ancestry(StampPosition::new(50, Nid(2)))
            .expect("ancestry");
        assert_eq!(early[&Nid(1)].time, 50);
    }

    #[test]
    fn diamond_keeps_widest_bound_and_shortest_distance() {
        // 4 -> 2 (t=300) -> 1 (t=100); 4 -> 3 (t=200) -> 1 (t=250); 4 -> 1 (t=10)
        let registry = PathRegistry::new([
            path(1, &[]),
            path(2, &[(100, 1)]),
            path(3, &[(250, 1)]),
            path(4, &[(300, 2), (200, 3), (10, 1)]),
        ])
        .expect("registry");
        let ancestry = registry
            .ancestry(StampPosition::latest_on(Nid(4)))
            .expect("ancestry");
        assert_eq!(ancestry[&Nid(1)].time, 200);
        assert_eq!(ancestry[&Nid(1)].distance, 1);
    }

    #[test]
    fn unknown_origin_rejected() {
        let err = PathRegistry::new([path(2, &[(100, 9)])]).expect_err("dangling origin");
        assert!(matches!(err, TermstoreError::UnknownPath(Nid(9))));
    }

    #[test]
    fn cycle_rejected() {
        let err = PathRegistry::new([
            path(1, &[(5, 3)]),
            path(2, &[(5, 1)]),
            path(3, &[(5, 2)]),
        ])
        .expect_err("cycle");
        assert!(matches!(err, TermstoreError::PathCycle(_)));

        let err = PathRegistry::new([path(1, &[(5, 1)])]).expect_err("self origin");
        assert!(matches!(err, TermstoreError::PathCycle(Nid(1))));
    }

    #[test]
    fn unknown_query_path_rejected() {
        let registry = PathRegistry::standard().expect("standard paths");
        assert!(matches!(
            registry.ancestry(StampPosition::latest_on(Nid(99))),
            Err(TermstoreError::UnknownPath(Nid(99)))
        ));
    }

    #[test]
    fn oversized_closure_is_config_error() {
        let last = MAX_PATH_CLOSURE as i32 + 1;
        let chain = (1..=last).map(|nid| {
            if nid == 1 {
                path(nid, &[])
            } else {
                path(nid, &[(1_000, nid - 1)])
            }
        });
        let registry = PathRegistry::new(chain).expect("acyclic chain");
        let err = registry
            .ancestry(StampPosition::latest_on(Nid(last)))
            .expect_err("step budget");
        assert!(matches!(err, TermstoreError::InvalidConfig(_)));
    }
}
