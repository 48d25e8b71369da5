use serde::{Deserialize, Serialize};

/// Result of latest-version resolution.
///
/// `value` is the chosen version; `contradictions` holds versions that tied
/// with it (same time, same path distance) and lost only the deterministic
/// tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Latest<V> {
    value: Option<V>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    contradictions: Vec<V>,
}

impl<V> Latest<V> {
    /// Nothing visible.
    #[must_use]
    pub fn absent() -> Self {
        Self {
            value: None,
            contradictions: Vec::new(),
        }
    }

    #[must_use]
    pub fn of(value: V) -> Self {
        Self {
            value: Some(value),
            contradictions: Vec::new(),
        }
    }

    #[must_use]
    pub fn contested(value: V, contradictions: Vec<V>) -> Self {
        Self {
            value: Some(value),
            contradictions,
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    #[must_use]
    pub fn into_value(self) -> Option<V> {
        self.value
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    #[must_use]
    pub fn contradictions(&self) -> &[V] {
        &self.contradictions
    }

    #[must_use]
    pub fn is_contradicted(&self) -> bool {
        !self.contradictions.is_empty()
    }

    /// The value, unless it tied with another version.
    #[must_use]
    pub fn uncontested(&self) -> Option<&V> {
        if self.is_contradicted() {
            None
        } else {
            self.value()
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(V) -> U) -> Latest<U> {
        Latest {
            value: self.value.map(&mut f),
            contradictions: self.contradictions.into_iter().map(f).collect(),
        }
    }
}

impl<V> Default for Latest<V> {
    fn default() -> Self {
        Self::absent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncontested_fails_closed() {
        assert_eq!(Latest::of(1).uncontested(), Some(&1));
        let contested = Latest::contested(1, vec![2]);
        assert_eq!(contested.value(), Some(&1));
        assert_eq!(contested.uncontested(), None);
        assert!(Latest::<i32>::absent().uncontested().is_none());
    }

    #[test]
    fn map_keeps_contradictions() {
        let mapped = Latest::contested(1, vec![2, 3]).map(|v| v * 10);
        assert_eq!(mapped.value(), Some(&10));
        assert_eq!(mapped.contradictions(), &[20, 30]);
    }
}
