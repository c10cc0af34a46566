//! Three-valued answers and their ensemble-wide consensus.

use serde::Serialize;

/// A tree's answer to "does this tree treat feature `i` as X?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    True,
    False,
    /// The tree never splits on the feature.
    Undetermined,
}

impl TriState {
    pub fn is_true(self) -> bool {
        self == TriState::True
    }

    pub fn is_undetermined(self) -> bool {
        self == TriState::Undetermined
    }

    /// Combine two answers: `False` dominates, then `True`.
    pub fn combine(self, other: TriState) -> TriState {
        match (self, other) {
            (TriState::False, _) | (_, TriState::False) => TriState::False,
            (TriState::True, _) | (_, TriState::True) => TriState::True,
            (TriState::Undetermined, TriState::Undetermined) => TriState::Undetermined,
        }
    }

    /// Fold a sequence of answers into one consensus.
    ///
    /// Any `False` makes the consensus `False`. Otherwise a single `True`
    /// makes it `True`. An empty sequence, or one made only of
    /// `Undetermined`, stays `Undetermined`.
    pub fn consensus(answers: impl IntoIterator<Item = TriState>) -> TriState {
        let mut result = TriState::Undetermined;
        for answer in answers {
            if answer == TriState::False {
                return TriState::False;
            }
            result = result.combine(answer);
        }
        result
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value {
            TriState::True
        } else {
            TriState::False
        }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        value.map_or(TriState::Undetermined, TriState::from)
    }
}
