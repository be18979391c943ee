/// How far the current inspection session has gone in modifying its object.
///
/// Ordered: `NotModified < ModifyInProgress < Modified`. Within one frame the
/// reports of all child inspectors are combined with [`combine`](Self::combine)
/// (maximum); the session state then [`absorb`](Self::absorb)s that frame
/// aggregate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModificationState {
    #[default]
    NotModified,
    /// A field is being edited and the edit has not been confirmed yet.
    ModifyInProgress,
    /// An edit was committed. Treated as one undoable unit.
    Modified,
}

impl ModificationState {
    pub fn combine(self, other: Self) -> Self {
        self.max(other)
    }

    /// Fold a frame report into the session state.
    ///
    /// A quiet frame leaves the session untouched; any other report replaces
    /// it, so a fresh edit after a commit is in progress again until confirmed.
    pub fn absorb(self, frame: Self) -> Self {
        match frame {
            Self::NotModified => self,
            other => other,
        }
    }

    /// Confirmation (Enter or focus loss) commits an in-progress edit.
    pub fn confirm(self) -> Self {
        match self {
            Self::ModifyInProgress => Self::Modified,
            other => other,
        }
    }

    /// Whether the scene-dirty sink has to hear about this state.
    pub fn marks_dirty(self) -> bool {
        self >= Self::ModifyInProgress
    }

    pub fn aggregate(states: impl IntoIterator<Item = Self>) -> Self {
        states
            .into_iter()
            .fold(Self::NotModified, Self::combine)
    }
}
