//! Optimistic local state for mutations whose outcome is shown before the platform confirms it.

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub enum MutationPhase {
    #[default]
    Idle,
    Pending,
    Committed,
    RolledBack,
}

/// Receipt for a tentatively applied change, redeemed with [`Optimistic::commit`] or
/// [`Optimistic::revert`].
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
#[must_use]
pub struct Tentative<S> {
    seq: u64,
    prior: S,
}

impl<S> Tentative<S> {
    pub fn prior(&self) -> &S {
        &self.prior
    }
}

/// Displayed state plus the phase of the most recent change applied to it.
///
/// Only the latest change may settle the state. An older change completing later neither commits
/// nor reverts anything, so the display follows the last toggle the user made.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Optimistic<S> {
    displayed: S,
    phase: MutationPhase,
    latest: u64,
}

impl<S: Clone> Optimistic<S> {
    pub fn new(state: S) -> Self {
        Self {
            displayed: state,
            phase: MutationPhase::Idle,
            latest: 0,
        }
    }

    pub fn displayed(&self) -> &S {
        &self.displayed
    }

    pub fn phase(&self) -> MutationPhase {
        self.phase
    }

    pub fn apply(&mut self, change: impl FnOnce(&S) -> S) -> Tentative<S> {
        self.latest += 1;
        let next = change(&self.displayed);
        let prior = std::mem::replace(&mut self.displayed, next);
        self.phase = MutationPhase::Pending;

        Tentative {
            seq: self.latest,
            prior,
        }
    }

    pub fn commit(&mut self, tentative: Tentative<S>) -> bool {
        if tentative.seq != self.latest {
            return false;
        }

        self.phase = MutationPhase::Committed;
        true
    }

    pub fn revert(&mut self, tentative: Tentative<S>) -> bool {
        if tentative.seq != self.latest {
            return false;
        }

        self.displayed = tentative.prior;
        self.phase = MutationPhase::RolledBack;
        true
    }

    /// Replaces the displayed state with a confirmed one unless a change is still pending.
    pub fn sync(&mut self, confirmed: S) -> bool {
        if self.phase == MutationPhase::Pending {
            return false;
        }

        self.displayed = confirmed;
        self.phase = MutationPhase::Idle;
        true
    }
}

/// What a post card shows about likes.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct LikeState {
    pub liked: bool,
    pub likes: u32,
}

impl LikeState {
    /// The state after the current user flips their like. The count never drops below zero.
    #[must_use]
    pub fn toggled(self) -> Self {
        if self.liked {
            Self {
                liked: false,
                likes: self.likes.saturating_sub(1),
            }
        } else {
            Self {
                liked: true,
                likes: self.likes.saturating_add(1),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::mutation::{LikeState, MutationPhase, Optimistic};

    #[test]
    fn failed_like_restores_prior_count() {
        let mut like = Optimistic::new(LikeState {
            liked: false,
            likes: 5,
        });

        let tentative = like.apply(|state| state.toggled());
        assert_eq!(like.displayed().likes, 6);
        assert_eq!(like.phase(), MutationPhase::Pending);

        assert!(like.revert(tentative));
        assert_eq!(
            *like.displayed(),
            LikeState {
                liked: false,
                likes: 5
            }
        );
        assert_eq!(like.phase(), MutationPhase::RolledBack);
    }

    #[test]
    fn only_the_latest_change_settles() {
        let mut like = Optimistic::new(LikeState {
            liked: false,
            likes: 5,
        });

        let first = like.apply(|state| state.toggled());
        let second = like.apply(|state| state.toggled());
        assert_eq!(like.displayed().likes, 5);

        assert!(!like.revert(first));
        assert_eq!(like.displayed().likes, 5);
        assert_eq!(like.phase(), MutationPhase::Pending);
        assert!(!like.sync(LikeState::default()));

        assert!(like.commit(second));
        assert_eq!(like.phase(), MutationPhase::Committed);
    }

    #[test]
    fn unlike_never_goes_negative() {
        let state = LikeState {
            liked: true,
            likes: 0,
        };

        assert_eq!(
            state.toggled(),
            LikeState {
                liked: false,
                likes: 0
            }
        );
    }
}
