use std::fmt::Debug;
use tokio::time::{Duration, Instant};

use crate::transport::MessageRef;

/// State shared by every multi-step flow: where the flow is, when it last
/// moved, and which chat message renders it.
#[derive(Debug, Clone)]
pub struct Interaction<S> {
    state: S,
    updated_at: Instant,
    anchor: Option<MessageRef>,
}

impl<S: Copy + PartialEq + Debug> Interaction<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            updated_at: Instant::now(),
            anchor: None,
        }
    }

    pub fn with_anchor(state: S, anchor: MessageRef) -> Self {
        Self {
            anchor: Some(anchor),
            ..Self::new(state)
        }
    }
}

/// Anything composed around an [`Interaction`].
///
/// Implementors only expose their interaction; state transitions go through
/// [`Interactive::mutate`], which always refreshes the timestamp.
pub trait Interactive {
    type State: Copy + PartialEq + Debug;

    fn interaction(&self) -> &Interaction<Self::State>;
    fn interaction_mut(&mut self) -> &mut Interaction<Self::State>;

    fn state(&self) -> Self::State {
        self.interaction().state
    }

    fn is(&self, state: Self::State) -> bool {
        self.interaction().state == state
    }

    fn age(&self) -> Duration {
        self.interaction().updated_at.elapsed()
    }

    fn anchor(&self) -> Option<MessageRef> {
        self.interaction().anchor
    }

    /// Advances to `state`. A `None` anchor keeps the current one.
    fn mutate(&mut self, state: Self::State, anchor: Option<MessageRef>) {
        let interaction = self.interaction_mut();
        interaction.state = state;
        interaction.updated_at = Instant::now();
        if anchor.is_some() {
            interaction.anchor = anchor;
        }
    }

    /// Refreshes the timestamp without changing state.
    fn touch(&mut self) {
        self.interaction_mut().updated_at = Instant::now();
    }
}

impl<S: Copy + PartialEq + Debug> Interactive for Interaction<S> {
    type State = S;

    fn interaction(&self) -> &Interaction<S> {
        self
    }

    fn interaction_mut(&mut self) -> &mut Interaction<S> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Step {
        Idle,
        Waiting,
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutate_refreshes_age_and_anchor() {
        let mut flow = Interaction::new(Step::Idle);
        assert!(flow.anchor().is_none());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(flow.age(), Duration::from_secs(30));

        let anchor = MessageRef::new(1, 10);
        flow.mutate(Step::Waiting, Some(anchor));
        assert!(flow.is(Step::Waiting));
        assert_eq!(flow.age(), Duration::ZERO);
        assert_eq!(flow.anchor(), Some(anchor));

        flow.mutate(Step::Idle, None);
        assert_eq!(flow.anchor(), Some(anchor));
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_keeps_state() {
        let mut flow = Interaction::with_anchor(Step::Waiting, MessageRef::new(2, 3));
        tokio::time::advance(Duration::from_secs(5)).await;
        flow.touch();
        assert_eq!(flow.state(), Step::Waiting);
        assert_eq!(flow.age(), Duration::ZERO);
    }
}
