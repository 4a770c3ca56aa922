use std::fmt;

/// Per-resource lifecycle within one run.
///
/// `Pending -> Probed -> {Skipped | Fetching -> {Recorded | Failed}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Pending,
    Probed,
    Skipped,
    Fetching,
    Recorded,
    Failed,
}

impl ResourceState {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceState::Pending => "PENDING",
            ResourceState::Probed => "PROBED",
            ResourceState::Skipped => "SKIPPED",
            ResourceState::Fetching => "FETCHING",
            ResourceState::Recorded => "RECORDED",
            ResourceState::Failed => "FAILED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ResourceState::Skipped | ResourceState::Recorded | ResourceState::Failed
        )
    }

    /// Whether `self -> next` is an edge of the lifecycle.
    pub fn can_move_to(self, next: ResourceState) -> bool {
        use ResourceState::*;
        matches!(
            (self, next),
            (Pending, Probed)
                | (Probed, Skipped)
                | (Probed, Fetching)
                | (Fetching, Recorded)
                | (Fetching, Failed)
        )
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log a lifecycle step for one resource.
pub(crate) fn transition(identity: &str, from: ResourceState, to: ResourceState) {
    debug_assert!(from.can_move_to(to), "illegal transition {} -> {}", from, to);
    tracing::debug!(identity, from = %from, to = %to, "state");
}
