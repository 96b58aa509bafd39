//! Lane markers, one per graph column per row.
//!
//! The marker set is the renderer contract: a row's lane sequence tells
//! the view what to draw in each column (a commit node, a passing line,
//! a fork tail, a merge head, ...). The `*L`/`*R` variants mark the left
//! and right endpoints of a multi-lane fork or merge span.

use serde::{Deserialize, Serialize};

/// What a single lane holds at a given row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneType {
    Empty,
    Active,
    NotActive,
    MergeFork,
    MergeForkR,
    MergeForkL,
    Join,
    JoinR,
    JoinL,
    Head,
    HeadR,
    HeadL,
    Tail,
    TailR,
    TailL,
    Cross,
    CrossEmpty,
    Initial,
    Branch,
    Unapplied,
    Applied,
    Boundary,
    BoundaryC,
    BoundaryR,
    BoundaryL,
}

impl LaneType {
    /// Lanes that carry the commit node of their row.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Active
                | Self::Initial
                | Self::Branch
                | Self::MergeFork
                | Self::MergeForkR
                | Self::MergeForkL
        )
    }

    pub fn is_head(self) -> bool {
        matches!(self, Self::Head | Self::HeadR | Self::HeadL)
    }

    pub fn is_tail(self) -> bool {
        matches!(self, Self::Tail | Self::TailR | Self::TailL)
    }

    pub fn is_join(self) -> bool {
        matches!(self, Self::Join | Self::JoinR | Self::JoinL)
    }

    pub fn is_boundary(self) -> bool {
        matches!(
            self,
            Self::Boundary | Self::BoundaryC | Self::BoundaryR | Self::BoundaryL
        )
    }

    /// Lanes that draw nothing a new branch could not take over.
    pub fn is_free(self) -> bool {
        matches!(self, Self::Empty | Self::CrossEmpty)
    }
}
