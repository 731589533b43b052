//! The document lifecycle transition table.
//!
//! The table is the single source of truth for which status changes
//! are legal and which permission each one requires. Every (old, new)
//! pair not listed here is rejected, regardless of who asks —
//! permission alone never bypasses topology.

use qualdoc_core::models::document::DocumentStatus;
use qualdoc_core::models::permission::codes;

/// One legal edge in the lifecycle graph.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub from: DocumentStatus,
    pub to: DocumentStatus,
    /// Permission codes that allow this transition — any one grants.
    pub required: &'static [&'static str],
}

/// The fixed set of legal transitions.
pub const TRANSITIONS: &[Transition] = &[
    // Author submits a draft into review.
    Transition {
        from: DocumentStatus::Draft,
        to: DocumentStatus::Reviewed,
        required: &[codes::SUBMIT_FOR_REVIEW],
    },
    // Final approval of a reviewed document.
    Transition {
        from: DocumentStatus::Reviewed,
        to: DocumentStatus::Approved,
        required: &[codes::FINAL_APPROVAL],
    },
    // Rejection back to the author.
    Transition {
        from: DocumentStatus::Reviewed,
        to: DocumentStatus::Draft,
        required: &[codes::FINAL_APPROVAL, codes::DOCUMENT_REVIEW],
    },
    // Retirement of an approved document.
    Transition {
        from: DocumentStatus::Approved,
        to: DocumentStatus::Obsolete,
        required: &[codes::FINAL_APPROVAL],
    },
    // Administrative reactivation of an obsolete document.
    Transition {
        from: DocumentStatus::Obsolete,
        to: DocumentStatus::Draft,
        required: &[codes::FINAL_APPROVAL],
    },
];

/// Look up the transition for an (old, new) pair, if it is legal.
pub fn find(from: DocumentStatus, to: DocumentStatus) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| t.from == from && t.to == to)
}

/// All legal transitions out of a status.
pub fn outgoing(from: DocumentStatus) -> impl Iterator<Item = &'static Transition> {
    TRANSITIONS.iter().filter(move |t| t.from == from)
}
