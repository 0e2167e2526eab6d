//! AI suggestion boundary.
//!
//! Prompt construction and transport are external concerns; this module
//! defines the pure function boundary the engine consumes. A provider
//! receives the target node plus a bounded, cycle-safe neighborhood of
//! related content and returns exactly one typed suggestion.

use crate::board::BoardData;
use crate::layout::related_neighborhood;
use crate::model::ObjectId;
use std::collections::HashSet;
use thiserror::Error;

/// How many edge hops of context accompany a suggestion request.
pub const NEIGHBORHOOD_DEPTH: usize = 2;

/// Errors at the suggestion boundary. Surfaced to the user as a fallback
/// message; the board is left unchanged.
#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("suggestion service unavailable: {0}")]
    Unavailable(String),
    #[error("malformed suggestion response: {0}")]
    Malformed(String),
}

/// A typed suggestion. Exactly one kind per response; the engine matches
/// exhaustively at its single consumption site.
#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion {
    /// Group existing objects under a name.
    GroupProposal {
        name: String,
        member_ids: Vec<ObjectId>,
    },
    /// Connect existing objects.
    EdgeProposal { edges: Vec<(ObjectId, ObjectId)> },
    /// Converge a cluster: objects to keep and objects to remove.
    ConvergenceProposal {
        keep: Vec<ObjectId>,
        remove: Vec<ObjectId>,
    },
    /// New note contents to place around the target.
    GeneratedNotes { contents: Vec<String> },
}

/// Everything a provider sees: the target, its nearby content, and the
/// full graph for context.
#[derive(Debug, Clone)]
pub struct SuggestionRequest<'a> {
    pub target: ObjectId,
    pub target_content: String,
    /// Ids within [`NEIGHBORHOOD_DEPTH`] hops of the target.
    pub neighborhood: Vec<ObjectId>,
    pub board: &'a BoardData,
}

impl<'a> SuggestionRequest<'a> {
    /// Build a request for a target object. Returns `None` when the target
    /// doesn't exist.
    pub fn for_target(board: &'a BoardData, target: ObjectId) -> Option<Self> {
        if !board.contains_object(target) {
            return None;
        }
        let target_content = board
            .note(target)
            .map(|n| n.content.clone())
            .or_else(|| board.image(target).map(|i| i.source.clone()))
            .unwrap_or_default();

        let mut visited = HashSet::new();
        let neighborhood = related_neighborhood(board, target, NEIGHBORHOOD_DEPTH, &mut visited);

        Some(Self {
            target,
            target_content,
            neighborhood,
            board,
        })
    }

    /// Contents of the neighborhood notes, for prompt assembly.
    pub fn neighborhood_contents(&self) -> Vec<&str> {
        self.neighborhood
            .iter()
            .filter_map(|&id| self.board.note(id))
            .map(|n| n.content.as_str())
            .collect()
    }
}

/// The AI collaborator, consumed as a pure function.
pub trait SuggestionProvider {
    fn suggest(&self, request: &SuggestionRequest<'_>) -> Result<Suggestion, SuggestError>;
}
