//! Ramus Session Library
//!
//! In-memory sessions tying an uploaded sequence set to the artifacts the
//! analysis pipeline derives from it: the alignment and the trees built
//! with each method.

pub mod store;

pub use store::{
    Session, SessionError, SessionInfo, SessionResult, SessionStore, StoredTree, TreeMethod,
    MIN_SEQUENCES_FOR_TREES,
};
