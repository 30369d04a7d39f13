//! Session store and analysis workflow
//!
//! A session holds one uploaded sequence set and everything derived from
//! it so far. Trees are stored as Newick text, one slot per construction
//! method, so rebuilding with the same method replaces the previous tree.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ramus_core::cluster::ClusterError;
use ramus_core::io::json::{tree_to_json, TreeJson};
use ramus_core::io::newick::{self, NewickError};
use ramus_core::nj::NjError;
use ramus_core::{
    align_many, compare_trees, identity_matrix, ml_tree, neighbor_joining, upgma, AlignError,
    Alignment, ScoringParams, SequenceSet, TreeComparison,
};

/// Sessions refuse sequence sets too small to build an informative tree.
pub const MIN_SEQUENCES_FOR_TREES: usize = 3;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Session already exists: {0}")]
    AlreadyExists(String),
    #[error("At least 3 sequences are required, got {0}")]
    TooFewSequences(usize),
    #[error("Session has no alignment yet")]
    MissingAlignment,
    #[error("No {0} tree built for this session")]
    MissingTree(TreeMethod),
    #[error(transparent)]
    Align(#[from] AlignError),
    #[error(transparent)]
    Cluster(#[from] ClusterError),
    #[error(transparent)]
    Nj(#[from] NjError),
    #[error(transparent)]
    Newick(#[from] NewickError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Tree construction method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeMethod {
    Upgma,
    Nj,
    Ml,
}

impl TreeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreeMethod::Upgma => "upgma",
            TreeMethod::Nj => "nj",
            TreeMethod::Ml => "ml",
        }
    }
}

impl fmt::Display for TreeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A built tree kept in its Newick form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTree {
    pub newick: String,
    pub created_at: DateTime<Utc>,
}

/// One client workspace: uploaded sequences plus derived artifacts.
#[derive(Debug, Clone)]
pub struct Session {
    sequences: SequenceSet,
    alignment: Option<Alignment>,
    trees: HashMap<TreeMethod, StoredTree>,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn sequences(&self) -> &SequenceSet {
        &self.sequences
    }

    pub fn alignment(&self) -> Option<&Alignment> {
        self.alignment.as_ref()
    }

    pub fn tree(&self, method: TreeMethod) -> Option<&StoredTree> {
        self.trees.get(&method)
    }

    /// Methods with a stored tree, in method order.
    pub fn tree_methods(&self) -> Vec<TreeMethod> {
        let mut methods: Vec<TreeMethod> = self.trees.keys().copied().collect();
        methods.sort();
        methods
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Summary of one session, shaped for listing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub sequence_count: usize,
    pub aligned: bool,
    pub trees: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// All live sessions, keyed by caller-chosen id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
    ml_seed: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the seed used when decorating maximum likelihood trees.
    pub fn with_ml_seed(mut self, seed: u64) -> Self {
        self.ml_seed = seed;
        self
    }

    /// Register a new session around an uploaded sequence set.
    pub fn create_session(&mut self, id: &str, sequences: SequenceSet) -> SessionResult<()> {
        if self.sessions.contains_key(id) {
            return Err(SessionError::AlreadyExists(id.to_string()));
        }
        if sequences.len() < MIN_SEQUENCES_FOR_TREES {
            return Err(SessionError::TooFewSequences(sequences.len()));
        }
        log::debug!("creating session {} with {} sequences", id, sequences.len());
        self.sessions.insert(
            id.to_string(),
            Session {
                sequences,
                alignment: None,
                trees: HashMap::new(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Run the progressive aligner over the session's sequences and store
    /// the result, replacing any previous alignment.
    pub fn align(&mut self, id: &str, params: &ScoringParams) -> SessionResult<&Alignment> {
        let session = self.session_mut(id)?;
        let alignment = align_many(&session.sequences, params)?;
        log::debug!(
            "aligned session {}: {} rows, width {}",
            id,
            alignment.len(),
            alignment.width()
        );
        Ok(session.alignment.insert(alignment))
    }

    /// Build a tree with the given method from the stored alignment and
    /// keep it as Newick text under that method's slot.
    pub fn build_tree(&mut self, id: &str, method: TreeMethod) -> SessionResult<&StoredTree> {
        let ml_seed = self.ml_seed;
        let session = self.session_mut(id)?;
        let alignment = session
            .alignment
            .as_ref()
            .ok_or(SessionError::MissingAlignment)?;

        let matrix = identity_matrix(alignment);
        let tree = match method {
            TreeMethod::Upgma => upgma(&matrix)?,
            TreeMethod::Nj => neighbor_joining(&matrix)?,
            TreeMethod::Ml => ml_tree(&matrix, ml_seed)?,
        };
        log::debug!("built {} tree for session {}", method, id);

        let stored = StoredTree {
            newick: newick::write(&tree),
            created_at: Utc::now(),
        };
        Ok(match session.trees.entry(method) {
            Entry::Occupied(mut slot) => {
                slot.insert(stored);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(stored),
        })
    }

    /// Compare two of the session's stored trees.
    pub fn compare(
        &self,
        id: &str,
        first: TreeMethod,
        second: TreeMethod,
    ) -> SessionResult<TreeComparison> {
        let session = self.session(id)?;
        let tree1 = newick::parse(&Self::stored_tree(session, first)?.newick)?;
        let tree2 = newick::parse(&Self::stored_tree(session, second)?.newick)?;
        Ok(compare_trees(&tree1, &tree2))
    }

    /// A stored tree in the nested JSON layout used by renderers.
    pub fn tree_json(&self, id: &str, method: TreeMethod) -> SessionResult<TreeJson> {
        let session = self.session(id)?;
        let tree = newick::parse(&Self::stored_tree(session, method)?.newick)?;
        Ok(tree_to_json(&tree))
    }

    /// The stored Newick text for a method.
    pub fn newick(&self, id: &str, method: TreeMethod) -> SessionResult<&str> {
        let session = self.session(id)?;
        Ok(Self::stored_tree(session, method)?.newick.as_str())
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn session_info(&self, id: &str) -> SessionResult<SessionInfo> {
        let session = self.session(id)?;
        Ok(Self::info(id, session))
    }

    /// Summaries of all sessions, ordered by id.
    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<SessionInfo> = self
            .sessions
            .iter()
            .map(|(id, session)| Self::info(id, session))
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    pub fn remove_session(&mut self, id: &str) -> SessionResult<()> {
        match self.sessions.remove(id) {
            Some(_) => Ok(()),
            None => Err(SessionError::NotFound(id.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn session(&self, id: &str) -> SessionResult<&Session> {
        self.sessions
            .get(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn session_mut(&mut self, id: &str) -> SessionResult<&mut Session> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn stored_tree(session: &Session, method: TreeMethod) -> SessionResult<&StoredTree> {
        session
            .trees
            .get(&method)
            .ok_or(SessionError::MissingTree(method))
    }

    fn info(id: &str, session: &Session) -> SessionInfo {
        SessionInfo {
            id: id.to_string(),
            sequence_count: session.sequences.len(),
            aligned: session.alignment.is_some(),
            trees: session
                .tree_methods()
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            created_at: session.created_at,
        }
    }
}
