//! Shared test utilities for the `git` module.

use std::cell::RefCell;

use crate::error::{VcsError, VcsResult};
use crate::git::vcs::{FileChange, VcsQuery};

/// Identifier the fake reports for HEAD unless overridden.
pub(crate) const FAKE_HEAD_ID: &str = "c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00";

/// In-memory [`VcsQuery`] with a single pre-programmed HEAD commit.
///
/// Every query is recorded so tests can assert on the order the analyzer
/// issues them. Errors configured with [`failing_message`](Self::failing_message)
/// or [`failing_diff`](Self::failing_diff) are returned once.
pub(crate) struct FakeVcs {
    pub(crate) id: String,
    message: String,
    parents: Vec<String>,
    changes: Vec<FileChange>,
    message_error: RefCell<Option<VcsError>>,
    diff_error: RefCell<Option<VcsError>>,
    queries: RefCell<Vec<&'static str>>,
}

impl FakeVcs {
    /// Creates a root commit with the given message and no file changes.
    pub(crate) fn new(message: &str) -> Self {
        Self {
            id: FAKE_HEAD_ID.to_string(),
            message: message.to_string(),
            parents: Vec::new(),
            changes: Vec::new(),
            message_error: RefCell::new(None),
            diff_error: RefCell::new(None),
            queries: RefCell::new(Vec::new()),
        }
    }

    /// Creates a fake whose HEAD message query fails.
    pub(crate) fn failing_message(error: VcsError) -> Self {
        let fake = Self::new("");
        *fake.message_error.borrow_mut() = Some(error);
        fake
    }

    pub(crate) fn with_parents(mut self, parents: &[&str]) -> Self {
        self.parents = parents.iter().map(|p| (*p).to_string()).collect();
        self
    }

    pub(crate) fn with_changes(mut self, changes: Vec<FileChange>) -> Self {
        self.changes = changes;
        self
    }

    pub(crate) fn failing_diff(self, error: VcsError) -> Self {
        *self.diff_error.borrow_mut() = Some(error);
        self
    }

    /// Returns the names of the queries issued so far, in order.
    pub(crate) fn queries(&self) -> Vec<&'static str> {
        self.queries.borrow().clone()
    }

    fn record(&self, query: &'static str) {
        self.queries.borrow_mut().push(query);
    }
}

impl VcsQuery for FakeVcs {
    fn head_message(&self) -> VcsResult<String> {
        self.record("head_message");
        match self.message_error.borrow_mut().take() {
            Some(error) => Err(error),
            None => Ok(self.message.clone()),
        }
    }

    fn commit_id(&self, reference: &str) -> VcsResult<String> {
        self.record("commit_id");
        if reference == "HEAD" {
            Ok(self.id.clone())
        } else {
            Err(VcsError::query_failed(
                format!("resolve {reference}"),
                "unknown reference",
            ))
        }
    }

    fn parents(&self, _commit_id: &str) -> VcsResult<Vec<String>> {
        self.record("parents");
        Ok(self.parents.clone())
    }

    fn name_status_diff(&self, _commit_id: &str) -> VcsResult<Vec<FileChange>> {
        self.record("name_status_diff");
        match self.diff_error.borrow_mut().take() {
            Some(error) => Err(error),
            None => Ok(self.changes.clone()),
        }
    }
}
