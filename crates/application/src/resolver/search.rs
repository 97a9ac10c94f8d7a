use std::collections::VecDeque;

use ferrous_resolver_domain::{domain_name, ResolveError, Response};
use tracing::debug;

use super::OperationHandle;
use crate::ports::Handler;

/// Who receives an operation's terminal result.
pub(crate) enum Completion {
    Direct(Box<dyn Handler>),
    Search(SearchFallback),
}

impl Completion {
    pub(crate) fn is_search(&self) -> bool {
        matches!(self, Completion::Search(_))
    }

    /// Puts the handler behind a search fallback for `base`. Returns the
    /// completion and the first name to query.
    pub(crate) fn into_search(self, base: &str, suffixes: &[String]) -> (Self, String) {
        match self {
            Completion::Direct(handler) => {
                let (search, first) = SearchFallback::new(handler, base, suffixes);
                (Completion::Search(search), first)
            }
            search @ Completion::Search(_) => (search, base.to_string()),
        }
    }

    pub(crate) fn deliver(self, handle: OperationHandle, outcome: Result<Response, ResolveError>) {
        let mut handler = match self {
            Completion::Direct(handler) => handler,
            Completion::Search(search) => search.handler,
        };
        match outcome {
            Ok(response) => handler.on_success(handle, response),
            Err(error) => handler.on_failure(handle, error),
        }
    }
}

/// What to do after a sub-query failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Next {
    /// Issue another sub-query for this name.
    Retry(String),
    /// Hand the failure to the user handler.
    Deliver,
}

/// Runs a relative name through the search suffixes, one sub-query at a
/// time, then the bare name as last resort.
pub(crate) struct SearchFallback {
    handler: Box<dyn Handler>,
    base: String,
    remaining: VecDeque<String>,
    bare_issued: bool,
}

impl SearchFallback {
    /// Returns the fallback and the first name to query.
    pub(crate) fn new(handler: Box<dyn Handler>, base: &str, suffixes: &[String]) -> (Self, String) {
        let mut search = Self {
            handler,
            base: base.to_string(),
            remaining: suffixes.iter().cloned().collect(),
            bare_issued: false,
        };
        let first = search.next_candidate().unwrap_or_else(|| base.to_string());
        (search, first)
    }

    pub(crate) fn on_failure(&mut self, error: ResolveError) -> Next {
        if !error.is_not_found() {
            debug!(base = %self.base, error = %error, "Search aborted by non-retryable failure");
            return Next::Deliver;
        }
        match self.next_candidate() {
            Some(name) => Next::Retry(name),
            None => Next::Deliver,
        }
    }

    fn next_candidate(&mut self) -> Option<String> {
        while let Some(suffix) = self.remaining.pop_front() {
            let name = domain_name::with_suffix(&self.base, &suffix);
            if domain_name::validate(&name).is_ok() {
                return Some(name);
            }
            debug!(name = %name, "Skipping invalid search candidate");
        }
        if self.bare_issued {
            return None;
        }
        self.bare_issued = true;
        Some(self.base.clone())
    }
}
