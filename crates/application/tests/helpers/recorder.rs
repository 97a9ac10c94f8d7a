use ferrous_resolver_application::{Handler, OperationHandle};
use ferrous_resolver_domain::{ResolveError, Response};
use std::cell::RefCell;
use std::rc::Rc;

type Outcome = (OperationHandle, Result<Response, ResolveError>);

/// Handler that keeps every result it receives; clones share the log.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Rc<RefCell<Vec<Outcome>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn outcomes(&self) -> Vec<Result<Response, ResolveError>> {
        self.log.borrow().iter().map(|(_, o)| o.clone()).collect()
    }

    pub fn handles(&self) -> Vec<OperationHandle> {
        self.log.borrow().iter().map(|(h, _)| *h).collect()
    }

    pub fn single(&self) -> Result<Response, ResolveError> {
        let log = self.log.borrow();
        assert_eq!(log.len(), 1, "expected exactly one handler call");
        log[0].1.clone()
    }
}

impl Handler for Recorder {
    fn on_success(&mut self, handle: OperationHandle, response: Response) {
        self.log.borrow_mut().push((handle, Ok(response)));
    }

    fn on_failure(&mut self, handle: OperationHandle, error: ResolveError) {
        self.log.borrow_mut().push((handle, Err(error)));
    }
}
