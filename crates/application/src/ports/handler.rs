use crate::resolver::OperationHandle;
use ferrous_resolver_domain::{ResolveError, Response};

/// Receives the single terminal result of a lookup.
///
/// Exactly one of the two methods is called, once, unless the operation is
/// cancelled first, in which case neither is.
pub trait Handler {
    fn on_success(&mut self, handle: OperationHandle, response: Response);

    fn on_failure(&mut self, handle: OperationHandle, error: ResolveError);
}

/// Adapts a pair of closures to [`Handler`].
pub struct Callbacks<S, F> {
    success: S,
    failure: F,
}

impl<S, F> Callbacks<S, F>
where
    S: FnMut(Response),
    F: FnMut(ResolveError),
{
    pub fn new(success: S, failure: F) -> Self {
        Self { success, failure }
    }
}

impl<S, F> Handler for Callbacks<S, F>
where
    S: FnMut(Response),
    F: FnMut(ResolveError),
{
    fn on_success(&mut self, _handle: OperationHandle, response: Response) {
        (self.success)(response)
    }

    fn on_failure(&mut self, _handle: OperationHandle, error: ResolveError) {
        (self.failure)(error)
    }
}
