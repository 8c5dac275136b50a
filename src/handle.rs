use crate::error::BridgeResult;
use crate::session::Session;
use crate::value::Value;
use log::{debug, warn};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// Host-side proxy for a value that only exists in the remote process.
///
/// Clones share one remote object. When the last clone goes away the
/// remote side is asked to free it; that request is best effort and its
/// failure is never reported. Equality is identity of the shared slot.
#[derive(Clone)]
pub struct RemoteHandle {
    slot: Rc<HandleSlot>,
}

struct HandleSlot {
    session: Session,
    id: u64,
}

impl RemoteHandle {
    /// Wraps a remote-assigned id. The id is trusted as-is.
    pub fn new(session: Session, id: u64) -> Self {
        Self {
            slot: Rc::new(HandleSlot { session, id }),
        }
    }

    pub fn id(&self) -> u64 {
        self.slot.id
    }

    pub fn session(&self) -> &Session {
        &self.slot.session
    }

    /// Calls the remote object with each argument passed literally.
    ///
    /// The handle itself sits unquoted in the function position. Errors are
    /// whatever the channel or remote side reports.
    pub fn invoke<I>(&self, args: I) -> BridgeResult<Value>
    where
        I: IntoIterator<Item = Value>,
    {
        let session = self.session();
        let expression = session
            .builder()
            .funcall(Value::Handle(self.clone()), args);
        session.evaluate(&expression)
    }
}

impl Drop for HandleSlot {
    fn drop(&mut self) {
        if !self.session.config().release_handles {
            return;
        }
        let id = self.id;
        let session = &self.session;
        match panic::catch_unwind(AssertUnwindSafe(|| session.release(id))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("ignoring failure to release handle #{id}: {err}"),
            Err(_) => warn!("ignoring panic while releasing handle #{id}"),
        }
    }
}

impl PartialEq for RemoteHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RemoteHandle").field(&self.slot.id).finish()
    }
}

impl fmt::Display for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemoteHandle(#{}?)", self.slot.id)
    }
}

impl Session {
    pub(crate) fn handle(&self, id: u64) -> RemoteHandle {
        debug!("received handle #{id}");
        RemoteHandle::new(self.clone(), id)
    }
}
