//! Reference-counted shared handle with an injected opener
//!
//! Every worker thread owns its own backend instance, but all of them should
//! talk to one underlying store. `SharedResource` opens that store on the
//! first `acquire()` and drops it on the matching last `release()`.
//!
//! The resource itself is passed around as `Arc<SharedResource<T>>`; there is
//! no process-wide singleton.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use strata_bench_core::{Error, Result};
use tracing::debug;

type Opener<T> = Box<dyn Fn() -> Result<T> + Send + Sync>;

struct Lease<T> {
    handle: Option<Arc<T>>,
    refs: usize,
}

/// Lazily opened store shared by reference count
pub struct SharedResource<T> {
    name: String,
    opener: Opener<T>,
    lease: Mutex<Lease<T>>,
}

impl<T> SharedResource<T> {
    /// Create a closed resource; `opener` runs on the first acquire
    pub fn new<F>(name: impl Into<String>, opener: F) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            opener: Box::new(opener),
            lease: Mutex::new(Lease {
                handle: None,
                refs: 0,
            }),
        }
    }

    /// Take a reference, opening the resource if nobody holds one
    ///
    /// # Errors
    ///
    /// Propagates the opener's error; the reference count is unchanged.
    pub fn acquire(&self) -> Result<Arc<T>> {
        let mut lease = self.lease.lock();
        let handle = match &lease.handle {
            Some(h) => Arc::clone(h),
            None => {
                let opened = Arc::new((self.opener)()?);
                debug!(resource = %self.name, "opened shared resource");
                lease.handle = Some(Arc::clone(&opened));
                opened
            }
        };
        lease.refs += 1;
        Ok(handle)
    }

    /// Drop a reference, closing the resource when it was the last
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on a release without a matching acquire.
    pub fn release(&self) -> Result<()> {
        let mut lease = self.lease.lock();
        if lease.refs == 0 {
            return Err(Error::backend(format!(
                "release of '{}' without matching acquire",
                self.name
            )));
        }
        lease.refs -= 1;
        if lease.refs == 0 {
            lease.handle = None;
            debug!(resource = %self.name, "closed shared resource");
        }
        Ok(())
    }

    /// Outstanding references
    pub fn ref_count(&self) -> usize {
        self.lease.lock().refs
    }

    /// Whether the resource is currently open
    pub fn is_open(&self) -> bool {
        self.lease.lock().handle.is_some()
    }
}

impl<T> fmt::Debug for SharedResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lease = self.lease.lock();
        f.debug_struct("SharedResource")
            .field("name", &self.name)
            .field("refs", &lease.refs)
            .field("open", &lease.handle.is_some())
            .finish()
    }
}
