use std::marker::PhantomData;

/// Signals held back while a file lock is held.
pub const BLOCKED_SIGNALS: [libc::c_int; 3] = [libc::SIGINT, libc::SIGTERM, libc::SIGUSR1];

/// Blocks [`BLOCKED_SIGNALS`] for the calling thread until dropped.
///
/// Pending signals are delivered once the previous mask is restored.
/// The mask is per thread, so the guard is neither `Send` nor `Sync`.
pub struct SignalGuard {
    previous: libc::sigset_t,
    _not_send: PhantomData<*const ()>,
}

impl SignalGuard {
    pub fn block() -> std::io::Result<Self> {
        // SAFETY: both sets are fully initialized by sigemptyset before use,
        // and pthread_sigmask only touches the calling thread's mask.
        unsafe {
            let mut mask: libc::sigset_t = std::mem::zeroed();
            let mut previous: libc::sigset_t = std::mem::zeroed();
            libc::sigemptyset(&mut mask);
            libc::sigemptyset(&mut previous);
            for sig in BLOCKED_SIGNALS {
                libc::sigaddset(&mut mask, sig);
            }

            let rc = libc::pthread_sigmask(libc::SIG_BLOCK, &mask, &mut previous);
            if rc != 0 {
                return Err(std::io::Error::from_raw_os_error(rc));
            }
            Ok(Self { previous, _not_send: PhantomData })
        }
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        // SAFETY: `previous` was filled by pthread_sigmask in `block`.
        let rc = unsafe {
            libc::pthread_sigmask(libc::SIG_SETMASK, &self.previous, std::ptr::null_mut())
        };
        if rc != 0 {
            tracing::error!(
                error = %std::io::Error::from_raw_os_error(rc),
                "cannot restore signal mask"
            );
        }
    }
}

/// Run `f` with termination signals blocked, restoring the previous mask on
/// every exit path. If the mask cannot be changed, `f` still runs unguarded.
pub fn critical_section<R>(f: impl FnOnce() -> R) -> R {
    let _guard = match SignalGuard::block() {
        Ok(g) => Some(g),
        Err(e) => {
            tracing::error!(error = %e, "cannot block termination signals");
            None
        }
    };
    f()
}

/// Whether `sig` is currently blocked for the calling thread.
pub fn is_blocked(sig: libc::c_int) -> bool {
    // SAFETY: querying the mask with a null `set` leaves it unchanged.
    unsafe {
        let mut current: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut current);
        if libc::pthread_sigmask(libc::SIG_BLOCK, std::ptr::null(), &mut current) != 0 {
            return false;
        }
        libc::sigismember(&current, sig) == 1
    }
}
