//! Interrupt handling for foreground commands.
//!
//! Signal handlers may only touch async-signal-safe state, so the handler
//! just raises a process-global flag. A relay thread turns that flag into a
//! [`CancelToken`] cancellation.

use crate::cancel::CancelToken;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Set by the signal handler, read by the relay thread.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// How often the relay thread checks the flag.
const RELAY_INTERVAL: Duration = Duration::from_millis(100);

/// Whether SIGINT or SIGTERM has been received since the handler was installed.
#[must_use]
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Cancel `token` when the process receives SIGINT or SIGTERM.
///
/// The relay thread exits once the token is cancelled, whether by a signal
/// or by anything else.
pub fn cancel_on_interrupt(token: &CancelToken) {
    install_handlers();

    let token = token.clone();
    let spawned = thread::Builder::new()
        .name("witness-signal".to_string())
        .spawn(move || {
            while !token.wait_timeout(RELAY_INTERVAL) {
                if interrupted() {
                    tracing::debug!("Interrupt received, cancelling");
                    token.cancel();
                }
            }
        });

    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Failed to start interrupt relay thread");
    }
}

#[cfg(unix)]
fn install_handlers() {
    extern "C" fn on_signal(_sig: libc::c_int) {
        INTERRUPTED.store(true, Ordering::SeqCst);
    }

    let handler = on_signal as extern "C" fn(libc::c_int);
    for sig in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: the handler only stores to an atomic, which is async-signal-safe
        let previous = unsafe { libc::signal(sig, handler as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            tracing::debug!(signal = sig, "Failed to install signal handler");
        }
    }
}

#[cfg(not(unix))]
fn install_handlers() {
    tracing::debug!("Interrupt handling not supported on this platform");
}
