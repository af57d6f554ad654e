//! Fatal-error reporting for contract violations.
//!
//! Contract violations (undersized in-place construction, capacity
//! overflow, root access on a pool context) are never recovered. They
//! are logged, passed to the installed hook, and then abort the current
//! thread with a panic. Builds with `panic = "abort"` terminate the
//! process.

use std::sync::RwLock;

/// Callback invoked with the message before a fatal error unwinds.
pub type FatalHook = fn(&str);

static HOOK: RwLock<Option<FatalHook>> = RwLock::new(None);

/// Install `hook`, returning the previous one.
pub fn set_fatal_hook(hook: Option<FatalHook>) -> Option<FatalHook> {
    match HOOK.write() {
        Ok(mut guard) => std::mem::replace(&mut *guard, hook),
        Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), hook),
    }
}

/// Report a contract violation and stop.
#[cold]
#[track_caller]
pub fn fatal(message: &str) -> ! {
    tracing::error!(message, "fatal error");
    let hook = match HOOK.read() {
        Ok(guard) => *guard,
        Err(poisoned) => *poisoned.into_inner(),
    };
    if let Some(hook) = hook {
        hook(message);
    }
    panic!("{message}");
}
