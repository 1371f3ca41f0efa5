use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use tracing::debug;

use crate::repl::ReplError;

static RECEIVED_SIGINT: AtomicBool = AtomicBool::new(false);

/// Bytes written to stdout by the handler, if any.
static REPROMPT: OnceLock<Box<[u8]>> = OnceLock::new();

extern "C" fn handle_sigint(_: i32) {
    RECEIVED_SIGINT.store(true, Ordering::SeqCst);
    if let Some(bytes) = REPROMPT.get() {
        // write(2) is async-signal-safe
        let _ = nix::unistd::write(nix::libc::STDOUT_FILENO, bytes);
    }
}

/// Replace the default SIGINT action for the rest of the process.
///
/// The handler only raises a flag that the shell loop collects with
/// [`take_interrupt`] between reads. When `reprompt` is given it is echoed on
/// a fresh line straight from the handler, for line sources that cannot
/// redraw their own prompt while blocked.
pub fn install_sigint_handler(reprompt: Option<&str>) -> Result<(), ReplError> {
    if let Some(prompt) = reprompt {
        let bytes = format!("\n{}", prompt).into_bytes().into_boxed_slice();
        // The first installation decides the echo text.
        let _ = REPROMPT.set(bytes);
    }

    let handler = SigHandler::Handler(handle_sigint);
    // No SA_RESTART: the blocked read is retried by the reader itself.
    let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
    unsafe {
        sigaction(Signal::SIGINT, &action)?;
    }

    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    set.thread_unblock()?;

    debug!("SIGINT handler installed");
    Ok(())
}

/// Returns `true` once for every burst of SIGINTs since the previous call.
pub fn take_interrupt() -> bool {
    RECEIVED_SIGINT.swap(false, Ordering::SeqCst)
}
