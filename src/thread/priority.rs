//! Best-effort scheduling priority hints for worker threads

use serde::{Deserialize, Serialize};

/// Scheduling priority a worker thread requests for itself at spawn time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadPriority {
    /// Leave the OS default untouched
    #[default]
    Normal,
    /// Step one notch below the inherited priority
    Background,
}

impl ThreadPriority {
    /// Applies this priority to the calling thread.
    ///
    /// Must run on the thread being adjusted. Never fails: the OS may refuse
    /// the change and the thread keeps running at whatever priority it has.
    pub fn apply(self) {
        match self {
            ThreadPriority::Normal => {}
            ThreadPriority::Background => lower_current_thread_priority(),
        }
    }

    /// Returns true for [`ThreadPriority::Background`]
    pub fn is_background(self) -> bool {
        self == ThreadPriority::Background
    }
}

impl From<bool> for ThreadPriority {
    /// `true` maps to [`ThreadPriority::Background`]
    fn from(low_priority: bool) -> Self {
        if low_priority {
            ThreadPriority::Background
        } else {
            ThreadPriority::Normal
        }
    }
}

/// Lowers the calling thread's scheduling priority by one step.
///
/// On Linux the thread is moved from `SCHED_OTHER` to `SCHED_BATCH` (marking
/// it CPU-bound) and its niceness is raised by one; Linux tracks niceness per
/// thread. Other Unix systems decrement the `SCHED_OTHER` priority towards
/// the policy minimum. On Windows the thread moves one rung down the
/// priority ladder (time-critical, highest, above normal, normal, below
/// normal, lowest, idle) and stays put at idle. Elsewhere this is a no-op.
/// Errors are swallowed.
pub fn lower_current_thread_priority() {
    platform::lower_one_step();
}

#[cfg(target_os = "linux")]
mod platform {
    pub(super) fn lower_one_step() {
        // SAFETY: pthread_self is always valid for the calling thread and the
        // out-params are plain C structs owned by this frame.
        unsafe {
            let thread = libc::pthread_self();
            let mut policy: libc::c_int = 0;
            let mut param: libc::sched_param = std::mem::zeroed();
            if libc::pthread_getschedparam(thread, &mut policy, &mut param) == 0
                && policy == libc::SCHED_OTHER
            {
                let rc = libc::pthread_setschedparam(thread, libc::SCHED_BATCH, &param);
                if rc != 0 {
                    log::trace!("SCHED_BATCH refused (errno {})", rc);
                }
            }

            // nice() may legitimately return -1, so errno is not worth checking.
            libc::nice(1);
        }
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
mod platform {
    pub(super) fn lower_one_step() {
        // SAFETY: see the Linux implementation.
        unsafe {
            let thread = libc::pthread_self();
            let mut policy: libc::c_int = 0;
            let mut param: libc::sched_param = std::mem::zeroed();
            if libc::pthread_getschedparam(thread, &mut policy, &mut param) != 0
                || policy != libc::SCHED_OTHER
            {
                return;
            }

            let min = libc::sched_get_priority_min(policy);
            if min < param.sched_priority {
                param.sched_priority = (param.sched_priority - 1).max(min);
                let rc = libc::pthread_setschedparam(thread, policy, &param);
                if rc != 0 {
                    log::trace!("lowering sched priority refused (errno {})", rc);
                }
            }
        }
    }
}

#[cfg(windows)]
mod platform {
    use windows_sys::Win32::System::Threading::{
        GetCurrentThread, GetThreadPriority, SetThreadPriority, THREAD_PRIORITY_ABOVE_NORMAL,
        THREAD_PRIORITY_BELOW_NORMAL, THREAD_PRIORITY_HIGHEST, THREAD_PRIORITY_IDLE,
        THREAD_PRIORITY_LOWEST, THREAD_PRIORITY_NORMAL, THREAD_PRIORITY_TIME_CRITICAL,
    };

    /// Next rung down the ladder; `None` at idle or for values off the ladder.
    pub(super) fn next_lower(current: i32) -> Option<i32> {
        let next = match current {
            THREAD_PRIORITY_TIME_CRITICAL => THREAD_PRIORITY_HIGHEST,
            THREAD_PRIORITY_HIGHEST => THREAD_PRIORITY_ABOVE_NORMAL,
            THREAD_PRIORITY_ABOVE_NORMAL => THREAD_PRIORITY_NORMAL,
            THREAD_PRIORITY_NORMAL => THREAD_PRIORITY_BELOW_NORMAL,
            THREAD_PRIORITY_BELOW_NORMAL => THREAD_PRIORITY_LOWEST,
            THREAD_PRIORITY_LOWEST => THREAD_PRIORITY_IDLE,
            _ => return None,
        };
        Some(next)
    }

    pub(super) fn lower_one_step() {
        // SAFETY: GetCurrentThread returns a pseudo-handle that is always
        // valid on the calling thread and never needs closing.
        unsafe {
            let thread = GetCurrentThread();
            if let Some(priority) = next_lower(GetThreadPriority(thread)) {
                if SetThreadPriority(thread, priority) == 0 {
                    log::trace!("SetThreadPriority({}) refused", priority);
                }
            }
        }
    }
}

#[cfg(not(any(unix, windows)))]
mod platform {
    pub(super) fn lower_one_step() {
        log::trace!("thread priority hints are not supported on this platform");
    }
}
