//! Host parallelism query

/// Number of logical CPUs this process can use, never less than one.
///
/// Stateless and cheap enough to call on every sizing decision.
pub fn available_parallelism() -> usize {
    num_cpus::get().max(1)
}
