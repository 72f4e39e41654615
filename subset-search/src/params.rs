use std::cmp::max;

/// What a search does when one candidate cannot be evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole search with the first failing candidate in enumeration order
    #[default]
    FailFast,
    /// Log the failure, report the candidate as skipped and keep going
    SkipAndContinue,
}

/// The parameters of a subset search
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Number of worker threads evaluating candidates
    pub num_threads: usize,
    /// Handling of candidates whose evaluation fails
    pub failure_policy: FailurePolicy,
    /// Initial best error; only candidates strictly below it can win.
    /// 1.0 bounds any rate in [0, 1].
    pub sentinel: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            num_threads: max(num_cpus::get().saturating_sub(2), 1),
            failure_policy: FailurePolicy::FailFast,
            sentinel: 1.0,
        }
    }
}
