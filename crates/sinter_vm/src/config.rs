//! Configuration for the interpreter.

/// Bounds and knobs for one [`Vm`](crate::Vm).
///
/// Controls stack depths, the step budget and deterministic randomness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum operand stack entries.
    pub max_stack: usize,

    /// Maximum call frames.
    pub max_call_depth: usize,

    /// Maximum nesting of primitives calling back into functions.
    pub max_native_depth: usize,

    /// Instruction budget for one run (`None` = unbounded).
    pub step_limit: Option<u64>,

    /// Seed for `math_random` (`None` = seeded from entropy).
    pub random_seed: Option<u64>,

    /// Pairwise comparisons one call to `equal` may perform.
    pub equality_limit: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_stack: 65_536,
            max_call_depth: 10_000,
            max_native_depth: 256,
            step_limit: None,
            random_seed: None,
            equality_limit: 1 << 22,
        }
    }
}

impl VmConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the operand stack bound.
    #[must_use]
    pub fn with_max_stack(mut self, entries: usize) -> Self {
        self.max_stack = entries;
        self
    }

    /// Builder method to set the call depth bound.
    #[must_use]
    pub fn with_max_call_depth(mut self, frames: usize) -> Self {
        self.max_call_depth = frames;
        self
    }

    /// Builder method to set the native nesting bound.
    #[must_use]
    pub fn with_max_native_depth(mut self, depth: usize) -> Self {
        self.max_native_depth = depth;
        self
    }

    /// Builder method to set the step budget.
    #[must_use]
    pub fn with_step_limit(mut self, steps: u64) -> Self {
        self.step_limit = Some(steps);
        self
    }

    /// Builder method to seed `math_random`.
    #[must_use]
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Builder method to set the structural equality bound.
    #[must_use]
    pub fn with_equality_limit(mut self, comparisons: usize) -> Self {
        self.equality_limit = comparisons;
        self
    }
}
