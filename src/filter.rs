use std::fmt::{Display, Formatter};

/// The per-value decision of a filter stage.
///
/// Filters are the unary stages of a pipeline: the pipeline runs each one in its own task,
/// reading from one pipe and forwarding every value that passes into the next, in order.
pub trait Filter: Send + Sync + 'static {
    /// A short name identifying the stage in logs.
    fn name(&self) -> &'static str;

    /// Decide whether `value` continues down the pipeline.
    fn verdict(&self, value: i32) -> Verdict;
}

/// Outcome of running a value through a [Filter].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Verdict {
    /// The value is forwarded unchanged.
    Pass,
    /// The value is dropped.
    Reject(Rejection),
}

/// Why a value was dropped by a [Filter].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Rejection {
    /// The value is below zero.
    Negative,
    /// The value is zero.
    Zero,
    /// The value is not divisible by three.
    NotMultipleOfThree,
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::Negative => "negative",
            Self::Zero => "zero",
            Self::NotMultipleOfThree => "not a multiple of 3",
        };
        write!(f, "{reason}")
    }
}

/// Drops every value below zero.
#[derive(Copy, Clone, Default, Debug)]
pub struct NegativeFilter;

impl Filter for NegativeFilter {
    fn name(&self) -> &'static str {
        "negative-filter"
    }

    fn verdict(&self, value: i32) -> Verdict {
        if value >= 0 {
            Verdict::Pass
        } else {
            Verdict::Reject(Rejection::Negative)
        }
    }
}

/// Drops zero and every value that is not a multiple of three.
#[derive(Copy, Clone, Default, Debug)]
pub struct MultipleOfThreeFilter;

impl Filter for MultipleOfThreeFilter {
    fn name(&self) -> &'static str {
        "three-filter"
    }

    fn verdict(&self, value: i32) -> Verdict {
        match value {
            0 => Verdict::Reject(Rejection::Zero),
            v if v % 3 == 0 => Verdict::Pass,
            _ => Verdict::Reject(Rejection::NotMultipleOfThree),
        }
    }
}
