//! Pure priority functions. A ranker takes a context describing a candidate
//! task and returns an integer priority; lower sorts first in the queue.

mod boefje;
mod normalizer;

pub use boefje::{BoefjeRankContext, BoefjeRanker};
pub use normalizer::NormalizerRanker;

/// A ranker is a pure function of its context; no I/O, no shared state.
pub trait Ranker<Ctx> {
    fn rank(&self, ctx: &Ctx) -> i64;
}
