use chrono::{DateTime, Utc};

use super::Ranker;

/// FIFO ranker: a normalizer task's priority is simply the epoch second it
/// was ranked at, so the queue behaves first-in-first-out.
pub struct NormalizerRanker;

impl Ranker<DateTime<Utc>> for NormalizerRanker {
    fn rank(&self, now: &DateTime<Utc>) -> i64 {
        now.timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_as_current_epoch_seconds() {
        let now = Utc::now();
        let score = NormalizerRanker.rank(&now);
        assert_eq!(score, now.timestamp());
    }
}
