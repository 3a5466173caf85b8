use chrono::{DateTime, Utc};

use super::Ranker;

/// Context a boefje candidate is ranked against.
pub struct BoefjeRankContext {
    /// `ended_at` of the boefje's most recent run against this input, if any.
    pub last_run_ended_at: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
    pub maxsize: i64,
    pub grace_period_secs: i64,
}

const MAX_DAYS_SECONDS: f64 = 7.0 * 24.0 * 60.0 * 60.0;

/// Exponential-decay ranker: a boefje that has never run for this input
/// ranks just above the externally-reserved priority 0; one that ran
/// recently (within the grace period) is ineligible; older runs decay
/// toward a floor of 3 as they approach the week-long horizon.
pub struct BoefjeRanker;

impl Ranker<BoefjeRankContext> for BoefjeRanker {
    fn rank(&self, ctx: &BoefjeRankContext) -> i64 {
        let Some(ended_at) = ctx.last_run_ended_at else {
            return 2;
        };

        let since_run = ctx.now.signed_duration_since(ended_at).num_seconds();
        let since_grace = since_run - ctx.grace_period_secs;
        if since_grace < 0 {
            return -1;
        }

        let y = ctx.maxsize as f64
            * (-(1000f64.ln() / MAX_DAYS_SECONDS) * since_grace as f64).exp()
            + 2.0;
        y.floor() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ctx(last_run_ended_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> BoefjeRankContext {
        BoefjeRankContext {
            last_run_ended_at,
            now,
            maxsize: 1000,
            grace_period_secs: 86400,
        }
    }

    #[test]
    fn never_run_ranks_two() {
        let now = Utc::now();
        assert_eq!(BoefjeRanker.rank(&ctx(None, now)), 2);
    }

    #[test]
    fn within_grace_period_is_ineligible() {
        let now = Utc::now();
        let ended_at = now - Duration::seconds(30);
        assert_eq!(BoefjeRanker.rank(&ctx(Some(ended_at), now)), -1);
    }

    #[test]
    fn just_past_grace_period_ranks_near_maxsize() {
        let now = Utc::now();
        let ended_at = now - Duration::seconds(86400 + 1);
        let score = BoefjeRanker.rank(&ctx(Some(ended_at), now));
        assert!(score >= 900, "expected score near maxsize, got {score}");
    }

    #[test]
    fn far_past_grace_period_decays_toward_floor() {
        let now = Utc::now();
        let ended_at = now - Duration::days(30);
        let score = BoefjeRanker.rank(&ctx(Some(ended_at), now));
        assert!((2..=4).contains(&score), "expected score near floor, got {score}");
    }
}
