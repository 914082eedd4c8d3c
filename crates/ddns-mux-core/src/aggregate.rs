//! Severity-ranked aggregation of provider outcomes
//!
//! The aggregate of a request is a left fold over its provider outcomes
//! in configured order. A later outcome replaces the running result only
//! if it is strictly more severe, so among equally severe outcomes the
//! first configured provider decides the text.

use crate::status::Status;

/// What happened at one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOutcome {
    /// Position of the provider in configured order
    pub provider_index: usize,
    pub status: Status,
    /// True when the status came from a structured signal or was
    /// synthesized by the multiplexer itself
    pub exact_match: bool,
}

impl ProviderOutcome {
    /// Create an outcome
    pub fn new(provider_index: usize, status: Status, exact_match: bool) -> Self {
        Self {
            provider_index,
            status,
            exact_match,
        }
    }

    /// Outcome for a provider that could not be contacted or whose
    /// address could not be synthesized
    pub fn administrative_error(provider_index: usize) -> Self {
        Self::new(provider_index, Status::AdministrativeError, true)
    }
}

/// Running state of the fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusAggregator {
    highest_rank: i8,
    final_text: String,
    anchor_address: String,
}

impl StatusAggregator {
    /// Start a fold for a request whose own address is `anchor_address`
    ///
    /// The initial result is `nochg <anchor>`.
    pub fn new(anchor_address: impl Into<String>) -> Self {
        let anchor_address = anchor_address.into();
        Self {
            highest_rank: Status::NoChg.rank(),
            final_text: format!("{} {}", Status::NoChg, anchor_address),
            anchor_address,
        }
    }

    /// Fold a sequence of outcomes, in the order given
    pub fn fold<'a, I>(anchor_address: impl Into<String>, outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a ProviderOutcome>,
    {
        outcomes
            .into_iter()
            .fold(Self::new(anchor_address), |acc, outcome| acc.observe(outcome.status))
    }

    /// Fold step: adopt `status` if it is strictly more severe
    pub fn observe(mut self, status: Status) -> Self {
        self.update(status);
        self
    }

    /// In-place fold step
    pub fn update(&mut self, status: Status) {
        if status.rank() <= self.highest_rank {
            return;
        }
        self.highest_rank = status.rank();
        self.final_text = if status.echoes_address() {
            format!("{} {}", status, self.anchor_address)
        } else {
            status.to_string()
        };
    }

    /// Highest rank seen so far
    pub fn highest_rank(&self) -> i8 {
        self.highest_rank
    }

    /// Current aggregated line
    pub fn final_text(&self) -> &str {
        &self.final_text
    }

    /// Consume the fold, returning the line sent to the caller
    pub fn into_final_text(self) -> String {
        self.final_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes(statuses: &[Status]) -> Vec<ProviderOutcome> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| ProviderOutcome::new(i, *s, true))
            .collect()
    }

    #[test]
    fn no_outcomes_yields_nochg_with_anchor() {
        let agg = StatusAggregator::fold("198.51.100.7", std::iter::empty::<&ProviderOutcome>());
        assert_eq!(agg.final_text(), "nochg 198.51.100.7");
        assert_eq!(agg.highest_rank(), -1);
    }

    #[test]
    fn nochg_outcomes_keep_initial_text() {
        let agg = StatusAggregator::fold("1.2.3.4", &outcomes(&[Status::NoChg, Status::NoChg]));
        assert_eq!(agg.into_final_text(), "nochg 1.2.3.4");
    }

    #[test]
    fn good_echoes_the_anchor() {
        let agg = StatusAggregator::fold("1.2.3.4", &outcomes(&[Status::NoChg, Status::Good]));
        assert_eq!(agg.final_text(), "good 1.2.3.4");
    }

    #[test]
    fn ok_does_not_echo_the_anchor() {
        let agg = StatusAggregator::fold("1.2.3.4", &outcomes(&[Status::Ok]));
        assert_eq!(agg.final_text(), "ok");
    }

    #[test]
    fn errors_drop_the_address() {
        let agg = StatusAggregator::fold(
            "1.2.3.4",
            &outcomes(&[Status::Good, Status::AdministrativeError, Status::DnsErr]),
        );
        assert_eq!(agg.final_text(), "administrative-error");
        assert_eq!(agg.highest_rank(), 4);
    }

    #[test]
    fn highest_severity_wins_in_any_order() {
        let statuses = [Status::Good, Status::BadAuth, Status::Unknown, Status::NoHost];
        let permutations = [[0, 1, 2, 3], [3, 2, 1, 0], [1, 0, 3, 2], [2, 3, 0, 1], [0, 2, 3, 1]];

        for order in permutations {
            let ordered: Vec<Status> = order.iter().map(|i| statuses[*i]).collect();
            let agg = StatusAggregator::fold("1.2.3.4", &outcomes(&ordered));
            assert_eq!(agg.final_text(), "badauth", "order {order:?}");
        }
    }

    #[test]
    fn rank_never_decreases() {
        let mut agg = StatusAggregator::new("::1");
        let mut last = agg.highest_rank();
        for status in [Status::Good, Status::NoChg, Status::DnsErr, Status::Ok, Status::Abuse, Status::Good] {
            agg.update(status);
            assert!(agg.highest_rank() >= last);
            last = agg.highest_rank();
        }
        assert_eq!(agg.final_text(), "abuse");
    }

    #[test]
    fn equal_rank_does_not_overwrite() {
        let mut agg = StatusAggregator::new("1.2.3.4");
        agg.update(Status::Good);
        let before = agg.clone();
        agg.update(Status::Good);
        assert_eq!(agg, before);
    }

    #[test]
    fn observe_and_update_agree() {
        let by_value = StatusAggregator::new("a").observe(Status::DnsErr).observe(Status::Good);
        let mut in_place = StatusAggregator::new("a");
        in_place.update(Status::DnsErr);
        in_place.update(Status::Good);
        assert_eq!(by_value, in_place);
    }
}
