//! Filter engine combining the rate limiter, blocklist and rule store.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::blocklist::Blocklist;
use super::clock::{Clock, SystemClock};
use super::limiter::RateLimiter;
use super::rules::{InMemoryRuleStore, RuleStore};
use super::types::{Decision, Request, Response, Rule};
use crate::config::FilterConfig;
use crate::error::RuleError;

/// The request filtering engine.
///
/// Every check is synchronous and lock-protected, so a single engine can be
/// shared across threads and tasks behind an `Arc`.
pub struct FilterEngine<S: RuleStore = InMemoryRuleStore> {
    rate_limiter: RateLimiter,
    blocklist: Blocklist,
    rules: S,
}

impl FilterEngine<InMemoryRuleStore> {
    /// Create an engine with an in-memory rule store on the system clock.
    pub fn new(config: FilterConfig) -> Self {
        Self::with_parts(config, InMemoryRuleStore::new(), Arc::new(SystemClock))
    }
}

impl<S: RuleStore> FilterEngine<S> {
    /// Create an engine from a custom rule store and clock.
    ///
    /// Initial rules are inserted in order. A rule whose id repeats an earlier
    /// one replaces it.
    pub fn with_parts(config: FilterConfig, rules: S, clock: Arc<dyn Clock>) -> Self {
        let FilterConfig {
            max_requests_per_second,
            blocked_addresses,
            rules: initial_rules,
        } = config;

        for rule in initial_rules {
            if let Err(RuleError::DuplicateId(id)) = rules.add_rule(rule.clone()) {
                warn!(rule_id = %id, "Duplicate initial rule id, replacing earlier rule");
                rules.remove_rule(&id).ok();
                rules.add_rule(rule).ok();
            }
        }

        let blocklist = Blocklist::new(blocked_addresses);

        debug!(
            max_requests_per_second,
            blocked_addresses = blocklist.len(),
            rules = rules.len(),
            "Filter engine initialized"
        );

        Self {
            rate_limiter: RateLimiter::with_clock(max_requests_per_second, clock),
            blocklist,
            rules,
        }
    }

    /// Evaluate a request and render the verdict.
    pub fn filter(&self, request: &Request) -> Response {
        self.decide(request).into()
    }

    /// Evaluate a request.
    ///
    /// Checks run in a fixed order and the first denial wins: rate limit,
    /// blocklist, then custom rules. The rate limit check consumes quota even
    /// when a later check denies the request.
    pub fn decide(&self, request: &Request) -> Decision {
        let decision = if !self.rate_limiter.allow() {
            Decision::RateLimited
        } else if self.blocklist.contains(&request.source_address) {
            Decision::BlockedAddress
        } else if self.rules.match_any(request) {
            Decision::BlockedByRule
        } else {
            Decision::Allowed
        };

        if !decision.is_allowed() {
            debug!(
                source = %request.source_address,
                dest = %request.dest_address,
                protocol = %request.protocol,
                port = request.port,
                reason = decision.message(),
                "Request denied"
            );
        }

        decision
    }

    /// Add a rule at runtime.
    pub fn add_rule(&self, rule: Rule) -> Result<(), RuleError> {
        let id = rule.id.clone();
        self.rules.add_rule(rule)?;
        info!(rule_id = %id, "Rule added");
        Ok(())
    }

    /// Remove a rule by id.
    pub fn remove_rule(&self, id: &str) -> Result<(), RuleError> {
        self.rules.remove_rule(id)?;
        info!(rule_id = %id, "Rule removed");
        Ok(())
    }

    /// Snapshot of the current rules, ordered by id.
    pub fn rules(&self) -> Vec<Rule> {
        self.rules.rules()
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn blocklist(&self) -> &Blocklist {
        &self.blocklist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::clock::MockClock;
    use std::time::Duration;

    fn rule(id: &str, source: &str, dest: &str, protocol: &str, port: u16) -> Rule {
        Rule {
            id: id.to_string(),
            source_address: source.to_string(),
            dest_address: dest.to_string(),
            protocol: protocol.to_string(),
            port,
        }
    }

    fn sample_config() -> FilterConfig {
        FilterConfig {
            max_requests_per_second: 5,
            blocked_addresses: vec!["192.168.1.100".to_string()],
            rules: vec![rule("rule1", "", "10.0.0.1", "TCP", 80)],
        }
    }

    fn engine_with_clock(config: FilterConfig) -> (FilterEngine, MockClock) {
        let clock = MockClock::new();
        let engine =
            FilterEngine::with_parts(config, InMemoryRuleStore::new(), Arc::new(clock.clone()));
        (engine, clock)
    }

    #[test]
    fn test_custom_rule_blocks_any_source() {
        let engine = FilterEngine::new(sample_config());
        let request = Request::new("192.168.1.200", "10.0.0.1", "TCP", 80);

        let response = engine.filter(&request);

        assert_eq!(
            response,
            Response { allowed: false, message: "Blocked by custom rule".to_string() }
        );
    }

    #[test]
    fn test_blocklist_short_circuits_rules() {
        let engine = FilterEngine::new(sample_config());
        let request = Request::new("192.168.1.100", "anything", "UDP", 53);

        let response = engine.filter(&request);

        assert_eq!(response, Response { allowed: false, message: "Blocked IP".to_string() });
    }

    #[test]
    fn test_blocklist_wins_over_matching_rule() {
        let engine = FilterEngine::new(sample_config());
        let request = Request::new("192.168.1.100", "10.0.0.1", "TCP", 80);

        assert_eq!(engine.decide(&request), Decision::BlockedAddress);
    }

    #[test]
    fn test_unmatched_request_allowed() {
        let engine = FilterEngine::new(sample_config());
        let request = Request::new("192.168.1.200", "10.0.0.1", "TCP", 443);

        let response = engine.filter(&request);

        assert_eq!(response, Response { allowed: true, message: "Request allowed".to_string() });
    }

    #[test]
    fn test_empty_fields_still_decided() {
        let engine = FilterEngine::new(sample_config());
        let response = engine.filter(&Request::new("", "", "", 0));
        assert!(response.allowed);
    }

    #[test]
    fn test_rate_limit_checked_first() {
        let (engine, _clock) = engine_with_clock(sample_config());
        let request = Request::new("192.168.1.200", "10.0.0.2", "TCP", 80);

        for i in 1..=5 {
            assert_eq!(engine.decide(&request), Decision::Allowed, "Request {} should pass", i);
        }

        // Exhausted quota masks the blocklist and rules
        let response = engine.filter(&request);
        assert_eq!(
            response,
            Response { allowed: false, message: "Rate limit exceeded".to_string() }
        );
        assert_eq!(
            engine.decide(&Request::new("192.168.1.100", "10.0.0.1", "TCP", 80)),
            Decision::RateLimited
        );
    }

    #[test]
    fn test_denied_requests_consume_quota() {
        let (engine, _clock) = engine_with_clock(sample_config());
        let blocked = Request::new("192.168.1.100", "x", "UDP", 53);

        for _ in 0..5 {
            assert_eq!(engine.decide(&blocked), Decision::BlockedAddress);
        }

        let allowed = Request::new("192.168.1.200", "10.0.0.2", "TCP", 80);
        assert_eq!(engine.decide(&allowed), Decision::RateLimited);
    }

    #[test]
    fn test_quota_replenished_after_window() {
        let (engine, clock) = engine_with_clock(sample_config());
        let request = Request::new("192.168.1.200", "10.0.0.2", "TCP", 80);

        for _ in 0..5 {
            assert!(engine.filter(&request).allowed);
        }
        assert!(!engine.filter(&request).allowed);

        clock.advance(Duration::from_secs(1));

        for _ in 0..5 {
            assert!(engine.filter(&request).allowed);
        }
        assert_eq!(engine.decide(&request), Decision::RateLimited);
    }

    #[test]
    fn test_add_rule_at_runtime() {
        let engine = FilterEngine::new(sample_config());
        let request = Request::new("172.16.0.5", "10.0.0.3", "UDP", 53);

        assert_eq!(engine.decide(&request), Decision::Allowed);

        engine.add_rule(rule("dns", "172.16.0.5", "10.0.0.3", "UDP", 53)).unwrap();
        assert_eq!(engine.decide(&request), Decision::BlockedByRule);

        // Same rule from a different source is not matched
        let other = Request::new("172.16.0.6", "10.0.0.3", "UDP", 53);
        assert_eq!(engine.decide(&other), Decision::Allowed);
    }

    #[test]
    fn test_add_duplicate_rule_fails() {
        let engine = FilterEngine::new(sample_config());

        let err = engine.add_rule(rule("rule1", "", "10.9.9.9", "UDP", 1)).unwrap_err();

        assert_eq!(err, RuleError::DuplicateId("rule1".to_string()));
        assert_eq!(engine.rules(), vec![rule("rule1", "", "10.0.0.1", "TCP", 80)]);
    }

    #[test]
    fn test_remove_rule() {
        let engine = FilterEngine::new(sample_config());
        let request = Request::new("192.168.1.200", "10.0.0.1", "TCP", 80);

        engine.remove_rule("rule1").unwrap();

        assert_eq!(engine.decide(&request), Decision::Allowed);
        assert!(engine.rules().is_empty());
    }

    #[test]
    fn test_remove_unknown_rule_fails() {
        let engine = FilterEngine::new(sample_config());

        let err = engine.remove_rule("missing").unwrap_err();

        assert_eq!(err, RuleError::NotFound("missing".to_string()));
        assert_eq!(engine.rules().len(), 1);
    }

    #[test]
    fn test_duplicate_initial_rules_last_wins() {
        let config = FilterConfig {
            max_requests_per_second: 10,
            blocked_addresses: Vec::new(),
            rules: vec![
                rule("dup", "", "10.0.0.1", "TCP", 80),
                rule("dup", "", "10.0.0.2", "TCP", 80),
            ],
        };
        let engine = FilterEngine::new(config);

        assert_eq!(engine.rules(), vec![rule("dup", "", "10.0.0.2", "TCP", 80)]);
    }

    #[test]
    fn test_zero_quota_denies_everything() {
        let config = FilterConfig { max_requests_per_second: 0, ..sample_config() };
        let engine = FilterEngine::new(config);

        let response = engine.filter(&Request::new("1.1.1.1", "2.2.2.2", "TCP", 22));
        assert_eq!(response.message, "Rate limit exceeded");
    }

    #[test]
    fn test_concurrent_filter_admits_exact_quota() {
        let config = FilterConfig {
            max_requests_per_second: 50,
            blocked_addresses: Vec::new(),
            rules: Vec::new(),
        };
        let (engine, _clock) = engine_with_clock(config);
        let engine = Arc::new(engine);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    let request = Request::new(format!("10.0.{t}.1"), "10.1.1.1", "TCP", 80);
                    (0..40).filter(|_| engine.filter(&request).allowed).count()
                })
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 50);
    }

    #[test]
    fn test_concurrent_rule_mutation_and_filtering() {
        let config = FilterConfig {
            max_requests_per_second: u32::MAX,
            blocked_addresses: Vec::new(),
            rules: Vec::new(),
        };
        let engine = Arc::new(FilterEngine::new(config));

        let writer = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for i in 0..100u16 {
                    engine.add_rule(rule(&format!("r{i}"), "", "10.0.0.1", "TCP", i)).unwrap();
                }
                for i in 0..100u16 {
                    engine.remove_rule(&format!("r{i}")).unwrap();
                }
            })
        };

        let reader = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for i in 0..200u16 {
                    let decision = engine.decide(&Request::new("1.1.1.1", "10.0.0.1", "TCP", i));
                    assert_ne!(decision, Decision::RateLimited);
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
        assert!(engine.rules().is_empty());
    }
}
