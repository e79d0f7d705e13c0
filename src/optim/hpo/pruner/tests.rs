//! Tests for pruners

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::optim::hpo::error::HPOError;
    use crate::optim::hpo::pruner::median::median;
    use crate::optim::hpo::pruner::{MedianPruner, NopPruner, PruneQuery, Pruner, PruningHistory};
    use crate::optim::hpo::types::{Direction, Trial};

    fn query(particle_id: usize, generation: usize, step: usize, value: f64) -> PruneQuery {
        PruneQuery { particle_id, generation, step, value, direction: Direction::Maximize }
    }

    fn eager() -> MedianPruner {
        MedianPruner::new(0, 0, 1, 1).expect("valid thresholds")
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    #[test]
    fn test_median_pruner_rejects_zero_min_trials() {
        let err = MedianPruner::new(0, 0, 1, 0).unwrap_err();
        assert!(matches!(err, HPOError::PruningPolicyViolation(_)));
    }

    #[test]
    fn test_median_pruner_rejects_zero_interval() {
        let err = MedianPruner::new(0, 0, 0, 1).unwrap_err();
        assert!(matches!(err, HPOError::PruningPolicyViolation(_)));
    }

    #[test]
    fn test_median_pruner_defaults() {
        let pruner = MedianPruner::default();
        assert_eq!(pruner.n_startup_generations(), 3);
        assert_eq!(pruner.n_warmup_steps(), 4);
        assert_eq!(pruner.interval_steps(), 4);
        assert_eq!(pruner.min_trials_per_step(), 4);
        assert!(pruner.exempt_best());
        assert!(pruner.validate().is_ok());
    }

    #[test]
    fn test_median_helper() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0]), Some(3.0));
        assert_eq!(median(&[1.0, 3.0, 2.0]), Some(2.0));
        assert_eq!(median(&[1.0, 2.0, 3.0, 100.0]), Some(2.5));
    }

    // -------------------------------------------------------------------------
    // Decision rule
    // -------------------------------------------------------------------------

    #[test]
    fn test_four_trials_best_is_exempt() {
        let pruner = eager();
        let history = PruningHistory::new(0);
        for (pid, v) in [1.0, 2.0, 3.0, 100.0].into_iter().enumerate() {
            history.record(0, pid, v);
        }

        assert!(!pruner.should_prune(&query(3, 0, 0, 100.0), &history));
        // median of peers {2, 3, 100} and {1, 3, 100} is 3
        assert!(pruner.should_prune(&query(0, 0, 0, 1.0), &history));
        assert!(pruner.should_prune(&query(1, 0, 0, 2.0), &history));
        // peers {1, 2, 100} have median 2, and 3 beats it
        assert!(!pruner.should_prune(&query(2, 0, 0, 3.0), &history));
    }

    #[test]
    fn test_minimize_direction() {
        let pruner = eager();
        let history = PruningHistory::new(0);
        for (pid, v) in [0.1, 0.2, 0.3, 5.0].into_iter().enumerate() {
            history.record(0, pid, v);
        }
        let q = |pid, v| PruneQuery {
            particle_id: pid,
            generation: 0,
            step: 0,
            value: v,
            direction: Direction::Minimize,
        };
        assert!(!pruner.should_prune(&q(0, 0.1), &history));
        assert!(pruner.should_prune(&q(3, 5.0), &history));
    }

    #[test]
    fn test_startup_generations_gate() {
        let pruner = MedianPruner::new(2, 0, 1, 1).expect("valid thresholds");
        let history = PruningHistory::new(1);
        history.record(0, 0, 10.0);
        history.record(0, 1, 0.0);
        assert!(!pruner.should_prune(&query(1, 1, 0, 0.0), &history));
        assert!(pruner.should_prune(&query(1, 2, 0, 0.0), &history));
    }

    #[test]
    fn test_warmup_and_interval_gate() {
        let pruner = MedianPruner::new(0, 2, 3, 1).expect("valid thresholds");
        let history = PruningHistory::new(0);
        for step in 0..10 {
            history.record(step, 0, 10.0);
            history.record(step, 1, 0.0);
        }
        let checkpoints: Vec<usize> =
            (0..10).filter(|&s| pruner.should_prune(&query(1, 0, s, 0.0), &history)).collect();
        assert_eq!(checkpoints, vec![2, 5, 8]);
    }

    #[test]
    fn test_min_trials_per_step_gate() {
        let pruner = MedianPruner::new(0, 0, 1, 3).expect("valid thresholds");
        let history = PruningHistory::new(0);
        history.record(0, 0, 10.0);
        history.record(0, 1, 9.0);
        history.record(0, 2, 0.0);
        // only two peers besides particle 2
        assert!(!pruner.should_prune(&query(2, 0, 0, 0.0), &history));
        history.record(0, 3, 8.0);
        assert!(pruner.should_prune(&query(2, 0, 0, 0.0), &history));
    }

    #[test]
    fn test_tied_best_is_exempt() {
        let pruner = eager();
        let history = PruningHistory::new(0);
        history.record(0, 0, 5.0);
        history.record(0, 1, 5.0);
        history.record(0, 2, 1.0);
        assert!(!pruner.should_prune(&query(0, 0, 0, 5.0), &history));
        assert!(!pruner.should_prune(&query(1, 0, 0, 5.0), &history));
    }

    #[test]
    fn test_exemption_can_be_disabled() {
        let pruner = eager().with_best_exemption(false);
        let history = PruningHistory::new(0);
        history.record(0, 0, 5.0);
        history.record(0, 1, 5.0);
        // not worse than the median of its peer, so still kept
        assert!(!pruner.should_prune(&query(0, 0, 0, 5.0), &history));
        assert!(!pruner.exempt_best());
    }

    #[test]
    fn test_nan_value_is_pruned_once_eligible() {
        let pruner = eager();
        let history = PruningHistory::new(0);
        history.record(0, 0, 1.0);
        history.record(0, 1, f64::NAN);
        assert!(pruner.should_prune(&query(1, 0, 0, f64::NAN), &history));
    }

    #[test]
    fn test_nop_pruner_never_prunes() {
        let history = PruningHistory::new(0);
        history.record(0, 0, 100.0);
        history.record(0, 1, 0.0);
        assert!(!NopPruner.should_prune(&query(1, 0, 0, 0.0), &history));
        assert_eq!(NopPruner.name(), "NopPruner");
    }

    #[test]
    fn test_trial_should_prune_with_uses_latest_report() {
        let pruner = eager();
        let history = PruningHistory::new(0);
        history.record(0, 0, 10.0);
        history.record(0, 1, 20.0);

        let mut trial = Trial::new(2, 0, HashMap::new(), vec![]);
        assert!(!trial.should_prune_with(&pruner, &history, Direction::Maximize));

        trial.report_value(0, 1.0).expect("first report");
        history.record(0, 2, 1.0);
        assert!(trial.should_prune_with(&pruner, &history, Direction::Maximize));
        // pure query: nothing recorded as a cancellation request
        assert!(!trial.is_prune_requested());
    }
}

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use crate::optim::hpo::pruner::{MedianPruner, PruneQuery, Pruner, PruningHistory};
    use crate::optim::hpo::types::Direction;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_never_prunes_below_min_trials(
            values in prop::collection::vec(-100.0f64..100.0, 1..12),
            min_trials in 1usize..16,
            maximize in any::<bool>(),
        ) {
            let pruner = MedianPruner::new(0, 0, 1, min_trials).expect("valid thresholds");
            let direction = if maximize { Direction::Maximize } else { Direction::Minimize };
            let history = PruningHistory::new(0);
            for (pid, v) in values.iter().enumerate() {
                history.record(0, pid, *v);
            }
            for (pid, v) in values.iter().enumerate() {
                let q = PruneQuery { particle_id: pid, generation: 0, step: 0, value: *v, direction };
                let peers = values.len() - 1;
                if peers < min_trials {
                    prop_assert!(!pruner.should_prune(&q, &history));
                }
            }
        }

        #[test]
        fn prop_never_prunes_step_best(
            values in prop::collection::vec(-100.0f64..100.0, 2..16),
            maximize in any::<bool>(),
        ) {
            let pruner = MedianPruner::new(0, 0, 1, 1).expect("valid thresholds");
            let direction = if maximize { Direction::Maximize } else { Direction::Minimize };
            let history = PruningHistory::new(0);
            for (pid, v) in values.iter().enumerate() {
                history.record(0, pid, *v);
            }
            let best = values
                .iter()
                .copied()
                .fold(None, |acc: Option<f64>, v| match acc {
                    Some(b) if !direction.is_better(v, b) => Some(b),
                    _ => Some(v),
                })
                .expect("non-empty");
            for (pid, v) in values.iter().enumerate() {
                if *v == best {
                    let q = PruneQuery { particle_id: pid, generation: 0, step: 0, value: *v, direction };
                    prop_assert!(!pruner.should_prune(&q, &history));
                }
            }
        }
    }
}
