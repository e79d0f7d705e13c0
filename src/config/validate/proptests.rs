//! Property-based tests for study validation

use super::error::ValidationError;
use super::validator::validate_spec;
use crate::config::schema::*;
use crate::optim::hpo::PsoConfig;
use proptest::prelude::*;

fn arb_valid_spec() -> impl Strategy<Value = StudySpec> {
    (
        1usize..64,                     // num_particles
        1usize..50,                     // max_generations
        -100.0f64..100.0,               // low
        1e-3f64..100.0,                 // span
        proptest::option::of(1usize..8), // stagnation_patience
    )
        .prop_map(|(particles, generations, low, span, patience)| {
            let mut swarm = PsoConfig::new(particles, generations);
            swarm.stagnation_patience = patience;
            StudySpec {
                name: "prop_study".to_string(),
                space: vec![
                    ParamSpec::continuous("x", low, low + span),
                    ParamSpec::categorical("act", &["relu", "tanh"]),
                ],
                swarm,
                pruner: None,
                regularizer: None,
                objective: ObjectiveSpec::named("sphere"),
                output: OutputSpec::default(),
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_valid_spec_passes(spec in arb_valid_spec()) {
        prop_assert!(validate_spec(&spec).is_ok());
        prop_assert!(spec.build_space().is_ok());
    }

    #[test]
    fn prop_inverted_bounds_fail(spec in arb_valid_spec()) {
        let mut spec = spec;
        let (low, high) = (spec.space[0].low, spec.space[0].high);
        spec.space[0].low = high;
        spec.space[0].high = low;
        let is_invalid_bounds =
            matches!(validate_spec(&spec), Err(ValidationError::InvalidBounds { .. }));
        prop_assert!(is_invalid_bounds);
    }

    #[test]
    fn prop_zero_particles_fail(spec in arb_valid_spec()) {
        let mut spec = spec;
        spec.swarm.num_particles = 0;
        let is_invalid = matches!(validate_spec(&spec), Err(ValidationError::InvalidParticles(0)));
        prop_assert!(is_invalid);
    }
}
