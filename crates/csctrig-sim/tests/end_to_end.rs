//! Generated tracks pushed through the cathode and anode extractors.

use csctrig_core::{AlctExtractor, ClctConfig, ClctExtractor, HitSource, Ranking};
use csctrig_sim::{ScenarioConfig, ScenarioEngine, TrackConfig};
use proptest::prelude::*;

fn single_track(seed: u64) -> ScenarioConfig {
    ScenarioConfig {
        track: TrackConfig {
            max_slope: 0.25,
            ..Default::default()
        },
        seed,
        ..Default::default()
    }
}

#[test]
fn test_single_track_found_near_truth() {
    let extractor = ClctExtractor::from_config(&ClctConfig::default(), None).unwrap();
    let mut engine = ScenarioEngine::new(single_track(1)).unwrap();

    for event in engine.generate(50) {
        let truth = event.truth[0];
        let hits = event.cathode_hits(HitSource::Comparator).unwrap();
        let found = extractor.extract(&hits).unwrap();
        assert_eq!(found.len(), 1, "track {:?}", truth);

        let best = &found[0];
        assert_eq!(best.layer_count(), 6);
        let position = f64::from(best.position().unwrap());
        assert!(
            (position - truth.key_strip).abs() < 0.75,
            "position {} truth {:?}",
            position,
            truth
        );
    }
}

#[test]
fn test_rechits_match_comparators() {
    let extractor = ClctExtractor::from_config(&ClctConfig::default(), None).unwrap();
    let mut engine = ScenarioEngine::new(single_track(2)).unwrap();

    for event in engine.generate(20) {
        let from_digis = extractor
            .extract(&event.cathode_hits(HitSource::Comparator).unwrap())
            .unwrap();
        let from_rechits = extractor
            .extract(&event.cathode_hits(HitSource::RecHit).unwrap())
            .unwrap();
        assert_eq!(from_digis.len(), from_rechits.len());
        for (a, b) in from_digis.iter().zip(&from_rechits) {
            assert_eq!(a.key_half_strip(), b.key_half_strip());
            assert_eq!(a.pattern_id(), b.pattern_id());
        }
    }
}

#[test]
fn test_cfeb_ranking_keeps_six_layer_track() {
    let config = ClctConfig {
        ranking: Ranking::Cfeb,
        ..Default::default()
    };
    let extractor = ClctExtractor::from_config(&config, None).unwrap();
    let mut engine = ScenarioEngine::new(single_track(3)).unwrap();

    for event in engine.generate(20) {
        let found = extractor
            .extract(&event.cathode_hits(HitSource::Comparator).unwrap())
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].layer_count(), 6);
    }
}

#[test]
fn test_anode_track_at_truth_wire_group() {
    let extractor = AlctExtractor::default();
    let mut engine = ScenarioEngine::new(single_track(4)).unwrap();

    for event in engine.generate(30) {
        let truth = event.truth[0];
        let hits = event.anode_hits(truth.time_bin).unwrap();
        let found = extractor.extract(&hits).unwrap();
        assert_eq!(found.len(), 1, "track {:?}", truth);
        assert_eq!(found[0].kwg, usize::from(truth.key_wire_group));
        assert_eq!(found[0].quality, 3);
        assert_eq!(found[0].track_number, 1);
        assert_eq!(found[0].first_bx, truth.time_bin);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_noisy_events_stay_bounded(seed in any::<u64>(), noise in 0.0f64..4.0) {
        let config = ScenarioConfig {
            tracks_per_event: 2,
            noise_per_layer: noise,
            seed,
            ..Default::default()
        };
        let extractor = ClctExtractor::from_config(&ClctConfig::default(), None).unwrap();
        let anode = AlctExtractor::default();
        let mut engine = ScenarioEngine::new(config).unwrap();
        let event = engine.next_event();

        let clcts = extractor.extract(&event.cathode_hits(HitSource::Comparator).unwrap()).unwrap();
        prop_assert!(clcts.len() <= 2);
        prop_assert!(clcts.iter().all(|c| c.layer_count() >= 3));

        let alcts = anode.extract(&event.anode_hits(7).unwrap()).unwrap();
        prop_assert!(alcts.len() <= 2);
        for (i, a) in alcts.iter().enumerate() {
            prop_assert_eq!(usize::from(a.track_number), i + 1);
        }
    }
}
