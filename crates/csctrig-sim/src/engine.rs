//! Scenario engine: tracks plus noise, one chamber per event.

use csctrig_core::constants::NLAYERS;
use csctrig_core::error::HitMapError;
use csctrig_core::{AlctChamberHits, ChamberHits, ChamberId, ComparatorDigi, HitSource, RecHit, WireDigi};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};

use crate::config::{ScenarioConfig, SimError, TrackConfig};
use crate::track::MuonTrack;

/// Time bins noise hits are spread over
const NOISE_TIME_BINS: u8 = 16;

/// Digis and truth for one chamber crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct SimEvent {
    pub chamber: ChamberId,
    pub comparators: Vec<ComparatorDigi>,
    pub rechits: Vec<RecHit>,
    pub wires: Vec<WireDigi>,
    pub truth: Vec<MuonTrack>,
}

impl SimEvent {
    /// Cathode hit map from the comparators or the rechits.
    pub fn cathode_hits(&self, source: HitSource) -> Result<ChamberHits, HitMapError> {
        let mut hits = ChamberHits::new(self.chamber, source);
        match source {
            HitSource::Comparator => hits.fill_comparators(&self.comparators)?,
            HitSource::RecHit => hits.fill_rechits(&self.rechits)?,
        };
        Ok(hits)
    }

    /// Anode hit map as seen at bunch crossing `bx`.
    pub fn anode_hits(&self, bx: u8) -> Result<AlctChamberHits, HitMapError> {
        let mut hits = AlctChamberHits::new(self.chamber);
        hits.fill_at_time(&self.wires, bx)?;
        Ok(hits)
    }
}

/// Draws single tracks inside a chamber.
#[derive(Debug, Clone)]
pub struct TrackGenerator {
    config: TrackConfig,
    key_range: (f64, f64),
    n_wire_groups: u16,
}

impl TrackGenerator {
    pub fn new(scenario: &ScenarioConfig) -> Result<Self, SimError> {
        scenario.validate()?;
        let geometry = scenario
            .chamber
            .geometry()
            .ok_or(SimError::Geometry(scenario.chamber))?;
        let key_range = scenario.key_range().ok_or(SimError::Geometry(scenario.chamber))?;
        Ok(Self {
            config: scenario.track.clone(),
            key_range,
            n_wire_groups: geometry.n_wire_groups as u16,
        })
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> MuonTrack {
        let (lo, hi) = self.key_range;
        let key_strip = rng.gen_range(lo..hi);
        let slope = if self.config.max_slope > 0.0 {
            rng.gen_range(-self.config.max_slope..=self.config.max_slope)
        } else {
            0.0
        };
        let key_wire_group = rng.gen_range(0..self.n_wire_groups);
        MuonTrack::new(key_strip, slope, key_wire_group, self.config.time_bin)
    }
}

/// Seeded event source for one chamber.
pub struct ScenarioEngine {
    config: ScenarioConfig,
    generator: TrackGenerator,
    rng: StdRng,
    smear: Option<Normal<f64>>,
    noise: Option<Poisson<f64>>,
    events_generated: u64,
}

impl ScenarioEngine {
    pub fn new(config: ScenarioConfig) -> Result<Self, SimError> {
        let generator = TrackGenerator::new(&config)?;
        let smear = if config.track.position_smear > 0.0 {
            Some(Normal::new(0.0, config.track.position_smear).map_err(|e| SimError::InvalidParameter {
                name: "position_smear",
                reason: e.to_string(),
            })?)
        } else {
            None
        };
        let noise = if config.noise_per_layer > 0.0 {
            Some(Poisson::new(config.noise_per_layer).map_err(|e| SimError::InvalidParameter {
                name: "noise_per_layer",
                reason: e.to_string(),
            })?)
        } else {
            None
        };
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            generator,
            rng,
            smear,
            noise,
            events_generated: 0,
        })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn events_generated(&self) -> u64 {
        self.events_generated
    }

    /// Generate the next event.
    pub fn next_event(&mut self) -> SimEvent {
        let chamber = self.config.chamber;
        let mut event = SimEvent {
            chamber,
            comparators: Vec::new(),
            rechits: Vec::new(),
            wires: Vec::new(),
            truth: Vec::with_capacity(self.config.tracks_per_event),
        };

        for _ in 0..self.config.tracks_per_event {
            let track = self.generator.generate(&mut self.rng);
            self.add_track(&mut event, &track);
            event.truth.push(track);
        }
        self.add_noise(&mut event);

        self.events_generated += 1;
        tracing::debug!(
            event = self.events_generated,
            chamber = %chamber,
            comparators = event.comparators.len(),
            rechits = event.rechits.len(),
            wires = event.wires.len(),
            "generated event"
        );
        event
    }

    /// Generate `n` events.
    pub fn generate(&mut self, n: usize) -> Vec<SimEvent> {
        (0..n).map(|_| self.next_event()).collect()
    }

    fn add_track(&mut self, event: &mut SimEvent, track: &MuonTrack) {
        let cfg = &self.config.track;
        for layer in 0..NLAYERS {
            if !self.rng.gen_bool(cfg.layer_efficiency) {
                continue;
            }
            let time = track.time_bin + self.rng.gen_range(0..=cfg.time_jitter);
            let smear = self.smear.as_ref().map_or(0.0, |n| n.sample(&mut self.rng));
            event.comparators.extend(track.comparator(event.chamber, layer, time));
            event.rechits.extend(track.rechit(event.chamber, layer, time, smear));
            event.wires.extend(track.wire(event.chamber, layer, time));
        }
    }

    fn add_noise(&mut self, event: &mut SimEvent) {
        let Some(noise) = self.noise.as_ref() else {
            return;
        };
        let Some(geometry) = event.chamber.geometry() else {
            return;
        };
        for layer in 0..NLAYERS as u8 {
            let n = noise.sample(&mut self.rng) as usize;
            for _ in 0..n {
                let hs = self.rng.gen_range(0..geometry.n_half_strips as u16);
                let time = self.rng.gen_range(0..NOISE_TIME_BINS);
                event.comparators.push(ComparatorDigi::new(layer, hs, time));
                event
                    .rechits
                    .push(RecHit::new(layer, (f32::from(hs) + 0.5) / 2.0, time));
            }
            let n = noise.sample(&mut self.rng) as usize;
            for _ in 0..n {
                let wg = self.rng.gen_range(0..geometry.n_wire_groups as u16);
                let time = self.rng.gen_range(0..NOISE_TIME_BINS);
                event.wires.push(WireDigi::new(layer, wg, time));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> ScenarioConfig {
        ScenarioConfig::default()
    }

    #[test]
    fn test_same_seed_same_events() {
        let mut a = ScenarioEngine::new(quiet()).unwrap();
        let mut b = ScenarioEngine::new(quiet()).unwrap();
        assert_eq!(a.generate(5), b.generate(5));
        assert_eq!(a.events_generated(), 5);
    }

    #[test]
    fn test_different_seed_different_tracks() {
        let mut a = ScenarioEngine::new(quiet()).unwrap();
        let mut b = ScenarioEngine::new(ScenarioConfig { seed: 7, ..quiet() }).unwrap();
        assert_ne!(a.next_event().truth, b.next_event().truth);
    }

    #[test]
    fn test_full_efficiency_fills_every_layer() {
        let mut engine = ScenarioEngine::new(quiet()).unwrap();
        for event in engine.generate(20) {
            assert_eq!(event.truth.len(), 1);
            assert_eq!(event.comparators.len(), NLAYERS);
            assert_eq!(event.rechits.len(), NLAYERS);
            assert_eq!(event.wires.len(), NLAYERS);
            let key = event.truth[0].key_strip;
            let (lo, hi) = engine.config().key_range().unwrap();
            assert!((lo..hi).contains(&key));
        }
    }

    #[test]
    fn test_zero_efficiency_is_empty() {
        let mut cfg = quiet();
        cfg.track.layer_efficiency = 0.0;
        let event = ScenarioEngine::new(cfg).unwrap().next_event();
        assert!(event.comparators.is_empty());
        assert!(event.wires.is_empty());
        assert_eq!(event.truth.len(), 1);
    }

    #[test]
    fn test_noise_adds_hits() {
        let cfg = ScenarioConfig {
            tracks_per_event: 0,
            noise_per_layer: 3.0,
            ..quiet()
        };
        let mut engine = ScenarioEngine::new(cfg).unwrap();
        let total: usize = engine.generate(10).iter().map(|e| e.comparators.len()).sum();
        assert!(total > 0);
    }

    #[test]
    fn test_event_hit_maps() {
        let mut engine = ScenarioEngine::new(quiet()).unwrap();
        let event = engine.next_event();
        let cathode = event.cathode_hits(HitSource::Comparator).unwrap();
        assert_eq!(cathode.nhits(), NLAYERS);
        let rechits = event.cathode_hits(HitSource::RecHit).unwrap();
        assert_eq!(rechits.nhits(), NLAYERS);
        let anode = event.anode_hits(event.truth[0].time_bin).unwrap();
        assert_eq!(anode.nhits(), NLAYERS);
        // Wire hits have not fired yet one bunch crossing early
        let early = event.anode_hits(event.truth[0].time_bin - 1).unwrap();
        assert!(early.is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let cfg = ScenarioConfig {
            noise_per_layer: -1.0,
            ..quiet()
        };
        assert!(ScenarioEngine::new(cfg).is_err());
    }
}
