//! reduction of multi-button force/moment transducers to body axis loads
//!
//! Every gauge goes through the same life cycle: it starts uninitialized,
//! collects zero samples while the run is in its zeroing interval and
//! becomes active once the zero is finalized. Only active gauges subtract
//! their zero.

pub mod deck;
pub mod dyno6;
pub mod geometry;
pub mod kistler;
mod loads;
pub mod plain;
pub mod rotdyno;
pub mod weight;
pub mod zero;

mod error;
pub use error::Error;

pub use deck::Deck;
pub use dyno6::Dyno6;
pub use geometry::{ChannelCal, GaugeGeometry};
pub use kistler::{Kistler3, Kistler4};
pub use loads::{Component, Loads};
pub use rotdyno::RotDyno6;
pub use zero::ZeroState;

use enum_dispatch::enum_dispatch;
use math::BodyAngles;

/// gauge discriminant, also used as map key for the gauges of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GaugeKind {
    Dyno6,
    RotDyno6,
    Kistler3,
    Kistler4,
    Deck,
}

impl GaugeKind {
    pub const ALL: [GaugeKind; 5] = [
        GaugeKind::Dyno6,
        GaugeKind::RotDyno6,
        GaugeKind::Kistler3,
        GaugeKind::Kistler4,
        GaugeKind::Deck,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GaugeKind::Dyno6 => "dyno6",
            GaugeKind::RotDyno6 => "rotdyno6",
            GaugeKind::Kistler3 => "kistler3",
            GaugeKind::Kistler4 => "kistler4",
            GaugeKind::Deck => "deck",
        }
    }
}

impl std::fmt::Display for GaugeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GaugeState {
    Uninitialized,
    Zeroing,
    Active,
}

#[enum_dispatch]
pub trait Gauge {
    fn kind(&self) -> GaugeKind;
    fn state(&self) -> GaugeState;

    /// body axis loads for one raw sample
    ///
    /// `raw` is the complete raw channel vector of the sample. The zero is
    /// only subtracted if requested and the gauge is active.
    fn compute(&mut self, raw: &[f64], angles: &BodyAngles, subtract_zero: bool) -> Loads;

    /// add one raw sample to the zero sums
    fn accumulate_zero(&mut self, raw: &[f64], angles: &BodyAngles);

    /// average the zero sums and activate the gauge
    ///
    /// Finalizing again without new samples yields the same zero.
    fn finalize_zero(&mut self);

    /// whole-run form of [Gauge::compute]
    fn compute_all(
        &mut self,
        raw: &[&[f64]],
        angles: &[BodyAngles],
        subtract_zero: bool,
    ) -> Vec<Loads> {
        raw.iter()
            .zip(angles.iter())
            .map(|(raw, angles)| self.compute(raw, angles, subtract_zero))
            .collect()
    }
}

#[enum_dispatch(Gauge)]
#[derive(Clone, Debug)]
pub enum GaugeInstance {
    Dyno6(Dyno6),
    RotDyno6(RotDyno6),
    Kistler3(Kistler3),
    Kistler4(Kistler4),
    Deck(Deck),
}
