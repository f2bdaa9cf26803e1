use crate::geometry::Reduction;
use crate::weight::SelfWeight;
use crate::{ChannelCal, Error, Gauge, GaugeGeometry, GaugeKind, GaugeState, Loads, ZeroState};
use math::BodyAngles;

/// how the calibrated gauge channels combine into one 6-vector
pub trait Layout {
    const KIND: GaugeKind;
    const CHANNELS: usize;

    fn combine(eu: &ndarray::Array1<f64>, geometry: &GaugeGeometry) -> ndarray::Array1<f64>;
}

/// gauge with a static zero: combine, interaction, orientation, self weight
#[derive(Clone, Debug)]
pub struct PlainGauge<L> {
    reduction: Reduction,
    weight: SelfWeight,
    raw_zero: ZeroState,
    attitude_zero: ZeroState,
    zero: Option<ndarray::Array1<f64>>,
    state: GaugeState,
    layout: std::marker::PhantomData<L>,
}

impl<L: Layout> PlainGauge<L> {
    pub fn new(geometry: GaugeGeometry, cals: Vec<ChannelCal>) -> Result<Self, Error> {
        let weight = SelfWeight::new(geometry.weight, geometry.arm());
        let reduction = Reduction::new(L::KIND, geometry, cals, L::CHANNELS)?;

        Ok(Self {
            reduction,
            weight,
            raw_zero: ZeroState::new(L::CHANNELS),
            attitude_zero: ZeroState::new(2),
            zero: None,
            state: GaugeState::Uninitialized,
            layout: std::marker::PhantomData,
        })
    }

    pub fn geometry(&self) -> &GaugeGeometry {
        &self.reduction.geometry
    }

    /// the finalized zero, in body axes
    pub fn zero(&self) -> Option<&ndarray::Array1<f64>> {
        self.zero.as_ref()
    }

    fn loads(&self, eu: &ndarray::Array1<f64>, angles: &BodyAngles) -> ndarray::Array1<f64> {
        let combined = L::combine(eu, &self.reduction.geometry);
        let mut v = self.reduction.reduce(&combined);
        v -= &self.weight.loads(angles);
        v
    }
}

impl<L: Layout> Gauge for PlainGauge<L> {
    fn kind(&self) -> GaugeKind {
        L::KIND
    }

    fn state(&self) -> GaugeState {
        self.state
    }

    fn compute(&mut self, raw: &[f64], angles: &BodyAngles, subtract_zero: bool) -> Loads {
        let eu = self.reduction.calibrate(raw);
        let mut v = self.loads(&eu, angles);

        if subtract_zero {
            if let Some(zero) = &self.zero {
                v -= zero;
            }
        }

        Loads::from(&v)
    }

    fn accumulate_zero(&mut self, raw: &[f64], angles: &BodyAngles) {
        self.raw_zero.accumulate(&self.reduction.counts(raw));
        self.attitude_zero
            .accumulate(&ndarray::array![angles.roll, angles.pitch]);
        self.state = GaugeState::Zeroing;
    }

    fn finalize_zero(&mut self) {
        let counts = self.raw_zero.finalize().cloned();
        let attitude = self.attitude_zero.finalize().cloned();

        if let (Some(counts), Some(attitude)) = (counts, attitude) {
            let eu = self.reduction.calibrate_counts(&counts);
            let angles = BodyAngles::new(attitude[0], attitude[1], 0.0);
            self.zero = Some(self.loads(&eu, &angles));
            log::debug!(
                "{}: zero from {} samples: {}",
                L::KIND,
                self.raw_zero.count(),
                self.zero.as_ref().map(|z| z.to_string()).unwrap_or_default()
            );
        }

        self.state = GaugeState::Active;
    }
}
