use crate::geometry::Reduction;
use crate::kistler::ThreeButton;
use crate::plain::Layout;
use crate::weight::SelfWeight;
use crate::{ChannelCal, Error, Gauge, GaugeGeometry, GaugeKind, GaugeState, Loads, ZeroState};
use math::BodyAngles;

/// inches per foot, the plate moments are in in-lb
const IN_PER_FT: f64 = 12.0;

#[derive(Clone, Debug)]
pub struct DeckGeometry {
    pub forward: GaugeGeometry,
    pub aft: GaugeGeometry,
    /// plate positions along x, unit: in
    pub xfwd: f64,
    pub xaft: f64,
    pub weight: f64,
    pub arm: [f64; 3],
}

/// composite deck balance made of a forward and an aft 3-button plate
///
/// The zero is taken at whatever attitude the model had while zeroing, so
/// only the change of the weight loads since then is removed.
#[derive(Clone, Debug)]
pub struct Deck {
    forward: Reduction,
    aft: Reduction,
    xfwd: f64,
    xaft: f64,
    weight: SelfWeight,

    /// combined loads, roll, pitch
    zero_sums: ZeroState,
    zero: Option<ndarray::Array1<f64>>,
    zero_angles: BodyAngles,
    state: GaugeState,
}

impl Deck {
    pub fn new(
        geometry: DeckGeometry,
        forward_cals: Vec<ChannelCal>,
        aft_cals: Vec<ChannelCal>,
    ) -> Result<Self, Error> {
        let n = ThreeButton::CHANNELS;
        Ok(Self {
            forward: Reduction::new(GaugeKind::Deck, geometry.forward, forward_cals, n)?,
            aft: Reduction::new(GaugeKind::Deck, geometry.aft, aft_cals, n)?,
            xfwd: geometry.xfwd,
            xaft: geometry.xaft,
            weight: SelfWeight::new(geometry.weight, geometry.arm),
            zero_sums: ZeroState::new(8),
            zero: None,
            zero_angles: BodyAngles::level(),
            state: GaugeState::Uninitialized,
        })
    }

    fn plate(reduction: &Reduction, raw: &[f64]) -> ndarray::Array1<f64> {
        let eu = reduction.calibrate(raw);
        reduction.reduce(&ThreeButton::combine(&eu, &reduction.geometry))
    }

    /// both plates combined about the deck origin, moments in ft-lb
    pub fn combined(&self, raw: &[f64]) -> ndarray::Array1<f64> {
        let f = Self::plate(&self.forward, raw);
        let a = Self::plate(&self.aft, raw);

        ndarray::array![
            a[0] + f[0],
            a[1] + f[1],
            a[2] + f[2],
            (a[3] + f[3]) / IN_PER_FT,
            (a[4] + f[4] - self.xaft * a[2] - self.xfwd * f[2]) / IN_PER_FT,
            (a[5] + f[5] + self.xaft * a[1] + self.xfwd * f[1]) / IN_PER_FT,
        ]
    }

    /// weight loads at `angles` minus those at the zero attitude
    pub fn weight_delta(&self, angles: &BodyAngles) -> ndarray::Array1<f64> {
        self.weight.loads(angles) - self.weight.loads(&self.zero_angles)
    }

    pub fn zero(&self) -> Option<&ndarray::Array1<f64>> {
        self.zero.as_ref()
    }

    /// averaged attitude of the zero samples, level until finalized
    pub fn zero_angles(&self) -> &BodyAngles {
        &self.zero_angles
    }
}

impl Gauge for Deck {
    fn kind(&self) -> GaugeKind {
        GaugeKind::Deck
    }

    fn state(&self) -> GaugeState {
        self.state
    }

    fn compute(&mut self, raw: &[f64], angles: &BodyAngles, subtract_zero: bool) -> Loads {
        let mut v = self.combined(raw);
        v -= &self.weight_delta(angles);

        if subtract_zero {
            if let Some(zero) = &self.zero {
                v -= zero;
            }
        }

        Loads::from(&v)
    }

    fn accumulate_zero(&mut self, raw: &[f64], angles: &BodyAngles) {
        let mut sample = self.combined(raw).to_vec();
        sample.push(angles.roll);
        sample.push(angles.pitch);

        self.zero_sums.accumulate(&ndarray::Array1::from(sample));
        self.state = GaugeState::Zeroing;
    }

    fn finalize_zero(&mut self) {
        if let Some(avg) = self.zero_sums.finalize().cloned() {
            self.zero = Some(avg.slice(ndarray::s![..6]).to_owned());
            self.zero_angles = BodyAngles::new(avg[6], avg[7], 0.0);
            log::debug!(
                "{}: zero from {} samples at roll {:.3} pitch {:.3} deg",
                GaugeKind::Deck,
                self.zero_sums.count(),
                avg[6].to_degrees(),
                avg[7].to_degrees()
            );
        }

        self.state = GaugeState::Active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use approx::assert_abs_diff_eq;

    fn deck(weight: f64) -> Deck {
        let geometry = DeckGeometry {
            forward: geometry((0..9).collect()),
            aft: geometry((9..18).collect()),
            xfwd: 20.0,
            xaft: -4.0,
            weight,
            arm: [1.0, 0.0, 2.0],
        };
        Deck::new(geometry, unit_cals(9), unit_cals(9)).unwrap()
    }

    /// per-button (fy, fz) for every button of the forward then aft plate
    fn raw(fwd: (f64, f64), aft: (f64, f64)) -> Vec<f64> {
        let mut raw = vec![0.0; 18];
        for b in 0..3 {
            raw[3 * b + 1] = fwd.0;
            raw[3 * b + 2] = fwd.1;
            raw[9 + 3 * b + 1] = aft.0;
            raw[9 + 3 * b + 2] = aft.1;
        }
        raw
    }

    #[test]
    fn plate_lever_arms() {
        let g = deck(0.0);

        let v = g.combined(&raw((0.0, 1.0), (0.0, 1.0)));
        assert_abs_diff_eq!(v[2], 6.0);
        // (4 * 3 - 20 * 3) / 12
        assert_abs_diff_eq!(v[4], -4.0);

        let v = g.combined(&raw((1.0, 0.0), (2.0, 0.0)));
        assert_abs_diff_eq!(v[1], 9.0);
        // (-4 * 6 + 20 * 3) / 12
        assert_abs_diff_eq!(v[5], 3.0);
        assert_abs_diff_eq!(v[3], 0.0);
    }

    #[test]
    fn no_weight_delta_when_level() {
        let g = deck(25.0);
        let delta = g.weight_delta(&BodyAngles::level());
        assert_eq!(delta, ndarray::Array1::<f64>::zeros(6));
    }

    #[test]
    fn weight_delta_from_zero_attitude() {
        let mut g = deck(25.0);
        let pitched = BodyAngles::from_degrees(0.0, 5.0, 0.0);
        let sample = raw((0.5, 2.0), (0.25, 1.0));

        g.accumulate_zero(&sample, &pitched);
        g.accumulate_zero(&sample, &pitched);
        g.finalize_zero();
        assert_abs_diff_eq!(g.zero_angles().pitch, pitched.pitch, epsilon = 1.0e-15);

        testlib::assert_arr1_eq(&g.weight_delta(&pitched), &ndarray::Array1::zeros(6));
        let loads = g.compute(&sample, &pitched, true);
        testlib::assert_arr1_eq(&loads.to_array(), &ndarray::Array1::zeros(6));

        // pitching back to level releases the weight taken with the zero
        let level = BodyAngles::level();
        let delta = g.weight_delta(&level);
        let expected = SelfWeight::new(25.0, [1.0, 0.0, 2.0]).loads(&level)
            - SelfWeight::new(25.0, [1.0, 0.0, 2.0]).loads(&pitched);
        testlib::assert_arr1_eq(&delta, &expected);
    }

    #[test]
    fn uncorrected_before_finalize() {
        let mut g = deck(0.0);
        let sample = raw((0.0, 1.0), (0.0, 1.0));
        g.accumulate_zero(&sample, &BodyAngles::level());
        assert_eq!(g.state(), GaugeState::Zeroing);

        let loads = g.compute(&sample, &BodyAngles::level(), true);
        assert_abs_diff_eq!(loads.fz, 6.0);
    }
}
