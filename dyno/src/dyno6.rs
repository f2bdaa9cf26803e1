use crate::plain::{Layout, PlainGauge};
use crate::{GaugeGeometry, GaugeKind};

/// stationary six component balance, one channel per component
#[derive(Clone, Copy, Debug)]
pub struct SixAxis;

impl Layout for SixAxis {
    const KIND: GaugeKind = GaugeKind::Dyno6;
    const CHANNELS: usize = 6;

    fn combine(eu: &ndarray::Array1<f64>, _geometry: &GaugeGeometry) -> ndarray::Array1<f64> {
        eu.clone()
    }
}

pub type Dyno6 = PlainGauge<SixAxis>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use crate::{ChannelCal, Gauge, GaugeState};
    use approx::assert_abs_diff_eq;
    use math::BodyAngles;

    #[test]
    fn passes_through_without_weight() {
        let mut g = Dyno6::new(geometry(vec![0, 1, 2, 3, 4, 5]), unit_cals(6)).unwrap();
        let loads = g.compute(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &BodyAngles::level(), true);
        testlib::assert_arr1_eq(
            &loads.to_array(),
            &ndarray::array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        );
        assert_eq!(g.state(), GaugeState::Uninitialized);
    }

    #[test]
    fn removes_weight_and_arm_moment() {
        let mut geom = geometry(vec![0, 1, 2, 3, 4, 5]);
        geom.weight = 10.0;
        geom.armx = 1.0;
        geom.army = 2.0;
        let mut g = Dyno6::new(geom, unit_cals(6)).unwrap();

        let loads = g.compute(&[0.0, 0.0, 10.0, 20.0, -10.0, 0.0], &BodyAngles::level(), false);
        testlib::assert_arr1_eq(&loads.to_array(), &ndarray::Array1::zeros(6));
    }

    #[test]
    fn zero_subtracted_once_active() {
        let cals = vec![
            ChannelCal {
                gain: 2.0,
                zero: 100.0,
            };
            6
        ];
        let mut g = Dyno6::new(geometry(vec![0, 1, 2, 3, 4, 5]), cals).unwrap();
        let level = BodyAngles::level();

        g.accumulate_zero(&[101.0; 6], &level);
        g.accumulate_zero(&[103.0; 6], &level);
        assert_eq!(g.state(), GaugeState::Zeroing);

        // not finalized yet, nothing to subtract
        let loads = g.compute(&[110.0; 6], &level, true);
        assert_abs_diff_eq!(loads.fx, 20.0);

        g.finalize_zero();
        assert_eq!(g.state(), GaugeState::Active);
        testlib::assert_arr1_eq(g.zero().unwrap(), &ndarray::Array1::from_elem(6, 4.0));

        let loads = g.compute(&[110.0; 6], &level, true);
        assert_abs_diff_eq!(loads.fx, 16.0);
        assert_abs_diff_eq!(loads.mz, 16.0);

        let loads = g.compute(&[110.0; 6], &level, false);
        assert_abs_diff_eq!(loads.fx, 20.0);
    }

    #[test]
    fn zero_taken_at_attitude() {
        let mut geom = geometry(vec![0, 1, 2, 3, 4, 5]);
        geom.weight = 10.0;
        let mut g = Dyno6::new(geom, unit_cals(6)).unwrap();

        let pitched = BodyAngles::from_degrees(0.0, 30.0, 0.0);
        let (wx, _, wz) = math::transform::to_body(0.0, 0.0, 10.0, &pitched);
        let raw = [wx, 0.0, wz, 0.0, 0.0, 0.0];
        g.accumulate_zero(&raw, &pitched);
        g.finalize_zero();

        // the weight at the zero attitude is not part of the zero
        testlib::assert_arr1_eq(g.zero().unwrap(), &ndarray::Array1::zeros(6));
        let loads = g.compute(&raw, &pitched, true);
        assert_abs_diff_eq!(loads.fx, 0.0, epsilon = 1.0e-12);
        assert_abs_diff_eq!(loads.fz, 0.0, epsilon = 1.0e-12);
    }

    #[test]
    fn whole_run_matches_single_samples() {
        let mut geom = geometry(vec![0, 1, 2, 3, 4, 5]);
        geom.weight = 3.0;
        geom.armz = 0.5;
        let mut whole = Dyno6::new(geom.clone(), unit_cals(6)).unwrap();
        let mut single = Dyno6::new(geom, unit_cals(6)).unwrap();

        let raw: Vec<Vec<f64>> = (0..4)
            .map(|i| (0..6).map(|c| (i * 6 + c) as f64).collect())
            .collect();
        let angles: Vec<BodyAngles> = (0..4)
            .map(|i| BodyAngles::from_degrees(i as f64, -2.0 * i as f64, 0.0))
            .collect();
        let refs: Vec<&[f64]> = raw.iter().map(Vec::as_slice).collect();

        let all = whole.compute_all(&refs, &angles, false);
        let a = ndarray::Array2::from_shape_fn((4, 6), |(i, j)| all[i].to_array()[j]);
        let b = ndarray::Array2::from_shape_fn((4, 6), |(i, j)| {
            single.compute(&raw[i], &angles[i], false).to_array()[j]
        });
        testlib::assert_arr2_eq(&a, &b);
    }

    #[test]
    fn missing_channels_read_as_zero() {
        let mut g = Dyno6::new(geometry(vec![0, 1, 2, 3, 4, 20]), unit_cals(6)).unwrap();
        let loads = g.compute(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0], &BodyAngles::level(), false);
        assert_eq!(loads.mz, 0.0);
    }
}
