use crate::Error;
use crate::GaugeKind;

/// linear channel calibration, EU = (raw - zero) * gain
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelCal {
    pub gain: f64,
    pub zero: f64,
}

impl ChannelCal {
    #[inline(always)]
    pub fn apply(&self, raw: f64) -> f64 {
        (raw - self.zero) * self.gain
    }
}

/// geometry and calibration matrices of one gauge
#[derive(Clone, Debug)]
pub struct GaugeGeometry {
    /// raw channel index for every gauge input, in button order
    pub channels: Vec<usize>,
    /// button half spacing along x
    pub xdist: f64,
    /// button half spacing along y
    pub ydist: f64,
    pub armx: f64,
    pub army: f64,
    pub armz: f64,
    pub weight: f64,
    pub interaction: ndarray::Array2<f64>,
    pub orientation: ndarray::Array2<f64>,
}

impl GaugeGeometry {
    pub fn validate(&self, kind: GaugeKind, nchannels: usize) -> Result<(), Error> {
        if self.channels.len() != nchannels {
            return Err(Error::WrongChannelCount {
                kind,
                expected: nchannels,
                got: self.channels.len(),
            });
        }

        for (name, m) in [
            ("interaction", &self.interaction),
            ("orientation", &self.orientation),
        ] {
            if m.dim() != (6, 6) {
                return Err(Error::MatrixShape {
                    kind,
                    name,
                    rows: m.nrows(),
                    cols: m.ncols(),
                });
            }
        }

        Ok(())
    }

    pub fn arm(&self) -> [f64; 3] {
        [self.armx, self.army, self.armz]
    }
}

/// channel lookup, calibration and matrix stage shared by all gauges
#[derive(Clone, Debug)]
pub struct Reduction {
    pub geometry: GaugeGeometry,
    cals: Vec<ChannelCal>,
}

impl Reduction {
    pub fn new(
        kind: GaugeKind,
        geometry: GaugeGeometry,
        cals: Vec<ChannelCal>,
        nchannels: usize,
    ) -> Result<Self, Error> {
        geometry.validate(kind, nchannels)?;
        if cals.len() != nchannels {
            return Err(Error::WrongChannelCount {
                kind,
                expected: nchannels,
                got: cals.len(),
            });
        }

        Ok(Self { geometry, cals })
    }

    /// raw counts of the gauge channels
    pub fn counts(&self, raw: &[f64]) -> ndarray::Array1<f64> {
        self.geometry
            .channels
            .iter()
            .map(|&ch| raw.get(ch).copied().unwrap_or(0.0))
            .collect()
    }

    /// calibrate a vector of gauge channel counts
    pub fn calibrate_counts<S>(&self, counts: &ndarray::ArrayBase<S, ndarray::Ix1>) -> ndarray::Array1<f64>
    where
        S: ndarray::Data<Elem = f64>,
    {
        counts
            .iter()
            .zip(self.cals.iter())
            .map(|(&raw, cal)| cal.apply(raw))
            .collect()
    }

    pub fn calibrate(&self, raw: &[f64]) -> ndarray::Array1<f64> {
        self.calibrate_counts(&self.counts(raw))
    }

    /// interaction, then orientation
    pub fn reduce<S>(&self, combined: &ndarray::ArrayBase<S, ndarray::Ix1>) -> ndarray::Array1<f64>
    where
        S: ndarray::Data<Elem = f64>,
    {
        let decoupled = self.geometry.interaction.dot(combined);
        self.geometry.orientation.dot(&decoupled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use ndarray::array;

    #[test]
    fn channel_cal() {
        let cal = ChannelCal {
            gain: 0.5,
            zero: 100.0,
        };
        assert_eq!(cal.apply(110.0), 5.0);
        assert_eq!(cal.apply(90.0), -5.0);
    }

    #[test]
    fn rejects_bad_shapes() {
        let mut g = geometry(vec![0, 1, 2, 3, 4, 5]);
        assert!(g.validate(GaugeKind::Dyno6, 6).is_ok());
        assert!(g.validate(GaugeKind::Dyno6, 9).is_err());

        g.orientation = ndarray::Array2::eye(3);
        assert!(matches!(
            g.validate(GaugeKind::Dyno6, 6),
            Err(Error::MatrixShape {
                name: "orientation",
                ..
            })
        ));
    }

    #[test]
    fn interaction_before_orientation() {
        let mut g = geometry(vec![0, 1, 2, 3, 4, 5]);
        g.interaction = coupled();
        g.orientation = swap01();
        let r = Reduction::new(GaugeKind::Dyno6, g.clone(), unit_cals(6), 6).unwrap();

        let v = array![2.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let fixed_order = r.reduce(&v);
        // interaction gives [2, 1, ..], orientation swaps to [1, 2, ..]
        testlib::assert_arr1_eq(&fixed_order, &array![1.0, 2.0, 0.0, 0.0, 0.0, 0.0]);

        let wrong_order = g.interaction.dot(&g.orientation.dot(&v));
        assert_ne!(fixed_order, wrong_order);
    }

    #[test]
    fn picks_and_calibrates_channels() {
        let g = geometry(vec![5, 4, 3, 2, 1, 0]);
        let cals = vec![
            ChannelCal {
                gain: 2.0,
                zero: 1.0,
            };
            6
        ];
        let r = Reduction::new(GaugeKind::Dyno6, g, cals, 6).unwrap();
        let eu = r.calibrate(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        testlib::assert_arr1_eq(&eu, &array![10.0, 8.0, 6.0, 4.0, 2.0, 0.0]);
    }
}
