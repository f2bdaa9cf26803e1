use crate::geometry::Reduction;
use crate::weight::SelfWeight;
use crate::{ChannelCal, Error, Gauge, GaugeGeometry, GaugeKind, GaugeState, Loads, ZeroState};
use math::{BodyAngles, RollingAverage};

/// samples kept by the rotating zero
pub const ROLLING_ZERO_LEN: usize = 100;

/// encoder counts per shaft revolution of the older dyno line
pub const COUNTS_PER_REV: f64 = 20000.0;

/// encoder boards below this id report counts, newer ones report degrees
pub const DEGREE_ENCODER_CB_ID: i64 = 12;

/// rotating propeller dynamometer
///
/// The balance turns with the shaft. Its zero depends on the shaft angle,
/// so samples taken while the shaft turns are zeroed against a rolling
/// average instead of the static zero. The gauge frame is rotated back by
/// the shaft angle about x.
#[derive(Clone, Debug)]
pub struct RotDyno6 {
    reduction: Reduction,
    weight: SelfWeight,
    encoder: usize,
    cb_id: i64,

    static_zero: ZeroState,
    rolling_zero: Vec<RollingAverage>,
    zero: Option<ndarray::Array1<f64>>,
    state: GaugeState,

    prev_encoder: Option<f64>,
    shaft_angle: f64,
    rotating: bool,
}

impl RotDyno6 {
    pub fn new(
        geometry: GaugeGeometry,
        cals: Vec<ChannelCal>,
        encoder: usize,
        cb_id: i64,
    ) -> Result<Self, Error> {
        let weight = SelfWeight::new(geometry.weight, geometry.arm());
        let reduction = Reduction::new(GaugeKind::RotDyno6, geometry, cals, 6)?;

        Ok(Self {
            reduction,
            weight,
            encoder,
            cb_id,
            static_zero: ZeroState::new(6),
            rolling_zero: (0..6).map(|_| RollingAverage::new(ROLLING_ZERO_LEN)).collect(),
            zero: None,
            state: GaugeState::Uninitialized,
            prev_encoder: None,
            shaft_angle: 0.0,
            rotating: false,
        })
    }

    /// shaft angle of the last sample, unit: deg
    pub fn shaft_angle(&self) -> f64 {
        self.shaft_angle
    }

    /// whether the encoder moved between the last two samples
    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    pub fn static_zero(&self) -> Option<&ndarray::Array1<f64>> {
        self.zero.as_ref()
    }

    pub fn rolling_zero(&self) -> Option<ndarray::Array1<f64>> {
        self.rolling_zero
            .iter()
            .map(|r| r.average())
            .collect::<Option<Vec<_>>>()
            .map(ndarray::Array1::from)
    }

    fn encoder_to_degrees(&self, value: f64) -> f64 {
        if self.cb_id < DEGREE_ENCODER_CB_ID {
            math::pymod(value, COUNTS_PER_REV) / COUNTS_PER_REV * 360.0
        } else {
            value
        }
    }

    fn track_shaft(&mut self, raw: &[f64]) {
        let value = raw.get(self.encoder).copied().unwrap_or(0.0);

        self.rotating = match self.prev_encoder {
            Some(prev) => (value - prev).abs() > f64::EPSILON,
            None => false,
        };
        self.prev_encoder = Some(value);
        self.shaft_angle = self.encoder_to_degrees(value);
    }

    fn reduced(&self, raw: &[f64]) -> ndarray::Array1<f64> {
        let eu = self.reduction.calibrate(raw);
        self.reduction.reduce(&eu)
    }

    fn unrotate(&self, v: &mut ndarray::Array1<f64>) {
        let angle = self.shaft_angle.to_radians();

        let f = math::rot2d(&ndarray::array![v[1], v[2]], angle);
        let m = math::rot2d(&ndarray::array![v[4], v[5]], angle);
        v[1] = f[0];
        v[2] = f[1];
        v[4] = m[0];
        v[5] = m[1];
    }
}

impl Gauge for RotDyno6 {
    fn kind(&self) -> GaugeKind {
        GaugeKind::RotDyno6
    }

    fn state(&self) -> GaugeState {
        self.state
    }

    fn compute(&mut self, raw: &[f64], angles: &BodyAngles, subtract_zero: bool) -> Loads {
        self.track_shaft(raw);
        let mut v = self.reduced(raw);

        if subtract_zero && self.state == GaugeState::Active {
            match (self.rotating, self.rolling_zero()) {
                (true, Some(rolling)) => v -= &rolling,
                _ => {
                    if let Some(zero) = &self.zero {
                        v -= zero;
                    }
                }
            }
        }

        self.unrotate(&mut v);
        v -= &self.weight.loads(angles);

        Loads::from(&v)
    }

    fn accumulate_zero(&mut self, raw: &[f64], _angles: &BodyAngles) {
        self.track_shaft(raw);
        let v = self.reduced(raw);

        if self.rotating {
            for (avg, &x) in self.rolling_zero.iter_mut().zip(v.iter()) {
                avg.append(x);
            }
        } else {
            self.static_zero.accumulate(&v);
        }
        self.state = GaugeState::Zeroing;
    }

    fn finalize_zero(&mut self) {
        if let Some(zero) = self.static_zero.finalize() {
            self.zero = Some(zero.clone());
        }
        log::debug!(
            "{}: {} static zero samples, {} rolling",
            GaugeKind::RotDyno6,
            self.static_zero.count(),
            self.rolling_zero.first().map(|r| r.len()).unwrap_or(0)
        );

        self.state = GaugeState::Active;
    }
}
