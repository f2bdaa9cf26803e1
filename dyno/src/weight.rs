use math::transform;
use math::BodyAngles;

/// dead weight carried by a gauge and the arm it acts through
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SelfWeight {
    pub weight: f64,
    pub arm: [f64; 3],
}

impl SelfWeight {
    pub fn new(weight: f64, arm: [f64; 3]) -> Self {
        Self { weight, arm }
    }

    /// weight force in body axes and its moment about the gauge center
    pub fn loads(&self, angles: &BodyAngles) -> ndarray::Array1<f64> {
        let (wx, wy, wz) = transform::to_body(0.0, 0.0, self.weight, angles);
        let [armx, army, armz] = self.arm;

        ndarray::array![
            wx,
            wy,
            wz,
            wz * army - wy * armz,
            -wz * armx - wx * armz,
            wy * armx - wx * army,
        ]
    }
}
