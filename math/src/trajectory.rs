use crate::transform::{self, BodyAngles};
use crate::Error;

/// position (inertial, NED) and attitude of the body at one time step
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct State {
    pub position: [f64; 3],
    /// roll, pitch, yaw. unit: rad
    pub attitude: [f64; 3],
}

impl State {
    pub fn angles(&self) -> BodyAngles {
        BodyAngles::new(self.attitude[0], self.attitude[1], self.attitude[2])
    }
}

/// integrate the body kinematics with a fixed step first-order Euler scheme
///
/// `velocities` are body-frame u, v, w and `rates` body-frame p, q, r (rad/s).
/// The result has one state per input sample, starting with `initial`.
pub fn integrate(
    initial: &State,
    velocities: &[[f64; 3]],
    rates: &[[f64; 3]],
    dt: f64,
) -> Result<Vec<State>, Error> {
    if velocities.len() != rates.len() {
        return Err(Error::LengthMismatch {
            expected: velocities.len(),
            got: rates.len(),
        });
    }
    if dt.is_nan() || dt <= 0.0 {
        return Err(Error::InvalidArgument);
    }

    let mut states = Vec::with_capacity(velocities.len());
    if velocities.is_empty() {
        return Ok(states);
    }

    let mut state = *initial;
    states.push(state);
    for (vel, rate) in velocities.iter().zip(rates.iter()).take(velocities.len() - 1) {
        state = step(&state, vel, rate, dt);
        states.push(state);
    }

    Ok(states)
}

fn step(state: &State, vel: &[f64; 3], rate: &[f64; 3], dt: f64) -> State {
    let angles = state.angles();
    let (dx, dy, dz) = transform::to_inertial(vel[0], vel[1], vel[2], &angles);
    let (droll, dpitch, dyaw) = transform::euler_rates(rate[0], rate[1], rate[2], &angles);

    State {
        position: [
            state.position[0] + dx * dt,
            state.position[1] + dy * dt,
            state.position[2] + dz * dt,
        ],
        attitude: [
            state.attitude[0] + droll * dt,
            state.attitude[1] + dpitch * dt,
            state.attitude[2] + dyaw * dt,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn straight_line() {
        let initial = State::default();
        let vel = vec![[2.0, 0.0, 0.0]; 11];
        let rates = vec![[0.0; 3]; 11];
        let states = integrate(&initial, &vel, &rates, 0.1).unwrap();

        assert_eq!(states.len(), 11);
        assert_eq!(states[0], initial);
        assert_abs_diff_eq!(states[10].position[0], 2.0, epsilon = 1.0e-12);
        assert_abs_diff_eq!(states[10].position[1], 0.0);
    }

    #[test]
    fn heading_rotates_track() {
        let initial = State {
            position: [0.0; 3],
            attitude: [0.0, 0.0, std::f64::consts::FRAC_PI_2],
        };
        let states = integrate(&initial, &[[1.0, 0.0, 0.0]; 3], &[[0.0; 3]; 3], 1.0).unwrap();
        assert_abs_diff_eq!(states[2].position[0], 0.0, epsilon = 1.0e-12);
        assert_abs_diff_eq!(states[2].position[1], 2.0, epsilon = 1.0e-12);
    }

    #[test]
    fn first_order_yaw() {
        let rates = vec![[0.0, 0.0, 0.5]; 5];
        let states = integrate(&State::default(), &[[0.0; 3]; 5], &rates, 0.2).unwrap();
        assert_abs_diff_eq!(states[4].attitude[2], 0.4, epsilon = 1.0e-12);
    }

    #[test]
    fn rejects_mismatch() {
        assert!(integrate(&State::default(), &[[0.0; 3]; 2], &[[0.0; 3]; 3], 0.1).is_err());
        assert!(integrate(&State::default(), &[[0.0; 3]; 2], &[[0.0; 3]; 2], 0.0).is_err());
    }
}
