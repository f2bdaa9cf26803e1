//! cross check of the measured rates and velocities against the attitude history
//!
//! Body rates are recomputed from the derivatives of the filtered Euler
//! angles. Body velocities are recomputed by integrating the trajectory from
//! the ADCP velocities and the measured rates, then differentiating the
//! position and rotating it back to body axes.

use crate::config::Consistency;
use crate::stdfile::RunRecord;
use crate::Error;
use math::filter::{self, Butterworth};
use math::trajectory::{self, State};
use math::BodyAngles;

/// low-pass cutoff divided by the sample rate
pub const CUTOFF_RATIO: f64 = 0.05;
/// filter startup transient, zeroed in every computed column
pub const STARTUP_SAMPLES: usize = 20;

pub const COLUMNS: [&str; 6] = ["compP", "compQ", "compR", "compU", "compV", "compW"];

/// recomputed channels, rates in deg/s
#[derive(Clone, Debug)]
pub struct Computed {
    pub p: ndarray::Array1<f64>,
    pub q: ndarray::Array1<f64>,
    pub r: ndarray::Array1<f64>,
    pub u: ndarray::Array1<f64>,
    pub v: ndarray::Array1<f64>,
    pub w: ndarray::Array1<f64>,
}

impl Computed {
    fn columns(&self) -> [&ndarray::Array1<f64>; 6] {
        [&self.p, &self.q, &self.r, &self.u, &self.v, &self.w]
    }
}

/// column values with non-finite entries read as 0
fn column(record: &RunRecord, name: &str) -> Result<ndarray::Array1<f64>, Error> {
    let index = record
        .column(name)
        .ok_or_else(|| Error::MissingColumn(name.to_string()))?;

    let mut values = record.column_values(index);
    let mut bad = 0;
    values.mapv_inplace(|v| {
        if v.is_finite() {
            v
        } else {
            bad += 1;
            0.0
        }
    });
    if bad > 0 {
        log::warn!("{}: {} non-finite values, using 0", name, bad);
    }

    Ok(values)
}

pub fn compute(record: &RunRecord, names: &Consistency) -> Result<Computed, Error> {
    let dt = record.header.dt;
    let lowpass = Butterworth::lowpass(CUTOFF_RATIO)?;
    let filtered = |name: &str| -> Result<ndarray::Array1<f64>, Error> {
        Ok(lowpass.apply(&column(record, name)?))
    };
    let filtered_rad = |name: &str| -> Result<ndarray::Array1<f64>, Error> {
        Ok(lowpass.apply(&column(record, name)?.mapv(f64::to_radians)))
    };

    let roll = filtered_rad(&names.roll)?;
    let pitch = filtered_rad(&names.pitch)?;
    let yaw = lowpass.apply(&math::unwrap_angles(
        &column(record, &names.yaw)?.mapv(f64::to_radians),
    ));
    let n = roll.len();

    let droll = filter::derivative(&roll, dt)?;
    let dpitch = filter::derivative(&pitch, dt)?;
    let dyaw = filter::derivative(&yaw, dt)?;

    let angles: Vec<BodyAngles> = (0..n)
        .map(|i| BodyAngles::new(roll[i], pitch[i], yaw[i]))
        .collect();

    let mut p = ndarray::Array1::zeros(n);
    let mut q = ndarray::Array1::zeros(n);
    let mut r = ndarray::Array1::zeros(n);
    for i in 0..n {
        let (pi, qi, ri) = math::transform::body_rates(droll[i], dpitch[i], dyaw[i], &angles[i]);
        p[i] = pi.to_degrees();
        q[i] = qi.to_degrees();
        r[i] = ri.to_degrees();
    }

    let u = filtered(&names.u)?;
    let v = filtered(&names.v)?;
    let w = filtered(&names.w)?;
    let rate_p = filtered_rad(&names.p)?;
    let rate_q = filtered_rad(&names.q)?;
    let rate_r = filtered_rad(&names.r)?;

    let velocities: Vec<[f64; 3]> = (0..n).map(|i| [u[i], v[i], w[i]]).collect();
    let rates: Vec<[f64; 3]> = (0..n).map(|i| [rate_p[i], rate_q[i], rate_r[i]]).collect();
    let initial = State {
        position: [0.0; 3],
        attitude: [roll[0], pitch[0], yaw[0]],
    };
    let states = trajectory::integrate(&initial, &velocities, &rates, dt)?;

    let position = |axis: usize| -> ndarray::Array1<f64> {
        states.iter().map(|s| s.position[axis]).collect()
    };
    let dx = filter::derivative(&position(0), dt)?;
    let dy = filter::derivative(&position(1), dt)?;
    let dz = filter::derivative(&position(2), dt)?;
    let attitudes: Vec<BodyAngles> = states.iter().map(State::angles).collect();
    let (u, v, w) = math::transform::to_body_arr(&dx, &dy, &dz, &attitudes)?;

    let mut res = Computed { p, q, r, u, v, w };
    for x in [
        &mut res.p, &mut res.q, &mut res.r, &mut res.u, &mut res.v, &mut res.w,
    ] {
        filter::blank_start(x, STARTUP_SAMPLES);
    }

    Ok(res)
}

/// add the computed columns, replacing those of an earlier pass
pub fn apply(record: &mut RunRecord, names: &Consistency) -> Result<(), Error> {
    let computed = compute(record, names)?;

    for (name, values) in COLUMNS.iter().zip(computed.columns()) {
        record.set_column(name, values)?;
    }

    Ok(())
}

/// run the pass on an STD file and rewrite it
pub fn check_file<P: AsRef<std::path::Path>>(path: P, names: &Consistency) -> Result<(), Error> {
    let path = path.as_ref();
    let mut record = RunRecord::read(path)?;
    apply(&mut record, names)?;
    record.write(path)?;

    log::info!("{}: consistency columns written", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdfile::tests::record;
    use approx::assert_abs_diff_eq;

    const NAMES: [&str; 9] = ["ROLL", "PITCH", "YAW", "P", "Q", "R", "U_F", "V_F", "W_F"];

    /// yaw rate in deg/s, attitude columns in degrees
    fn run(n: usize, dt: f64, yaw0: f64, yaw_rate: f64, u: f64) -> RunRecord {
        let rows = (0..n)
            .map(|i| {
                let t = i as f64 * dt;
                let yaw = math::normalize_angle((yaw0 + yaw_rate * t).to_radians()).to_degrees();
                vec![0.0, 0.0, yaw, 0.0, 0.0, yaw_rate, u, 0.0, 0.0]
            })
            .collect();

        let mut rec = record(&NAMES, rows);
        rec.header.dt = dt;
        rec
    }

    #[test]
    fn straight_run() {
        let rec = run(200, 0.1, 30.0, 0.0, 5.0);
        let c = compute(&rec, &Consistency::default()).unwrap();

        for i in 0..STARTUP_SAMPLES {
            assert_eq!(c.u[i], 0.0);
            assert_eq!(c.p[i], 0.0);
        }
        let steady = ndarray::s![STARTUP_SAMPLES..];
        let zeros = ndarray::Array1::<f64>::zeros(200 - STARTUP_SAMPLES);
        testlib::assert_arr1_eq(&c.u.slice(steady), &(&zeros + 5.0));
        testlib::assert_arr1_eq(&c.v.slice(steady), &zeros);
        testlib::assert_arr1_eq(&c.w.slice(steady), &zeros);
        testlib::assert_arr1_eq(&c.r.slice(steady), &zeros);
    }

    #[test]
    fn turning_through_wrap() {
        // crosses +-180 deg after 50 samples
        let rec = run(400, 0.1, 170.0, 2.0, 5.0);
        let c = compute(&rec, &Consistency::default()).unwrap();

        for i in [200, 300] {
            assert_abs_diff_eq!(c.r[i], 2.0, epsilon = 1.0e-3);
            assert_abs_diff_eq!(c.p[i], 0.0, epsilon = 1.0e-3);
            assert_abs_diff_eq!(c.q[i], 0.0, epsilon = 1.0e-3);
            assert_abs_diff_eq!(c.u[i], 5.0, epsilon = 1.0e-3);
            assert_abs_diff_eq!(c.v[i], 0.0, epsilon = 1.0e-2);
        }
    }

    #[test]
    fn appends_and_replaces() {
        let mut rec = run(50, 0.1, 0.0, 0.0, 1.0);
        apply(&mut rec, &Consistency::default()).unwrap();
        assert_eq!(rec.names.len(), NAMES.len() + 6);
        assert_eq!(rec.header.nchan, NAMES.len() + 6);
        assert_eq!(&rec.names[NAMES.len()..], &COLUMNS);

        apply(&mut rec, &Consistency::default()).unwrap();
        assert_eq!(rec.names.len(), NAMES.len() + 6);
        assert_eq!(rec.rows[0].len(), NAMES.len() + 6);
    }

    #[test]
    fn non_finite_input() {
        let mut rec = run(200, 0.1, 30.0, 0.0, 5.0);
        rec.rows[50][6] = f64::NAN;
        rec.rows[60][2] = f64::INFINITY;
        let c = compute(&rec, &Consistency::default()).unwrap();

        for x in c.columns() {
            assert!(x.iter().all(|v| v.is_finite()));
        }
        assert_abs_diff_eq!(c.u[190], 5.0, epsilon = 1.0e-3);
    }

    #[test]
    fn missing_column() {
        let rec = run(50, 0.1, 0.0, 0.0, 1.0);
        let names = Consistency {
            yaw: "HEADING".to_string(),
            ..Consistency::default()
        };
        match compute(&rec, &names) {
            Err(Error::MissingColumn(name)) => assert_eq!(name, "HEADING"),
            e => panic!("unexpected {:?}", e),
        }
    }

    #[test]
    fn too_short() {
        let rec = run(1, 0.1, 0.0, 0.0, 1.0);
        assert!(compute(&rec, &Consistency::default()).is_err());
    }

    #[test]
    fn rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.std");
        run(60, 0.1, 0.0, 0.0, 1.0).write(&path).unwrap();

        check_file(&path, &Consistency::default()).unwrap();
        let back = RunRecord::read(&path).unwrap();
        assert_eq!(back.header.nchan, NAMES.len() + 6);
        let u = back.column(COLUMNS[3]).unwrap();
        assert_abs_diff_eq!(back.rows[40][u], 1.0, epsilon = 1.0e-5);
    }
}
