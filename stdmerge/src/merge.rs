//! reduction of one raw OBC run to an STD record

use crate::calibration::{CalibrationStore, GaugeTable};
use crate::codes::{self, CodeEntry, CodeTable, Requirement, RowContext};
use crate::config::{Config, Output};
use crate::datareader::{RawSample, ReadStats};
use crate::stdfile::{Header, RunRecord};
use crate::Error;
use dyno::{ChannelCal, Gauge, GaugeInstance, GaugeKind, ZeroState};
use math::BodyAngles;

/// recursive smoothing `y = (y_prev * (c - 1) + x) / c`, disabled for `c == 0`
#[derive(Clone, Debug)]
struct Smoother {
    coeff: f64,
    prev: Option<[f64; 3]>,
}

impl Smoother {
    fn new(coeff: f64) -> Self {
        Self { coeff, prev: None }
    }

    fn update(&mut self, x: [f64; 3]) -> [f64; 3] {
        let mut y = x;

        if self.coeff > 0. {
            if let Some(prev) = self.prev {
                for i in 0..3 {
                    y[i] = (prev[i] * (self.coeff - 1.0) + x[i]) / self.coeff;
                }
            }
        }

        self.prev = Some(y);
        y
    }
}

/// shaft rpm signed by the last non-zero command
#[derive(Clone, Debug)]
struct RpmSign {
    sign: f64,
}

impl RpmSign {
    fn update(&mut self, rpm: f64, command: f64) -> f64 {
        if command > 0.0 {
            self.sign = 1.0;
        } else if command < 0.0 {
            self.sign = -1.0;
        }
        rpm.abs() * self.sign
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeStats {
    pub read: ReadStats,
    pub rows: usize,
    /// samples per column that hit a formula domain error
    pub domain: std::collections::BTreeMap<String, usize>,
    /// non-finite values replaced by 0
    pub non_finite: usize,
    /// columns left out because their gauge is not configured
    pub skipped: Vec<String>,
}

#[derive(Debug)]
pub struct MergeOutput {
    pub record: RunRecord,
    pub stats: MergeStats,
}

struct Column<'a> {
    output: &'a Output,
    entry: CodeEntry,
}

fn resolve_columns<'a>(
    cfg: &'a Config,
    cal: &CalibrationStore,
    gauges: &std::collections::BTreeMap<GaugeKind, GaugeInstance>,
    table: &CodeTable,
    skipped: &mut Vec<String>,
) -> Result<Vec<Column<'a>>, Error> {
    let mut columns = Vec::with_capacity(cfg.output.len());

    for output in &cfg.output {
        let entry = *table.lookup(output.code).ok_or_else(|| {
            Error::config(format!("output {}: unknown channel code {}", output.name, output.code))
        })?;

        let missing = |what: &str| {
            Error::config(format!(
                "output {}: code {} needs a [{}] config",
                output.name, output.code, what
            ))
        };
        match entry.requires {
            Requirement::Nothing => {}
            Requirement::Gauge(kind) => {
                if !gauges.contains_key(&kind) {
                    let e = Error::MissingGauge(kind);
                    log::warn!("output {}: {}, column skipped", output.name, e);
                    skipped.push(output.name.clone());
                    continue;
                }
            }
            Requirement::Depth if cfg.depth.is_none() => return Err(missing("depth")),
            Requirement::Planes if cfg.planes.is_none() => return Err(missing("planes")),
            Requirement::Rpm if cfg.rpm.is_none() => return Err(missing("rpm")),
            Requirement::Depth | Requirement::Planes | Requirement::Rpm => {}
        }

        if entry.is_direct() {
            let ch = output.code as usize;
            if ch >= cfg.nchannels {
                return Err(Error::config(format!(
                    "output {}: channel {} out of range, nchannels is {}",
                    output.name, ch, cfg.nchannels
                )));
            }
            cal.cal(ch)
                .map_err(|e| Error::config(format!("output {}: {}", output.name, e)))?;
        } else if output.zero {
            log::warn!("output {}: zero only applies to direct channels", output.name);
        }

        columns.push(Column { output, entry });
    }

    Ok(columns)
}

/// channels the derived codes read must be calibrated
fn check_inputs(cfg: &Config, cal: &CalibrationStore) -> Result<(), Error> {
    let mut inputs = vec![
        ("attitude", cfg.attitude.roll),
        ("attitude", cfg.attitude.pitch),
        ("attitude", cfg.attitude.yaw),
        ("adcp", cfg.adcp.u),
        ("adcp", cfg.adcp.v),
        ("adcp", cfg.adcp.w),
    ];
    if let Some(depth) = &cfg.depth {
        inputs.push(("depth", depth.channel));
    }
    if let Some(planes) = &cfg.planes {
        inputs.extend(planes.channels.iter().map(|&ch| ("planes", ch)));
    }
    if let Some(rpm) = &cfg.rpm {
        inputs.push(("rpm", rpm.channel));
        inputs.push(("rpm", rpm.command));
    }

    for (what, ch) in inputs {
        cal.cal(ch).map_err(|e| Error::config(format!("{}: {}", what, e)))?;
    }

    for kind in GaugeKind::ALL {
        if let Some(table) = cal.gauge(kind) {
            if let Some(&ch) = table.channels().iter().find(|&&ch| ch >= cfg.nchannels) {
                return Err(Error::config(format!(
                    "{}: channel {} out of range, nchannels is {}",
                    kind, ch, cfg.nchannels
                )));
            }
        }
    }
    if let Some(GaugeTable::Rotating(r)) = cal.gauge(GaugeKind::RotDyno6) {
        if r.encoder >= cfg.nchannels {
            return Err(Error::config(format!(
                "{}: encoder channel {} out of range, nchannels is {}",
                GaugeKind::RotDyno6,
                r.encoder,
                cfg.nchannels
            )));
        }
    }

    Ok(())
}

fn finite(value: f64, count: &mut usize) -> f64 {
    if value.is_finite() {
        value
    } else {
        *count += 1;
        0.0
    }
}

/// mean ADCP u over the standby samples right before the first execute sample
fn approach_speed(cfg: &Config, eu: &[Vec<f64>], samples: &[RawSample], first: usize) -> f64 {
    let standby: Vec<f64> = samples[..first]
        .iter()
        .zip(eu[..first].iter())
        .rev()
        .take_while(|(s, _)| s.mode == cfg.modes.standby)
        .map(|(_, eu)| eu[cfg.adcp.u])
        .collect();

    if standby.is_empty() {
        log::warn!("no standby samples before the run, approach speed is 0");
        return 0.0;
    }

    let mean = standby.iter().sum::<f64>() / standby.len() as f64;
    mean * cfg.lambda.sqrt() * codes::FPS_TO_KNOTS
}

/// reduce all samples of one run
pub fn merge(cfg: &Config, cal: &CalibrationStore, samples: &[RawSample]) -> Result<MergeOutput, Error> {
    let table = CodeTable::new();
    let mut gauges = cal.build_gauges()?;
    let mut stats = MergeStats::default();

    check_inputs(cfg, cal)?;
    let columns = resolve_columns(cfg, cal, &gauges, &table, &mut stats.skipped)?;
    if columns.is_empty() {
        return Err(Error::config("no output column left"));
    }

    let modes = &cfg.modes;
    let first = samples
        .iter()
        .position(|s| modes.is_execute(s.mode))
        .ok_or(Error::NoRunData)?;
    let last = samples
        .iter()
        .rposition(|s| modes.is_execute(s.mode))
        .ok_or(Error::NoRunData)?;
    log::info!("execute samples {}..={}", first, last);

    if let Some(s) = samples.iter().find(|s| s.values.len() != cfg.nchannels) {
        return Err(Error::Sample {
            index: s.index,
            expected: cfg.nchannels,
            got: s.values.len(),
        });
    }

    let cals: Vec<Option<ChannelCal>> = (0..cfg.nchannels)
        .map(|ch| cal.entry(ch).map(|e| e.cal()))
        .collect();
    let eu: Vec<Vec<f64>> = samples
        .iter()
        .map(|s| {
            s.values
                .iter()
                .zip(cals.iter())
                .map(|(&raw, cal)| cal.map(|c| c.apply(raw)).unwrap_or(0.0))
                .collect()
        })
        .collect();

    let depth_arm = match cfg.hull() {
        Some(hull) => hull.depth_sensor,
        None => {
            if columns.iter().any(|c| c.entry.requires == Requirement::Depth) {
                log::warn!("no hull geometry for length {}, depth arm is 0", cfg.model_length);
            }
            [0.0; 3]
        }
    };

    let mut zero_raw = ZeroState::new(cfg.nchannels);
    let mut zero_offsets = vec![0.0; cfg.nchannels];
    let mut zeroing = false;
    let mut adcp_filter = Smoother::new(cfg.adcp.filter_coeff);
    let mut rpm_sign = RpmSign { sign: 1.0 };
    let mut rows = Vec::with_capacity(last + 1 - first);

    for (i, (sample, eu)) in samples.iter().zip(eu.iter()).enumerate() {
        let attitude = [eu[cfg.attitude.roll], eu[cfg.attitude.pitch], eu[cfg.attitude.yaw]];
        let angles = BodyAngles::from_degrees(attitude[0], attitude[1], attitude[2]);
        let adcp = [eu[cfg.adcp.u], eu[cfg.adcp.v], eu[cfg.adcp.w]];
        let adcp_f = adcp_filter.update(adcp);
        let rpm = cfg
            .rpm
            .as_ref()
            .map(|r| rpm_sign.update(eu[r.channel], eu[r.command]));

        if modes.is_zero(sample.mode) {
            zero_raw.accumulate(&ndarray::ArrayView1::from(sample.values.as_slice()));
            for gauge in gauges.values_mut() {
                gauge.accumulate_zero(&sample.values, &angles);
            }
            zeroing = true;
            continue;
        }

        if zeroing {
            zeroing = false;
            if let Some(avg) = zero_raw.finalize() {
                for (ch, offset) in zero_offsets.iter_mut().enumerate() {
                    *offset = cals[ch].map(|c| c.apply(avg[ch])).unwrap_or(0.0);
                }
            }
            for gauge in gauges.values_mut() {
                gauge.finalize_zero();
            }
            log::info!(
                "zero finalized at sample {} over {} samples",
                sample.index,
                zero_raw.count()
            );
        }

        let mut loads = std::collections::BTreeMap::new();
        let mut shaft = None;
        for (kind, gauge) in gauges.iter_mut() {
            loads.insert(*kind, gauge.compute(&sample.values, &angles, true));
            if let GaugeInstance::RotDyno6(rot) = gauge {
                shaft = Some((rot.shaft_angle(), rot.is_rotating()));
            }
        }

        if i < first || i > last || !modes.is_run_data(sample.mode) {
            continue;
        }

        let mut ctx = RowContext {
            sample: sample.index,
            step: i - first,
            mode: sample.mode,
            dt: cfg.dt,
            lambda: cfg.lambda,
            eu,
            zero_offsets: &zero_offsets,
            attitude,
            angles,
            adcp,
            adcp_f,
            depth: cfg.depth.as_ref().map(|d| eu[d.channel]),
            depth_arm,
            planes: cfg.planes.as_ref().map(|p| p.channels.map(|ch| eu[ch])),
            rpm,
            loads: &loads,
            shaft,
            row: std::collections::BTreeMap::new(),
        };

        let mut row = Vec::with_capacity(columns.len());
        for column in &columns {
            let value = match (column.entry.formula)(&ctx, column.output) {
                Ok(v) => v,
                Err(e) => {
                    let count = stats.domain.entry(column.output.name.clone()).or_default();
                    *count += 1;
                    if *count == 1 {
                        log::warn!("{} at sample {}: {}, using 0", column.output.name, sample.index, e);
                    }
                    0.0
                }
            };
            let value = finite(value, &mut stats.non_finite);
            ctx.row.insert(column.output.code, value);

            let scaled = codes::froude(value, column.output, cfg.lambda, column.entry.is_direct());
            row.push(finite(scaled, &mut stats.non_finite));
        }
        rows.push(row);
    }

    let names: Vec<String> = columns.iter().map(|c| c.output.name.clone()).collect();
    let header = Header {
        title: cfg.title.clone(),
        approach_speed: approach_speed(cfg, &eu, samples, first),
        run_kind: cfg.run_kind,
        timestamp: chrono::Local::now().naive_local(),
        nchan: names.len(),
        dt: cfg.full_scale_dt(),
        ref_length: cfg.model_length * cfg.lambda,
    };

    stats.rows = rows.len();
    for (name, count) in &stats.domain {
        log::warn!("{}: {} samples out of domain", name, count);
    }
    if stats.non_finite > 0 {
        log::warn!("{} non-finite values replaced by 0", stats.non_finite);
    }

    Ok(MergeOutput {
        record: RunRecord {
            header,
            names,
            rows,
        },
        stats,
    })
}

/// read the raw log, merge it and write the STD file
pub fn merge_files<P, Q>(cfg: &Config, cal: &CalibrationStore, raw: P, out: Q) -> Result<MergeStats, Error>
where
    P: AsRef<std::path::Path>,
    Q: AsRef<std::path::Path>,
{
    let raw = raw.as_ref();
    let run = raw
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| raw.display().to_string());

    let inner = || -> Result<MergeStats, Error> {
        let (samples, read) = crate::datareader::read_all_samples(raw, cfg.nchannels, cfg.mode_channel)?;
        let mut output = merge(cfg, cal, &samples)?;
        output.stats.read = read;
        output.record.write(out.as_ref())?;
        Ok(output.stats)
    };

    inner().map_err(|e| e.in_run(run))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::tests::{channels, IDENTITY};
    use crate::config::tests::with_outputs;
    use approx::assert_abs_diff_eq;

    const NO_GAUGES: &str = "hasDyno6 = \"FALSE\"\nhasRotDyno6 = \"FALSE\"\nhasDeck = \"FALSE\"\n";

    fn cal() -> CalibrationStore {
        CalibrationStore::from_str(&format!("{}{}", NO_GAUGES, channels(6))).unwrap()
    }

    fn sample(index: usize, values: [f64; 6]) -> RawSample {
        RawSample {
            index,
            values: values.to_vec(),
            mode: values[5].round() as i64,
        }
    }

    /// modes zero, zero, standby, execute, execute
    fn samples() -> Vec<RawSample> {
        vec![
            sample(0, [3.0, 2.0, 5.0, 1.0, 1.0, 1.0]),
            sample(1, [5.0, 2.0, 5.0, 1.0, 1.0, 1.0]),
            sample(2, [6.0, 1.0, 2.0, 1.0, 1.0, 2.0]),
            sample(3, [4.0, 1.0, 3.0, 1.0, 1.0, 3.0]),
            sample(4, [2.0, 1.0, 5.0, 1.0, 1.0, 3.0]),
        ]
    }

    const OUTPUTS: &str = "[[output]]\nname = \"U_PW\"\ncode = 0\nscale = 0.5\n\
        [[output]]\nname = \"TIME\"\ncode = 801\n\
        [[output]]\nname = \"ALPHA\"\ncode = 821\n";

    #[test]
    fn end_to_end() {
        let cfg = crate::config::from_str(&with_outputs(OUTPUTS)).unwrap();
        let out = merge(&cfg, &cal(), &samples()).unwrap();
        let rec = out.record;

        assert_eq!(rec.names, vec!["U_PW", "TIME", "ALPHA"]);
        assert_eq!(rec.header.nchan, 3);
        assert_eq!(rec.rows.len(), 2);
        assert_eq!(out.stats.rows, 2);

        // eu = (raw - 1) * 2
        assert_abs_diff_eq!(rec.rows[0][0], 6.0 * 2.0, epsilon = 1.0e-12);
        assert_abs_diff_eq!(rec.rows[1][0], 2.0 * 2.0, epsilon = 1.0e-12);

        let scaled_dt = cfg.full_scale_dt();
        assert_abs_diff_eq!(rec.rows[0][1], 0.0);
        assert_abs_diff_eq!(rec.rows[1][1] - rec.rows[0][1], scaled_dt, epsilon = 1.0e-12);
        assert_abs_diff_eq!(rec.header.dt, scaled_dt);
        assert_abs_diff_eq!(rec.header.ref_length, 40.0);

        assert_abs_diff_eq!(rec.rows[0][2], 4.0f64.atan2(6.0).to_degrees(), epsilon = 1.0e-12);
        assert_abs_diff_eq!(rec.rows[1][2], 8.0f64.atan2(2.0).to_degrees(), epsilon = 1.0e-12);

        // one standby sample with u = 10 ft/s
        assert_abs_diff_eq!(
            rec.header.approach_speed,
            10.0 * 2.0 * codes::FPS_TO_KNOTS,
            epsilon = 1.0e-12
        );
        assert_eq!(rec.header.title, "test run");
        assert_eq!(rec.header.run_kind, 3);
    }

    #[test]
    fn zero_offsets() {
        let outputs = "[[output]]\nname = \"U\"\ncode = 0\nzero = true\n\
            [[output]]\nname = \"U_RAW\"\ncode = 0\n";
        let cfg = crate::config::from_str(&with_outputs(outputs)).unwrap();
        let rec = merge(&cfg, &cal(), &samples()).unwrap().record;

        // mean zero raw 4 -> offset 6
        assert_abs_diff_eq!(rec.rows[0][0], 6.0 - 6.0);
        assert_abs_diff_eq!(rec.rows[1][0], 2.0 - 6.0);
        assert_abs_diff_eq!(rec.rows[1][1], 2.0);
    }

    #[test]
    fn froude_doubling() {
        let outputs = "[[output]]\nname = \"FX\"\ncode = 2\nscale = 3.0\n";
        let cfg = crate::config::from_str(&with_outputs(outputs)).unwrap();
        let a = merge(&cfg, &cal(), &samples()).unwrap().record;

        let mut doubled = cfg.clone();
        doubled.lambda *= 2.0;
        let b = merge(&doubled, &cal(), &samples()).unwrap().record;

        for (a, b) in a.rows.iter().zip(b.rows.iter()) {
            assert_abs_diff_eq!(b[0], a[0] * 8.0, epsilon = 1.0e-9);
        }
        assert_abs_diff_eq!(a.rows[0][0], 4.0 * 64.0 * codes::FORCE_UNITS, epsilon = 1.0e-9);
    }

    #[test]
    fn missing_gauge_skips_column() {
        let outputs = "[[output]]\nname = \"TIME\"\ncode = 801\n\
            [[output]]\nname = \"DYNO_FX\"\ncode = 850\n\
            [[output]]\nname = \"MODE\"\ncode = 802\n";
        let cfg = crate::config::from_str(&with_outputs(outputs)).unwrap();
        let out = merge(&cfg, &cal(), &samples()).unwrap();

        assert_eq!(out.record.names, vec!["TIME", "MODE"]);
        assert_eq!(out.record.header.nchan, 2);
        assert_eq!(out.stats.skipped, vec!["DYNO_FX"]);
        assert_eq!(out.record.rows[0][1], 3.0);
    }

    #[test]
    fn gauge_column() {
        let text = format!(
            "hasDyno6 = \"TRUE\"\nhasRotDyno6 = \"FALSE\"\nhasDeck = \"FALSE\"\n{}\n\
            [dyno6]\nchannels = [0, 1, 2, 3, 4, 0]\ninteraction = {}\norientation = {}\n",
            channels(6),
            IDENTITY,
            IDENTITY
        );
        let cal = CalibrationStore::from_str(&text).unwrap();
        let outputs = "[[output]]\nname = \"DYNO_FX\"\ncode = 850\n";
        let cfg = crate::config::from_str(&with_outputs(outputs)).unwrap();
        let rec = merge(&cfg, &cal, &samples()).unwrap().record;

        // fx = eu(ch 0) minus the zero at the same attitude
        assert_eq!(rec.names, vec!["DYNO_FX"]);
        assert_abs_diff_eq!(rec.rows[0][0], 6.0 - 6.0, epsilon = 1.0e-9);
        assert_abs_diff_eq!(rec.rows[1][0], 2.0 - 6.0, epsilon = 1.0e-9);
    }

    #[test]
    fn gauge_and_direct_forces_scale_alike() {
        let text = format!(
            "hasDyno6 = \"TRUE\"\nhasRotDyno6 = \"FALSE\"\nhasDeck = \"FALSE\"\n{}\n\
            [dyno6]\nchannels = [0, 1, 2, 3, 4, 0]\ninteraction = {}\norientation = {}\n",
            channels(6),
            IDENTITY,
            IDENTITY
        );
        let cal = CalibrationStore::from_str(&text).unwrap();
        let outputs = "[[output]]\nname = \"FX\"\ncode = 0\nscale = 3.0\nzero = true\n\
            [[output]]\nname = \"DYNO_FX\"\ncode = 850\nscale = 3.0\n";
        let cfg = crate::config::from_str(&with_outputs(outputs)).unwrap();
        let rec = merge(&cfg, &cal, &samples()).unwrap().record;

        let scale = cfg.lambda.powi(3) * codes::FORCE_UNITS;
        assert_abs_diff_eq!(rec.rows[1][0], -4.0 * scale, epsilon = 1.0e-9);
        for row in &rec.rows {
            assert_abs_diff_eq!(row[0], row[1], epsilon = 1.0e-9);
        }
    }

    #[test]
    fn encoder_out_of_range() {
        let text = format!(
            "hasDyno6 = \"FALSE\"\nhasRotDyno6 = \"TRUE\"\nhasDeck = \"FALSE\"\n{}\n\
            [rotdyno6]\nchannels = [0, 1, 2, 3, 4, 0]\nencoder = 60\ncb_id = 4\n\
            interaction = {}\norientation = {}\n",
            channels(6),
            IDENTITY,
            IDENTITY
        );
        let cal = CalibrationStore::from_str(&text).unwrap();
        let cfg = crate::config::from_str(&with_outputs(OUTPUTS)).unwrap();

        let err = merge(&cfg, &cal, &samples()).unwrap_err();
        assert!(err.is_config(), "{}", err);
        assert!(err.to_string().contains("encoder channel 60"), "{}", err);
    }

    #[test]
    fn short_sample() {
        let cfg = crate::config::from_str(&with_outputs(OUTPUTS)).unwrap();
        let mut samples = samples();
        samples[3].values.truncate(2);

        match merge(&cfg, &cal(), &samples) {
            Err(Error::Sample { index, expected, got }) => {
                assert_eq!((index, expected, got), (3, 6, 2));
            }
            e => panic!("unexpected {:?}", e.map(|o| o.stats)),
        }
    }

    #[test]
    fn beta_before_speed_is_zero() {
        let outputs = "[[output]]\nname = \"BETA\"\ncode = 822\n\
            [[output]]\nname = \"SPEED\"\ncode = 813\n\
            [[output]]\nname = \"BETA2\"\ncode = 822\n";
        let cfg = crate::config::from_str(&with_outputs(outputs)).unwrap();
        let out = merge(&cfg, &cal(), &samples()).unwrap();
        let rec = out.record;

        assert_eq!(rec.rows[0][0], 0.0);
        assert_eq!(out.stats.domain["BETA"], 2);
        let speed = (36.0f64 + 0.0 + 16.0).sqrt();
        assert_abs_diff_eq!(rec.rows[0][1], speed, epsilon = 1.0e-12);
        assert_abs_diff_eq!(rec.rows[0][2], 0.0, epsilon = 1.0e-12);
        assert!(!out.stats.domain.contains_key("BETA2"));
    }

    #[test]
    fn config_errors() {
        for outputs in [
            "[[output]]\nname = \"X\"\ncode = 807\n",
            "[[output]]\nname = \"X\"\ncode = 6\n",
            "[[output]]\nname = \"X\"\ncode = 803\n",
            "[[output]]\nname = \"X\"\ncode = 840\n",
        ] {
            let cfg = crate::config::from_str(&with_outputs(outputs)).unwrap();
            let err = merge(&cfg, &cal(), &samples()).unwrap_err();
            assert!(err.is_config(), "{}: {}", outputs, err);
        }

        let cal = CalibrationStore::from_str(&format!("{}{}", NO_GAUGES, channels(4))).unwrap();
        let cfg = crate::config::from_str(&with_outputs(OUTPUTS)).unwrap();
        assert!(merge(&cfg, &cal, &samples()).unwrap_err().is_config());
    }

    #[test]
    fn no_execute_samples() {
        let cfg = crate::config::from_str(&with_outputs(OUTPUTS)).unwrap();
        let samples: Vec<_> = samples().into_iter().take(3).collect();
        assert!(matches!(merge(&cfg, &cal(), &samples), Err(Error::NoRunData)));
    }

    #[test]
    fn rpm_sign_hold() {
        let mut rpm = RpmSign { sign: 1.0 };
        assert_eq!(rpm.update(-300.0, 0.0), 300.0);
        assert_eq!(rpm.update(300.0, -5.0), -300.0);
        assert_eq!(rpm.update(250.0, 0.0), -250.0);
        assert_eq!(rpm.update(-250.0, 1.0), 250.0);
    }

    #[test]
    fn smoothing() {
        let mut f = Smoother::new(4.0);
        assert_eq!(f.update([4.0, 0.0, 0.0]), [4.0, 0.0, 0.0]);
        assert_eq!(f.update([8.0, 4.0, 0.0]), [5.0, 1.0, 0.0]);

        let mut off = Smoother::new(0.0);
        off.update([1.0; 3]);
        assert_eq!(off.update([3.0; 3]), [3.0; 3]);
    }

    #[test]
    fn files_and_run_id() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("run42.obc");
        let out = dir.path().join("run42.std");
        let text: String = samples()
            .iter()
            .map(|s| {
                s.values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
                    + "\n"
            })
            .collect();
        std::fs::write(&raw, text).unwrap();

        let cfg = crate::config::from_str(&with_outputs(OUTPUTS)).unwrap();
        let stats = merge_files(&cfg, &cal(), &raw, &out).unwrap();
        assert_eq!(stats.read.samples, 5);
        assert_eq!(RunRecord::read(&out).unwrap().rows.len(), 2);

        let missing = dir.path().join("run43.obc");
        let err = merge_files(&cfg, &cal(), &missing, dir.path().join("run43.std")).unwrap_err();
        assert!(err.to_string().starts_with("run run43: "));
        assert!(!dir.path().join("run43.std").exists());
    }
}
