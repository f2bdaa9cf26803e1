//! output channel codes
//!
//! Codes below 800 copy a calibrated raw channel, everything else selects
//! one of the derived or gauge channels registered in [CodeTable].

use crate::config::Output;
use dyno::{Component, GaugeKind, Loads};
use math::BodyAngles;

/// last direct channel code
pub const MAX_DIRECT_CODE: u32 = 799;
/// Fx of the first gauge, gauges follow in [GaugeKind::ALL] order
pub const FIRST_GAUGE_CODE: u32 = 850;

pub const SPEED: u32 = 813;
pub const SPEED_F: u32 = 814;

/// lb -> model test force units
pub const FORCE_UNITS: f64 = 1.0284;
/// in-lb -> ft-lb
pub const MOMENT_UNITS: f64 = 0.083333;

/// ft/s -> knots
pub const FPS_TO_KNOTS: f64 = 0.592484;

/// formula input out of its domain, the value is replaced by 0
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{0}")]
pub struct Domain(pub &'static str);

/// everything a formula may read for the current sample
#[derive(Debug)]
pub struct RowContext<'a> {
    /// absolute sample index in the raw log
    pub sample: usize,
    /// samples since the first execute sample
    pub step: usize,
    pub mode: i64,
    /// model scale sample period
    pub dt: f64,
    pub lambda: f64,

    /// calibrated value of every raw channel
    pub eu: &'a [f64],
    pub zero_offsets: &'a [f64],

    /// roll, pitch, yaw. unit: deg
    pub attitude: [f64; 3],
    pub angles: BodyAngles,
    pub adcp: [f64; 3],
    pub adcp_f: [f64; 3],
    pub depth: Option<f64>,
    /// depth sensor position relative to the CG
    pub depth_arm: [f64; 3],
    pub planes: Option<[f64; 4]>,
    /// signed shaft rpm
    pub rpm: Option<f64>,

    pub loads: &'a std::collections::BTreeMap<GaugeKind, Loads>,
    /// shaft angle (deg) and rotating flag of the rotating dyno
    pub shaft: Option<(f64, bool)>,

    /// unscaled values of the codes already computed in this row
    pub row: std::collections::BTreeMap<u32, f64>,
}

impl RowContext<'_> {
    fn gauge(&self, code: u32) -> Result<f64, Domain> {
        let (kind, component) = gauge_code(code).ok_or(Domain("not a gauge code"))?;
        self.loads
            .get(&kind)
            .map(|l| l.get(component))
            .ok_or(Domain("gauge not computed"))
    }
}

pub type Formula = fn(&RowContext, &Output) -> Result<f64, Domain>;

/// configuration a code depends on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    Nothing,
    Gauge(GaugeKind),
    Depth,
    Planes,
    Rpm,
}

#[derive(Clone, Copy)]
pub struct CodeEntry {
    pub first: u32,
    pub last: u32,
    pub name: &'static str,
    pub requires: Requirement,
    pub formula: Formula,
}

impl CodeEntry {
    pub fn contains(&self, code: u32) -> bool {
        (self.first..=self.last).contains(&code)
    }

    pub fn is_direct(&self) -> bool {
        self.last <= MAX_DIRECT_CODE
    }
}

impl std::fmt::Debug for CodeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeEntry")
            .field("first", &self.first)
            .field("last", &self.last)
            .field("name", &self.name)
            .field("requires", &self.requires)
            .finish()
    }
}

/// gauge and component of a gauge code
pub fn gauge_code(code: u32) -> Option<(GaugeKind, Component)> {
    let offset = code.checked_sub(FIRST_GAUGE_CODE)? as usize;
    let kind = GaugeKind::ALL.get(offset / 6)?;
    Some((*kind, Component::from_offset(offset % 6)?))
}

fn direct(c: &RowContext, o: &Output) -> Result<f64, Domain> {
    let ch = o.code as usize;
    let eu = c.eu.get(ch).copied().ok_or(Domain("channel out of range"))?;
    if o.zero {
        Ok(eu - c.zero_offsets.get(ch).copied().unwrap_or(0.0))
    } else {
        Ok(eu)
    }
}

fn depth_cg(c: &RowContext, _: &Output) -> Result<f64, Domain> {
    let depth = c.depth.ok_or(Domain("no depth channel"))?;
    let [x, y, z] = c.depth_arm;
    let (_, _, dz) = math::transform::to_inertial(x, y, z, &c.angles);
    Ok(depth - dz)
}

fn speed(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn alpha(v: &[f64; 3]) -> f64 {
    v[2].atan2(v[0]).to_degrees()
}

/// sideslip against the speed column computed earlier in the same row
fn beta(c: &RowContext, v: f64, speed_code: u32) -> Result<f64, Domain> {
    let speed = c
        .row
        .get(&speed_code)
        .copied()
        .ok_or(Domain("speed not computed earlier in row"))?;
    if speed == 0.0 {
        return Err(Domain("zero speed"));
    }

    let ratio = v / speed;
    if !(-1.0..=1.0).contains(&ratio) {
        return Err(Domain("asin out of domain"));
    }
    Ok(ratio.asin().to_degrees())
}

fn planes(c: &RowContext, o: &Output) -> Result<f64, Domain> {
    let [p1, p2, p3, p4] = c.planes.ok_or(Domain("no plane channels"))?;
    Ok(match o.code {
        830 => (p1 - p2 - p3 + p4) / 4.0,
        831 => (p1 + p2 - p3 - p4) / 4.0,
        _ => (p1 - p2 + p3 - p4) / 4.0,
    })
}

fn shaft(c: &RowContext, o: &Output) -> Result<f64, Domain> {
    let (angle, rotating) = c.shaft.ok_or(Domain("no rotating dyno"))?;
    Ok(match o.code {
        880 => angle,
        _ => f64::from(u8::from(rotating)),
    })
}

/// code ranges and their formulas, the first matching range wins
#[derive(Debug)]
pub struct CodeTable {
    entries: Vec<CodeEntry>,
}

impl Default for CodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeTable {
    pub fn new() -> Self {
        let mut table = Self {
            entries: Vec::new(),
        };

        table.register(0, MAX_DIRECT_CODE, "direct", Requirement::Nothing, direct);
        table.register(800, 800, "SAMPLE", Requirement::Nothing, |c, _| Ok(c.sample as f64));
        table.register(801, 801, "TIME", Requirement::Nothing, |c, _| {
            Ok(c.step as f64 * c.dt * c.lambda.sqrt())
        });
        table.register(802, 802, "MODE", Requirement::Nothing, |c, _| Ok(c.mode as f64));
        table.register(803, 803, "DEPTH_CG", Requirement::Depth, depth_cg);
        table.register(804, 806, "ATTITUDE", Requirement::Nothing, |c, o| {
            Ok(c.attitude[(o.code - 804) as usize])
        });
        table.register(810, 812, "ADCP_F", Requirement::Nothing, |c, o| {
            Ok(c.adcp_f[(o.code - 810) as usize])
        });
        table.register(SPEED, SPEED, "SPEED", Requirement::Nothing, |c, _| Ok(speed(&c.adcp)));
        table.register(SPEED_F, SPEED_F, "SPEED_F", Requirement::Nothing, |c, _| {
            Ok(speed(&c.adcp_f))
        });
        table.register(821, 821, "ALPHA", Requirement::Nothing, |c, _| Ok(alpha(&c.adcp)));
        table.register(822, 822, "BETA", Requirement::Nothing, |c, _| beta(c, c.adcp[1], SPEED));
        table.register(823, 823, "ALPHA_F", Requirement::Nothing, |c, _| Ok(alpha(&c.adcp_f)));
        table.register(824, 824, "BETA_F", Requirement::Nothing, |c, _| {
            beta(c, c.adcp_f[1], SPEED_F)
        });
        table.register(830, 832, "PLANES_EQ", Requirement::Planes, planes);
        table.register(840, 840, "RPM", Requirement::Rpm, |c, _| {
            c.rpm.ok_or(Domain("no rpm channel"))
        });
        table.register(841, 841, "RPS", Requirement::Rpm, |c, _| {
            c.rpm.map(|rpm| rpm / 60.0).ok_or(Domain("no rpm channel"))
        });

        for (i, kind) in GaugeKind::ALL.iter().enumerate() {
            let first = FIRST_GAUGE_CODE + 6 * i as u32;
            table.register(first, first + 5, kind.name(), Requirement::Gauge(*kind), |c, o| {
                c.gauge(o.code)
            });
        }

        table.register(880, 881, "SHAFT", Requirement::Gauge(GaugeKind::RotDyno6), shaft);

        table
    }

    pub fn register(
        &mut self,
        first: u32,
        last: u32,
        name: &'static str,
        requires: Requirement,
        formula: Formula,
    ) {
        self.entries.push(CodeEntry {
            first,
            last,
            name,
            requires,
            formula,
        });
    }

    pub fn lookup(&self, code: u32) -> Option<&CodeEntry> {
        self.entries.iter().find(|e| e.contains(code))
    }
}

/// Froude scaling plus the legacy unit factors
///
/// Every force channel (`scale == 3`) gets the seawater factor. The in-lb
/// conversion only applies to direct moment channels, gauge moments are
/// already in ft-lb.
pub fn froude(value: f64, output: &Output, lambda: f64, direct: bool) -> f64 {
    let mut res = value * lambda.powf(output.scale);

    if output.scale == 3.0 {
        res *= FORCE_UNITS;
    } else if direct && output.scale == 4.0 {
        res *= MOMENT_UNITS;
    }

    res
}
