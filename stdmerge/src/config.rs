//! merge configuration (`merge.toml`)

use crate::Error;
use serde::Deserialize;

fn default_zero_mode() -> i64 {
    1
}

fn default_standby_mode() -> i64 {
    2
}

fn default_execute_max() -> i64 {
    9
}

/// mode channel codes
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Modes {
    #[serde(default = "default_zero_mode")]
    pub zero: i64,
    #[serde(default = "default_standby_mode")]
    pub standby: i64,
    /// highest execute code, execute codes are `standby + 1..=execute_max`
    #[serde(default = "default_execute_max")]
    pub execute_max: i64,
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            zero: default_zero_mode(),
            standby: default_standby_mode(),
            execute_max: default_execute_max(),
        }
    }
}

impl Modes {
    pub fn is_zero(&self, mode: i64) -> bool {
        mode == self.zero
    }

    pub fn is_run_data(&self, mode: i64) -> bool {
        (self.standby..=self.execute_max).contains(&mode)
    }

    pub fn is_execute(&self, mode: i64) -> bool {
        (self.standby + 1..=self.execute_max).contains(&mode)
    }
}

/// raw attitude channels, calibrated to degrees
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Attitude {
    pub roll: usize,
    pub pitch: usize,
    pub yaw: usize,
}

fn default_adcp_u() -> usize {
    0
}

fn default_adcp_v() -> usize {
    1
}

fn default_adcp_w() -> usize {
    2
}

fn default_filter_coeff() -> f64 {
    10.0
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Adcp {
    #[serde(default = "default_adcp_u")]
    pub u: usize,
    #[serde(default = "default_adcp_v")]
    pub v: usize,
    #[serde(default = "default_adcp_w")]
    pub w: usize,
    /// recursive smoothing coefficient of the filtered velocities, 0 disables
    #[serde(default = "default_filter_coeff")]
    pub filter_coeff: f64,
}

impl Default for Adcp {
    fn default() -> Self {
        Self {
            u: default_adcp_u(),
            v: default_adcp_v(),
            w: default_adcp_w(),
            filter_coeff: default_filter_coeff(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Depth {
    pub channel: usize,
}

/// the four stern plane channels
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Planes {
    pub channels: [usize; 4],
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Rpm {
    pub channel: usize,
    /// commanded rpm, only its sign is used
    pub command: usize,
}

/// model geometry keyed by hull length
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Hull {
    pub length: f64,
    /// depth sensor position relative to the CG, body axes
    pub depth_sensor: [f64; 3],
}

/// one output column
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Output {
    pub name: String,
    pub code: u32,
    /// Froude scaling exponent
    #[serde(default)]
    pub scale: f64,
    /// subtract the zero offset, direct channels only
    #[serde(default)]
    pub zero: bool,
}

/// column names used by the consistency pass
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct Consistency {
    pub roll: String,
    pub pitch: String,
    pub yaw: String,
    pub p: String,
    pub q: String,
    pub r: String,
    pub u: String,
    pub v: String,
    pub w: String,
}

impl Default for Consistency {
    fn default() -> Self {
        Self {
            roll: "ROLL".into(),
            pitch: "PITCH".into(),
            yaw: "YAW".into(),
            p: "P".into(),
            q: "Q".into(),
            r: "R".into(),
            u: "U_F".into(),
            v: "V_F".into(),
            w: "W_F".into(),
        }
    }
}

/// global configuration
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub title: String,
    #[serde(default)]
    pub run_kind: i64,
    /// model scale ratio
    pub lambda: f64,
    /// sample period, model scale. unit: s
    pub dt: f64,
    /// raw channels per sample
    pub nchannels: usize,
    pub mode_channel: usize,
    /// unit: ft
    pub model_length: f64,

    #[serde(default)]
    pub modes: Modes,
    pub attitude: Attitude,
    #[serde(default)]
    pub adcp: Adcp,
    #[serde(default)]
    pub depth: Option<Depth>,
    #[serde(default)]
    pub planes: Option<Planes>,
    #[serde(default)]
    pub rpm: Option<Rpm>,
    #[serde(default)]
    pub hull: Vec<Hull>,

    pub output: Vec<Output>,
    #[serde(default)]
    pub consistency: Option<Consistency>,
}

/// hull lengths closer than this are the same model, unit: ft
pub const HULL_LENGTH_TOLERANCE: f64 = 0.05;

impl Config {
    /// full scale sample period
    pub fn full_scale_dt(&self) -> f64 {
        self.dt * self.lambda.sqrt()
    }

    pub fn hull(&self) -> Option<&Hull> {
        self.hull
            .iter()
            .find(|h| (h.length - self.model_length).abs() <= HULL_LENGTH_TOLERANCE)
    }

    fn check_channel(&self, what: &str, channel: usize) -> Result<(), Error> {
        if channel >= self.nchannels {
            return Err(Error::config(format!(
                "{}: channel {} out of range, nchannels is {}",
                what, channel, self.nchannels
            )));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.lambda.is_finite() && self.lambda > 0.0) {
            return Err(Error::config("lambda must be positive"));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(Error::config("dt must be positive"));
        }
        if self.modes.standby >= self.modes.execute_max {
            return Err(Error::config("modes: execute_max must be above standby"));
        }
        if self.modes.is_run_data(self.modes.zero) {
            return Err(Error::config("modes: the zero code is inside the run-data range"));
        }
        if self.adcp.filter_coeff.is_nan() || self.adcp.filter_coeff < 0.0 {
            return Err(Error::config("adcp: filter_coeff must not be negative"));
        }

        self.check_channel("mode_channel", self.mode_channel)?;
        for ch in [self.attitude.roll, self.attitude.pitch, self.attitude.yaw] {
            self.check_channel("attitude", ch)?;
        }
        for ch in [self.adcp.u, self.adcp.v, self.adcp.w] {
            self.check_channel("adcp", ch)?;
        }
        if let Some(depth) = &self.depth {
            self.check_channel("depth", depth.channel)?;
        }
        if let Some(planes) = &self.planes {
            for ch in planes.channels {
                self.check_channel("planes", ch)?;
            }
        }
        if let Some(rpm) = &self.rpm {
            self.check_channel("rpm", rpm.channel)?;
            self.check_channel("rpm", rpm.command)?;
        }

        if self.output.is_empty() {
            return Err(Error::config("no output channels"));
        }
        let mut names = std::collections::HashSet::new();
        for output in &self.output {
            if output.name.is_empty() || output.name.chars().any(char::is_whitespace) {
                return Err(Error::config(format!(
                    "output name {:?} must be non-empty without whitespace",
                    output.name
                )));
            }
            if !names.insert(output.name.as_str()) {
                return Err(Error::config(format!("output {} is listed twice", output.name)));
            }
            if !output.scale.is_finite() {
                return Err(Error::config(format!("output {}: invalid scale", output.name)));
            }
        }

        Ok(())
    }
}

fn parse(buffer: &str) -> Result<Config, Error> {
    let parser = toml::de::Deserializer::new(buffer);
    let value = toml::Value::deserialize(parser)?;
    let mut has_unsupported: bool = false;
    let cfg: Config = serde_ignored::deserialize(value, |path| {
        log::error!("unsupported config: {:?}", path.to_string());
        has_unsupported = true;
    })?;
    if has_unsupported {
        return Err(Error::UnsupportedConfigs);
    }

    cfg.validate()?;
    log::debug!("{:#?}", cfg);

    Ok(cfg)
}

/// load config file
pub fn load<P: AsRef<std::path::Path>>(filename: P) -> Result<Config, Error> {
    let buffer = std::fs::read_to_string(filename.as_ref())
        .map_err(|e| Error::io(filename.as_ref(), e))?;
    parse(&buffer)
}

pub fn from_str(buffer: &str) -> Result<Config, Error> {
    parse(buffer)
}
