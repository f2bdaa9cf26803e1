//! per-channel calibration and special gauge geometry (`cal.toml`)

use crate::Error;
use dyno::deck::DeckGeometry;
use dyno::{
    ChannelCal, Deck, Dyno6, GaugeGeometry, GaugeInstance, GaugeKind, Kistler3, Kistler4, RotDyno6,
};
use serde::Deserialize;

/// `hasX` flag, legacy files store them as "TRUE"/"FALSE" strings
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn parse(flag: Option<&Flag>, key: &str) -> Result<bool, Error> {
        match flag {
            None => Ok(false),
            Some(Flag::Bool(v)) => Ok(*v),
            Some(Flag::Text(s)) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
            Some(Flag::Text(s)) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
            Some(Flag::Text(s)) => Err(Error::config(format!("{}: invalid flag {:?}", key, s))),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ChannelEntry {
    pub index: usize,
    pub name: String,
    pub gain: f64,
    pub zero: f64,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl ChannelEntry {
    pub fn cal(&self) -> ChannelCal {
        ChannelCal {
            gain: self.gain,
            zero: self.zero,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct GaugeSpec {
    pub channels: Vec<usize>,
    #[serde(default)]
    pub xdist: f64,
    #[serde(default)]
    pub ydist: f64,
    #[serde(default)]
    pub armx: f64,
    #[serde(default)]
    pub army: f64,
    #[serde(default)]
    pub armz: f64,
    #[serde(default)]
    pub weight: f64,
    pub interaction: Vec<Vec<f64>>,
    pub orientation: Vec<Vec<f64>>,
}

fn matrix6(kind: GaugeKind, name: &str, rows: &[Vec<f64>]) -> Result<ndarray::Array2<f64>, Error> {
    if rows.len() != 6 || rows.iter().any(|row| row.len() != 6) {
        return Err(Error::config(format!("{}: {} matrix must be 6x6", kind, name)));
    }

    Ok(ndarray::Array2::from_shape_fn((6, 6), |(i, j)| rows[i][j]))
}

impl GaugeSpec {
    pub fn geometry(&self, kind: GaugeKind) -> Result<GaugeGeometry, Error> {
        Ok(GaugeGeometry {
            channels: self.channels.clone(),
            xdist: self.xdist,
            ydist: self.ydist,
            armx: self.armx,
            army: self.army,
            armz: self.armz,
            weight: self.weight,
            interaction: matrix6(kind, "interaction", &self.interaction)?,
            orientation: matrix6(kind, "orientation", &self.orientation)?,
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RotDynoSpec {
    #[serde(flatten)]
    pub gauge: GaugeSpec,
    /// raw channel of the shaft encoder
    pub encoder: usize,
    /// encoder board id
    pub cb_id: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DeckSpec {
    pub forward: GaugeSpec,
    pub aft: GaugeSpec,
    /// plate positions, unit: in
    #[serde(default)]
    pub xfwd: f64,
    #[serde(default)]
    pub xaft: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub armx: f64,
    #[serde(default)]
    pub army: f64,
    #[serde(default)]
    pub armz: f64,
}

#[derive(Debug, Clone)]
pub enum GaugeTable {
    Plain(GaugeSpec),
    Rotating(RotDynoSpec),
    Deck(DeckSpec),
}

impl GaugeTable {
    /// every raw channel the gauge reads
    pub fn channels(&self) -> Vec<usize> {
        match self {
            GaugeTable::Plain(g) => g.channels.clone(),
            GaugeTable::Rotating(r) => r.gauge.channels.clone(),
            GaugeTable::Deck(d) => d
                .forward
                .channels
                .iter()
                .chain(d.aft.channels.iter())
                .copied()
                .collect(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct CalFile {
    #[serde(rename = "hasDyno6")]
    has_dyno6: Flag,
    #[serde(rename = "hasRotDyno6")]
    has_rotdyno6: Flag,
    #[serde(rename = "hasDeck")]
    has_deck: Flag,
    #[serde(rename = "hasKistler3", default)]
    has_kistler3: Option<Flag>,
    #[serde(rename = "hasKistler4", default)]
    has_kistler4: Option<Flag>,

    #[serde(default)]
    channel: Vec<ChannelEntry>,

    #[serde(default)]
    dyno6: Option<toml::Value>,
    #[serde(default)]
    rotdyno6: Option<toml::Value>,
    #[serde(default)]
    kistler3: Option<toml::Value>,
    #[serde(default)]
    kistler4: Option<toml::Value>,
    #[serde(default)]
    deck: Option<toml::Value>,
}

/// gauge tables are only parsed when their flag is set
fn gauge_table<T>(enabled: bool, kind: GaugeKind, value: Option<toml::Value>) -> Result<Option<T>, Error>
where
    T: serde::de::DeserializeOwned,
{
    if !enabled {
        return Ok(None);
    }

    let value = value.ok_or_else(|| {
        Error::config(format!("{} is flagged present but [{}] is missing", kind, kind))
    })?;
    let table = serde_ignored::deserialize(value, |path| {
        log::warn!("cal: ignoring unknown key {}.{}", kind, path);
    })?;

    Ok(Some(table))
}

/// calibration of one run, loaded once and never mutated
#[derive(Debug, Clone, Default)]
pub struct CalibrationStore {
    entries: std::collections::BTreeMap<usize, ChannelEntry>,
    gauges: std::collections::BTreeMap<GaugeKind, GaugeTable>,
}

impl CalibrationStore {
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::io(path.as_ref(), e))?;
        Self::from_str(&text)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self, Error> {
        let parser = toml::de::Deserializer::new(text);
        let value = toml::Value::deserialize(parser)?;
        let file: CalFile = serde_ignored::deserialize(value, |path| {
            log::warn!("cal: ignoring unknown key {}", path);
        })?;

        let mut entries = std::collections::BTreeMap::new();
        for entry in file.channel {
            let index = entry.index;
            if entries.insert(index, entry).is_some() {
                return Err(Error::config(format!("channel {} is calibrated twice", index)));
            }
        }

        let mut gauges = std::collections::BTreeMap::new();
        let flag = |f: &Flag, key: &str| Flag::parse(Some(f), key);

        if let Some(g) = gauge_table(flag(&file.has_dyno6, "hasDyno6")?, GaugeKind::Dyno6, file.dyno6)? {
            gauges.insert(GaugeKind::Dyno6, GaugeTable::Plain(g));
        }
        if let Some(g) = gauge_table(
            flag(&file.has_rotdyno6, "hasRotDyno6")?,
            GaugeKind::RotDyno6,
            file.rotdyno6,
        )? {
            gauges.insert(GaugeKind::RotDyno6, GaugeTable::Rotating(g));
        }
        if let Some(g) = gauge_table(
            Flag::parse(file.has_kistler3.as_ref(), "hasKistler3")?,
            GaugeKind::Kistler3,
            file.kistler3,
        )? {
            gauges.insert(GaugeKind::Kistler3, GaugeTable::Plain(g));
        }
        if let Some(g) = gauge_table(
            Flag::parse(file.has_kistler4.as_ref(), "hasKistler4")?,
            GaugeKind::Kistler4,
            file.kistler4,
        )? {
            gauges.insert(GaugeKind::Kistler4, GaugeTable::Plain(g));
        }
        if let Some(g) = gauge_table(flag(&file.has_deck, "hasDeck")?, GaugeKind::Deck, file.deck)? {
            gauges.insert(GaugeKind::Deck, GaugeTable::Deck(g));
        }

        log::debug!(
            "cal: {} channels, gauges: {:?}",
            entries.len(),
            gauges.keys().collect::<Vec<_>>()
        );

        Ok(Self { entries, gauges })
    }

    pub fn entry(&self, channel: usize) -> Option<&ChannelEntry> {
        self.entries.get(&channel)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ChannelEntry> {
        self.entries.values()
    }

    pub fn gain(&self, channel: usize) -> Option<f64> {
        self.entry(channel).map(|e| e.gain)
    }

    pub fn zero(&self, channel: usize) -> Option<f64> {
        self.entry(channel).map(|e| e.zero)
    }

    /// `(raw - zero) * gain`
    pub fn apply(&self, channel: usize, raw: f64) -> Option<f64> {
        self.entry(channel).map(|e| e.cal().apply(raw))
    }

    pub fn cal(&self, channel: usize) -> Result<ChannelCal, Error> {
        self.entry(channel)
            .map(ChannelEntry::cal)
            .ok_or_else(|| Error::config(format!("channel {} has no calibration entry", channel)))
    }

    pub fn has_gauge(&self, kind: GaugeKind) -> bool {
        self.gauges.contains_key(&kind)
    }

    pub fn gauge(&self, kind: GaugeKind) -> Option<&GaugeTable> {
        self.gauges.get(&kind)
    }

    fn cals(&self, kind: GaugeKind, channels: &[usize]) -> Result<Vec<ChannelCal>, Error> {
        channels
            .iter()
            .map(|&ch| {
                self.cal(ch)
                    .map_err(|_| Error::config(format!("{}: channel {} has no calibration entry", kind, ch)))
            })
            .collect()
    }

    /// fresh gauge instances for one run
    pub fn build_gauges(&self) -> Result<std::collections::BTreeMap<GaugeKind, GaugeInstance>, Error> {
        let mut res = std::collections::BTreeMap::new();

        for (&kind, table) in &self.gauges {
            let gauge: GaugeInstance = match table {
                GaugeTable::Plain(g) => {
                    let geometry = g.geometry(kind)?;
                    let cals = self.cals(kind, &g.channels)?;
                    match kind {
                        GaugeKind::Kistler3 => Kistler3::new(geometry, cals)?.into(),
                        GaugeKind::Kistler4 => Kistler4::new(geometry, cals)?.into(),
                        _ => Dyno6::new(geometry, cals)?.into(),
                    }
                }
                GaugeTable::Rotating(r) => {
                    let geometry = r.gauge.geometry(kind)?;
                    let cals = self.cals(kind, &r.gauge.channels)?;
                    RotDyno6::new(geometry, cals, r.encoder, r.cb_id)?.into()
                }
                GaugeTable::Deck(d) => {
                    let geometry = DeckGeometry {
                        forward: d.forward.geometry(kind)?,
                        aft: d.aft.geometry(kind)?,
                        xfwd: d.xfwd,
                        xaft: d.xaft,
                        weight: d.weight,
                        arm: [d.armx, d.army, d.armz],
                    };
                    let forward = self.cals(kind, &d.forward.channels)?;
                    let aft = self.cals(kind, &d.aft.channels)?;
                    Deck::new(geometry, forward, aft)?.into()
                }
            };
            res.insert(kind, gauge);
        }

        Ok(res)
    }
}
