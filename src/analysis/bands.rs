use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::transform::Spectrogram;
use crate::config::FrequencyBand;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandEnergy {
    /// Mean magnitude over every bin and frame inside the band
    pub energy: f64,
    pub peak_frequency_hz: f64,
}

/// Band results in band-table order; serializes as a name-keyed map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandEnergies(Vec<(String, BandEnergy)>);

impl BandEnergies {
    pub fn get(&self, name: &str) -> Option<&BandEnergy> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    /// Energy of `name`, or 0 when the band table has no such band.
    pub fn energy(&self, name: &str) -> f64 {
        self.get(name).map_or(0.0, |b| b.energy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BandEnergy)> {
        self.0.iter().map(|(n, b)| (n.as_str(), b))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, BandEnergy)>> for BandEnergies {
    fn from(bands: Vec<(String, BandEnergy)>) -> Self {
        Self(bands)
    }
}

impl Serialize for BandEnergies {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, band) in &self.0 {
            map.serialize_entry(name, band)?;
        }
        map.end()
    }
}

pub fn band_energies(spec: &Spectrogram, bands: &[FrequencyBand]) -> BandEnergies {
    bands
        .iter()
        .map(|band| (band.name.clone(), band_energy(spec, band)))
        .collect::<Vec<_>>()
        .into()
}

fn band_energy(spec: &Spectrogram, band: &FrequencyBand) -> BandEnergy {
    let bins: Vec<usize> = spec
        .frequencies_hz()
        .iter()
        .enumerate()
        .filter(|(_, &hz)| band.contains(hz))
        .map(|(k, _)| k)
        .collect();

    if bins.is_empty() {
        return BandEnergy {
            energy: 0.0,
            peak_frequency_hz: band.low_hz as f64,
        };
    }

    let frames = spec.num_frames() as f64;
    let mut total = 0.0f64;
    let mut peak_bin = bins[0];
    let mut peak_mean = f64::MIN;

    for &bin in &bins {
        let bin_sum: f64 = spec.frames().iter().map(|frame| frame[bin] as f64).sum();
        total += bin_sum;
        let bin_mean = bin_sum / frames;
        if bin_mean > peak_mean {
            peak_mean = bin_mean;
            peak_bin = bin;
        }
    }

    BandEnergy {
        energy: total / (bins.len() as f64 * frames),
        peak_frequency_hz: spec.frequencies_hz()[peak_bin] as f64,
    }
}
