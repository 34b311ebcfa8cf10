use crate::analysis::bfactor::DensityHistogram;
use crate::analysis::matrix::PairwiseMatrix;
use crate::render::{ChartStyle, HeatmapStyle, Profile, RenderError, Renderer};
use std::sync::Mutex;

/// Renderer that records what it was asked to draw and returns a fixed payload.
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    heatmaps: Mutex<usize>,
    profiles: Mutex<Vec<Profile>>,
    histograms: Mutex<usize>,
    scatters: Mutex<Vec<Vec<(f64, f64)>>>,
}

impl RecordingRenderer {
    pub(crate) const PNG: &'static [u8] = b"\x89PNG-stub";

    pub(crate) fn heatmap_calls(&self) -> usize {
        *self.heatmaps.lock().unwrap()
    }

    pub(crate) fn profile_calls(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }

    pub(crate) fn histogram_calls(&self) -> usize {
        *self.histograms.lock().unwrap()
    }

    pub(crate) fn last_profile(&self) -> Option<Profile> {
        self.profiles.lock().unwrap().last().cloned()
    }

    pub(crate) fn last_scatter(&self) -> Option<Vec<(f64, f64)>> {
        self.scatters.lock().unwrap().last().cloned()
    }
}

impl Renderer for RecordingRenderer {
    fn heatmap(&self, _: &PairwiseMatrix, _: &HeatmapStyle) -> Result<Vec<u8>, RenderError> {
        *self.heatmaps.lock().unwrap() += 1;
        Ok(Self::PNG.to_vec())
    }

    fn profile(&self, profile: &Profile, _: &ChartStyle) -> Result<Vec<u8>, RenderError> {
        self.profiles.lock().unwrap().push(profile.clone());
        Ok(Self::PNG.to_vec())
    }

    fn histogram(&self, _: &DensityHistogram, _: &ChartStyle) -> Result<Vec<u8>, RenderError> {
        *self.histograms.lock().unwrap() += 1;
        Ok(Self::PNG.to_vec())
    }

    fn scatter(&self, points: &[(f64, f64)], _: &ChartStyle) -> Result<Vec<u8>, RenderError> {
        self.scatters.lock().unwrap().push(points.to_vec());
        Ok(Self::PNG.to_vec())
    }
}
