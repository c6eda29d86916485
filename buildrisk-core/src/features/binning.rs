//! Fixed-edge histogram binning.

/// A histogram with fixed ascending edges and one label per bin.
///
/// `labels.len()` must be `edges.len() + 1`. A value `v` falls in bin `i` where `i` is the
/// number of edges `<= v`; values below the first edge land in bin 0.
#[derive(Debug, Clone, Copy)]
pub struct FixedBins {
    pub edges: &'static [f64],
    pub labels: &'static [&'static str],
}

impl FixedBins {
    pub fn label(&self, value: f64) -> &'static str {
        let idx = self.edges.iter().take_while(|edge| value >= **edge).count();
        self.labels[idx.min(self.labels.len() - 1)]
    }
}

/// Budget overrun to date, in percent.
pub const OVERRUN_BANDS: FixedBins = FixedBins {
    edges: &[5.0, 10.0, 20.0, 35.0],
    labels: &["none", "minor", "moderate", "severe", "critical"],
};

/// Progress ratio.
pub const PROGRESS_STAGES: FixedBins = FixedBins {
    edges: &[0.25, 0.5, 0.75, 1.0],
    labels: &["inception", "early", "midway", "late", "closeout"],
};
