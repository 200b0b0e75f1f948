//! Descriptive statistics over per-vertex scalar values.

/// Summary statistics for one scalar column.
#[derive(Debug, Clone, Copy, Default)]
pub struct Descriptive {
    pub mean: f32,
    /// Population standard deviation.
    pub std_dev: f32,
    pub min: f32,
    pub max: f32,
}

impl Descriptive {
    /// Compute statistics over `values`. Empty input yields all
    /// zeros.
    pub fn of(values: &[f32]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f32;
        let mean = values.iter().sum::<f32>() / n;
        let variance = values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / n;

        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for &v in values {
            min = min.min(v);
            max = max.max(v);
        }

        Self {
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        }
    }
}
