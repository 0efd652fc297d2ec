use super::labels::{LABEL_CAPACITY, LabelTable};

/// Number of most recent samples a chart shows. Never exceeds `LABEL_CAPACITY`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport(usize);

impl Viewport {
    /// Clamps to `LABEL_CAPACITY`.
    pub fn new(points: usize) -> Self {
        Viewport(points.min(LABEL_CAPACITY))
    }

    pub fn points(self) -> usize {
        self.0
    }
}

/// How a chart's drawable width in cells maps to a sample count.
///
/// `points = points_per_cell * inner_width - reserved_points`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewportGeometry {
    pub points_per_cell: u16,
    pub reserved_points: u16,
}

impl Default for ViewportGeometry {
    fn default() -> Self {
        ViewportGeometry {
            points_per_cell: 2,
            reserved_points: 14,
        }
    }
}

impl ViewportGeometry {
    pub fn viewport(&self, inner_width: u16) -> Viewport {
        let raw = (self.points_per_cell as usize * inner_width as usize)
            .saturating_sub(self.reserved_points as usize);
        if raw > LABEL_CAPACITY {
            tracing::debug!(raw, "viewport clamped to label capacity");
        }
        Viewport::new(raw)
    }
}

/// The newest `min(viewport, len)` samples of `series`, oldest first.
pub fn latest(series: &[f64], viewport: Viewport) -> &[f64] {
    let n = viewport.points().min(series.len());
    &series[series.len() - n..]
}

/// Labels matching a data slice of `len` samples.
pub fn labels_for(table: &LabelTable, len: usize) -> &[String] {
    table.suffix(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::scale::SampleInterval;

    #[test]
    fn test_latest_shorter_viewport() {
        let series: Vec<f64> = (0..50).map(|i| i as f64).collect();
        for v in 0..=50 {
            let slice = latest(&series, Viewport::new(v));
            assert_eq!(slice.len(), v);
            assert_eq!(slice, &series[50 - v..]);
        }
    }

    #[test]
    fn test_latest_longer_viewport() {
        let series = [1.0, 2.0, 3.0];
        assert_eq!(latest(&series, Viewport::new(200)), &series[..]);
        assert!(latest(&[], Viewport::new(10)).is_empty());
    }

    #[test]
    fn test_viewport_clamped() {
        assert_eq!(Viewport::new(5000).points(), LABEL_CAPACITY);
        let geometry = ViewportGeometry::default();
        assert_eq!(geometry.viewport(600).points(), LABEL_CAPACITY);
    }

    #[test]
    fn test_default_geometry() {
        let geometry = ViewportGeometry::default();
        assert_eq!(geometry.viewport(100).points(), 186);
        // narrow charts saturate at zero instead of wrapping
        assert_eq!(geometry.viewport(5).points(), 0);
    }

    #[test]
    fn test_labels_match_data() {
        let table = LabelTable::new(SampleInterval::from_millis(1000).unwrap());
        let series = [4.0, 5.0];
        let data = latest(&series, Viewport::new(10));
        let labels = labels_for(&table, data.len());
        assert_eq!(labels, &["1".to_string(), "0".to_string()]);
    }
}
