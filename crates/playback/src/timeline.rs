//! The shared index axis across all sites' series.

use std::collections::HashMap;

use wind_common::{Observation, SiteId, TimeLabel, WindError, WindResult};

use crate::series::HistoricalPoint;

/// Merged playback timeline.
///
/// Labels come from the longest series (the first one, when several tie).
/// Sites are aligned by index, not by timestamp, so series covering
/// different ranges can be offset from each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalTimeline {
    labels: Vec<TimeLabel>,
    series: HashMap<SiteId, Vec<Observation>>,
}

impl HistoricalTimeline {
    /// Merge per-site series, in site order.
    pub fn from_series(series: Vec<(SiteId, Vec<HistoricalPoint>)>) -> Self {
        let mut labels: Vec<TimeLabel> = Vec::new();
        let mut by_site = HashMap::with_capacity(series.len());

        for (site, points) in series {
            if points.len() > labels.len() {
                labels = points.iter().map(|p| p.label.clone()).collect();
            }
            by_site.insert(site, points.into_iter().map(|p| p.observation).collect());
        }

        Self {
            labels,
            series: by_site,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[TimeLabel] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> Option<&TimeLabel> {
        self.labels.get(index)
    }

    pub fn site_count(&self) -> usize {
        self.series.len()
    }

    /// Number of records held for one site.
    pub fn series_len(&self, site: &SiteId) -> usize {
        self.series.get(site).map(Vec::len).unwrap_or(0)
    }

    /// Observations of every site at `index`. Sites whose series is shorter
    /// than `index` are absent from the map.
    pub fn at(&self, index: usize) -> WindResult<HashMap<SiteId, Observation>> {
        if index >= self.labels.len() {
            return Err(WindError::IndexOutOfRange {
                index,
                len: self.labels.len(),
            });
        }

        Ok(self
            .series
            .iter()
            .filter_map(|(site, obs)| obs.get(index).map(|o| (site.clone(), o.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wind_common::ObservationSource;

    fn points(n: usize, tag: &str) -> Vec<HistoricalPoint> {
        (0..n)
            .map(|i| HistoricalPoint {
                label: TimeLabel {
                    date: tag.to_string(),
                    time: format!("{:02}:00", i),
                },
                observation: Observation::new(
                    i as f64 + 1.0,
                    0.0,
                    None,
                    i as i64,
                    ObservationSource::OpenMeteo,
                ),
            })
            .collect()
    }

    #[test]
    fn test_length_is_longest_series() {
        let timeline = HistoricalTimeline::from_series(vec![
            (SiteId::from("A"), points(3, "a")),
            (SiteId::from("B"), points(5, "b")),
            (SiteId::from("C"), points(5, "c")),
        ]);
        assert_eq!(timeline.len(), 5);
        // first longest wins
        assert_eq!(timeline.label(0).unwrap().date, "b");
        assert_eq!(timeline.series_len(&SiteId::from("A")), 3);
    }

    #[test]
    fn test_short_series_absent_past_end() {
        let timeline = HistoricalTimeline::from_series(vec![
            (SiteId::from("A"), points(2, "a")),
            (SiteId::from("B"), points(4, "b")),
        ]);
        let frame = timeline.at(1).unwrap();
        assert_eq!(frame.len(), 2);

        let frame = timeline.at(3).unwrap();
        assert_eq!(frame.len(), 1);
        assert!(frame.contains_key("B"));
        assert!(!frame.contains_key("A"));
    }

    #[test]
    fn test_out_of_range() {
        let timeline = HistoricalTimeline::from_series(vec![(SiteId::from("A"), points(2, "a"))]);
        let err = timeline.at(2).unwrap_err();
        assert!(matches!(err, WindError::IndexOutOfRange { index: 2, len: 2 }));
        assert!(HistoricalTimeline::default().at(0).is_err());
    }
}
