use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::config::{AnalysisConfig, YearRange};
use crate::model::{CitationData, Estimation, MetricRecord, PaperRecord};

/// late / early, with +inf for papers cited only late and 0 for uncited papers
pub fn beauty_ratio(early: f64, late: f64) -> f64 {
    if early > 0.0 {
        late / early
    } else if late > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Year with the most citations; the earliest such year on ties
pub fn peak(citations_by_year: &BTreeMap<i32, u64>) -> Option<(i32, u64)> {
    citations_by_year
        .iter()
        .fold(None, |best: Option<(i32, u64)>, (&year, &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((year, count)),
        })
}

/// Derives delayed-recognition metrics from paper records
#[derive(Debug, Clone, Copy)]
pub struct Estimator {
    valid_years: YearRange,
    current_year: i32,
    early_years: i32,
    min_age: i32,
}

impl Estimator {
    pub fn new(current_year: i32, early_years: i32, min_age: i32, min_valid_year: i32) -> Self {
        Self {
            valid_years: YearRange::new(min_valid_year, current_year),
            current_year,
            early_years,
            min_age,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.current_year,
            config.early_years,
            config.min_age,
            config.min_valid_year,
        )
    }

    /// Metrics for one paper, or `None` if its year is unusable or it is too young
    pub fn estimate(&self, paper: &PaperRecord) -> Option<MetricRecord> {
        if !self.valid_years.contains(paper.year) {
            return None;
        }
        let age = self.current_year - paper.year;
        if age < self.min_age {
            return None;
        }

        let total = paper.total_citations();
        let citations_per_year = total as f64 / (age + 1) as f64;

        let mut metric = MetricRecord {
            index: paper.index,
            id: paper.id.clone(),
            year: paper.year,
            age,
            total_citations: total,
            num_references: paper.num_references,
            citations_per_year,
            early_citations: 0.0,
            late_citations: 0.0,
            beauty_ratio: 0.0,
            peak_year: None,
            peak_citations: None,
            delay_to_peak: None,
            beauty_coefficient: None,
            estimation: Estimation::Uniform,
            concepts: paper.concepts.clone(),
        };

        match &paper.citations {
            CitationData::Count(_) => self.fill_uniform(&mut metric),
            CitationData::Timeline(by_year) => self.fill_timeline(&mut metric, by_year),
        }

        metric.beauty_ratio = beauty_ratio(metric.early_citations, metric.late_citations);
        Some(metric)
    }

    /// Metrics for every retained paper, in input order
    pub fn estimate_all(&self, papers: &[PaperRecord]) -> Vec<MetricRecord> {
        papers.par_iter().filter_map(|p| self.estimate(p)).collect()
    }

    fn fill_uniform(&self, metric: &mut MetricRecord) {
        let early_window = self.early_years.min(metric.age);
        metric.early_citations = early_window as f64 * metric.citations_per_year;
        metric.late_citations = (metric.age - early_window) as f64 * metric.citations_per_year;
        metric.estimation = Estimation::Uniform;
    }

    fn fill_timeline(&self, metric: &mut MetricRecord, by_year: &BTreeMap<i32, u64>) {
        let early_end = metric.year + self.early_years.max(0);

        let early: u64 = by_year.range(metric.year..=early_end).map(|(_, c)| c).sum();
        let late: u64 = if early_end < self.current_year {
            by_year
                .range(early_end + 1..=self.current_year)
                .map(|(_, c)| c)
                .sum()
        } else {
            0
        };

        metric.early_citations = early as f64;
        metric.late_citations = late as f64;
        metric.estimation = Estimation::Timeline;

        if let Some((peak_year, peak_citations)) = peak(by_year) {
            metric.peak_year = Some(peak_year);
            metric.peak_citations = Some(peak_citations);
            metric.delay_to_peak = Some(peak_year - metric.year);
            if early > 0 {
                metric.beauty_coefficient = Some(peak_citations as f64 / early as f64);
            }
        }
    }
}

impl Default for Estimator {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_uniform_scenario_2005_paper() {
        let paper = PaperRecord::with_count(1, "astro-ph/0501001", 2005, 40);
        let m = Estimator::default().estimate(&paper).unwrap();

        assert_eq!(m.age, 20);
        assert!((m.citations_per_year - 40.0 / 21.0).abs() < EPS);
        assert!((m.early_citations - 3.0 * 40.0 / 21.0).abs() < EPS);
        assert!((m.late_citations - 17.0 * 40.0 / 21.0).abs() < EPS);
        assert!((m.beauty_ratio - 17.0 / 3.0).abs() < EPS);
        assert!((m.early_citations - 5.714).abs() < 1e-3);
        assert!((m.late_citations - 32.381).abs() < 1e-3);
        assert_eq!(m.estimation, Estimation::Uniform);
        assert!(m.peak_year.is_none());
        assert!(m.beauty_coefficient.is_none());
    }

    #[test]
    fn test_young_paper_excluded() {
        let est = Estimator::default();
        assert!(est.estimate(&PaperRecord::with_count(1, "a", 2024, 500)).is_none());
        assert!(est.estimate(&PaperRecord::with_count(2, "b", 2021, 500)).is_none());
        assert!(est.estimate(&PaperRecord::with_count(3, "c", 2020, 500)).is_some());
    }

    #[test]
    fn test_invalid_year_excluded() {
        let est = Estimator::default();
        assert!(est.estimate(&PaperRecord::with_count(1, "a", 0, 5)).is_none());
        assert!(est.estimate(&PaperRecord::with_count(2, "b", 1985, 5)).is_none());
        assert!(est.estimate(&PaperRecord::with_count(3, "c", 2030, 5)).is_none());
    }

    #[test]
    fn test_uniform_early_plus_late_equals_rate_times_age() {
        let est = Estimator::default();
        for (year, total) in [(1991, 0), (1995, 7), (2000, 1), (2010, 999), (2020, 3)] {
            let m = est.estimate(&PaperRecord::with_count(0, "p", year, total)).unwrap();
            let expected = m.citations_per_year * m.age as f64;
            assert!((m.early_citations + m.late_citations - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_early_window_clamped_to_age() {
        let est = Estimator::new(2025, 8, 5, 1991);
        let m = est.estimate(&PaperRecord::with_count(0, "p", 2019, 14)).unwrap();
        assert_eq!(m.age, 6);
        assert!((m.early_citations - 12.0).abs() < EPS);
        assert_eq!(m.late_citations, 0.0);
        assert_eq!(m.beauty_ratio, 0.0);
    }

    #[test]
    fn test_beauty_ratio_three_way_rule() {
        assert_eq!(beauty_ratio(0.0, 0.0), 0.0);
        assert_eq!(beauty_ratio(0.0, 3.0), f64::INFINITY);
        assert_eq!(beauty_ratio(2.0, 3.0), 1.5);
        assert_eq!(beauty_ratio(2.0, 0.0), 0.0);
    }

    #[test]
    fn test_uncited_paper_has_zero_ratio() {
        let m = Estimator::default()
            .estimate(&PaperRecord::with_count(0, "p", 2000, 0))
            .unwrap();
        assert_eq!(m.early_citations, 0.0);
        assert_eq!(m.late_citations, 0.0);
        assert_eq!(m.beauty_ratio, 0.0);
    }

    #[test]
    fn test_timeline_peak_scenario() {
        let by_year = BTreeMap::from([(2000, 1), (2001, 0), (2010, 50), (2011, 2)]);
        let paper = PaperRecord::with_timeline(0, "astro-ph/0001001", 2000, by_year);
        let m = Estimator::default().estimate(&paper).unwrap();

        assert_eq!(m.peak_year, Some(2010));
        assert_eq!(m.peak_citations, Some(50));
        assert_eq!(m.delay_to_peak, Some(10));
        assert_eq!(m.total_citations, 53);
        assert_eq!(m.early_citations, 1.0);
        assert_eq!(m.late_citations, 52.0);
        assert_eq!(m.beauty_ratio, 52.0);
        assert_eq!(m.beauty_coefficient, Some(50.0));
        assert_eq!(m.estimation, Estimation::Timeline);
    }

    #[test]
    fn test_timeline_early_window_is_inclusive() {
        // year + 3 belongs to the early window, year + 4 to the late one
        let by_year = BTreeMap::from([(2003, 4), (2004, 6)]);
        let m = Estimator::default()
            .estimate(&PaperRecord::with_timeline(0, "p", 2000, by_year))
            .unwrap();
        assert_eq!(m.early_citations, 4.0);
        assert_eq!(m.late_citations, 6.0);
    }

    #[test]
    fn test_timeline_ignores_years_outside_windows() {
        let by_year = BTreeMap::from([(1999, 3), (2005, 2), (2030, 9)]);
        let m = Estimator::default()
            .estimate(&PaperRecord::with_timeline(0, "p", 2000, by_year))
            .unwrap();
        assert_eq!(m.early_citations, 0.0);
        assert_eq!(m.late_citations, 2.0);
        assert_eq!(m.beauty_ratio, f64::INFINITY);
        assert_eq!(m.beauty_coefficient, None);
        assert_eq!(m.peak_year, Some(2030));
    }

    #[test]
    fn test_timeline_peak_tie_takes_earliest_year() {
        let by_year = BTreeMap::from([(2004, 7), (2008, 7), (2012, 3)]);
        assert_eq!(peak(&by_year), Some((2004, 7)));
    }

    #[test]
    fn test_empty_timeline_has_no_peak() {
        let m = Estimator::default()
            .estimate(&PaperRecord::with_timeline(0, "p", 2000, BTreeMap::new()))
            .unwrap();
        assert!(m.peak_year.is_none());
        assert!(m.peak_citations.is_none());
        assert!(m.delay_to_peak.is_none());
        assert!(m.beauty_coefficient.is_none());
        assert_eq!(m.beauty_ratio, 0.0);
    }

    #[test]
    fn test_estimate_all_drops_young_and_keeps_order() {
        let papers = vec![
            PaperRecord::with_count(0, "old", 2000, 10),
            PaperRecord::with_count(1, "young", 2024, 10),
            PaperRecord::with_count(2, "older", 1995, 10),
        ];
        let metrics = Estimator::default().estimate_all(&papers);

        assert!(metrics.len() <= papers.len());
        let ids: Vec<&str> = metrics.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["old", "older"]);
    }
}
