use anyhow::Result;
use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use std::{collections::BTreeMap, path::Path};
use tracing::info;

use super::{line_color, value_range, LIGHT_GRAY};
use crate::process::records::{AnalysisRecord, Party};

/// First entry of the party legend.
pub const LEGEND_TITLE: &str = "Political Party";

/// Points for the daily-average chart, restricted to the window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    /// Mean new cases over all states per date.
    pub totals: Vec<(NaiveDate, f64)>,
    /// Mean new cases per date, one line per party label.
    pub by_party: BTreeMap<String, Vec<(NaiveDate, f64)>>,
}

/// Collapse rows to one point per date (and per party), sorted by date.
pub fn timeseries_points(rows: &[AnalysisRecord], window: &(NaiveDate, NaiveDate)) -> TimeSeries {
    let (start, end) = *window;
    let in_window = |d: NaiveDate| d >= start && d <= end;

    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut by_party: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for r in rows {
        let Some(date) = r.record.date.filter(|&d| in_window(d)) else {
            continue;
        };
        if let Some(v) = r.new_case_total {
            totals.entry(date).or_insert(v);
        }
        if let (Some(party), Some(v)) = (r.record.party.as_deref(), r.new_case_mean_party) {
            by_party
                .entry(party.to_string())
                .or_default()
                .entry(date)
                .or_insert(v);
        }
    }

    TimeSeries {
        totals: totals.into_iter().collect(),
        by_party: by_party
            .into_iter()
            .map(|(party, pts)| (party, pts.into_iter().collect()))
            .collect(),
    }
}

/// Legend rows in drawing order: the heading, then one per party line.
pub fn legend_labels(series: &TimeSeries) -> Vec<&str> {
    std::iter::once(LEGEND_TITLE)
        .chain(series.by_party.keys().map(String::as_str))
        .collect()
}

/// Light-gray bars of the all-state daily mean with one line per party on a
/// twin axis.
#[tracing::instrument(level = "info", skip(rows), fields(path = %path.display()))]
pub fn render_timeseries(
    rows: &[AnalysisRecord],
    window: (NaiveDate, NaiveDate),
    path: &Path,
) -> Result<()> {
    let series = timeseries_points(rows, &window);
    let (start, end) = window;

    let root = BitMapBackend::new(path, (1500, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let bar_range = value_range(series.totals.iter().map(|&(_, v)| v));
    let line_range = value_range(series.by_party.values().flatten().map(|&(_, v)| v));

    let mut chart = ChartBuilder::on(&root)
        .caption("Average Number of Covid-19 Daily Cases", ("sans-serif", 32))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .right_y_label_area_size(20)
        .build_cartesian_2d(start..end, bar_range)?
        .set_secondary_coord(start..end, line_range);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Date")
        .y_desc("New Cases")
        .axis_desc_style(("sans-serif", 22))
        .draw()?;

    chart.draw_series(series.totals.iter().map(|&(d, v)| {
        Rectangle::new([(d, 0.0), (d + Duration::days(1), v)], LIGHT_GRAY.filled())
    }))?;

    for label in legend_labels(&series) {
        match series.by_party.get(label) {
            Some(points) => {
                let color = line_color(Party::from_label(Some(label)));
                chart
                    .draw_secondary_series(LineSeries::new(
                        points.iter().copied(),
                        color.stroke_width(2),
                    ))?
                    .label(label)
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
            }
            // heading row: empty series, invisible marker
            None => {
                chart
                    .draw_series(std::iter::empty::<Rectangle<(NaiveDate, f64)>>())?
                    .label(label)
                    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], WHITE));
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 18))
        .draw()?;

    root.present()?;
    info!(
        days = series.totals.len(),
        parties = series.by_party.len(),
        "timeseries chart saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::records::UnifiedRecord;
    use tempfile::tempdir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(date: NaiveDate, party: &str, total: f64, party_mean: f64) -> AnalysisRecord {
        AnalysisRecord {
            record: UnifiedRecord {
                date: Some(date),
                positive: None,
                probable_cases: None,
                negative: None,
                policy_date: None,
                state_name: Some("X".into()),
                state_code: None,
                party: Some(party.into()),
            },
            tot_avg_party: None,
            new_cases: None,
            new_case_mean_party: Some(party_mean),
            new_case_total: Some(total),
            after_policy: false,
            new_case_after: None,
        }
    }

    #[test]
    fn points_are_deduplicated_sorted_and_windowed() {
        let rows = vec![
            row(d(2020, 5, 2), "republican", 12.0, 4.0),
            row(d(2020, 5, 2), "democrat", 12.0, 20.0),
            row(d(2020, 5, 1), "democrat", 6.0, 6.0),
            row(d(2020, 5, 2), "democrat", 12.0, 20.0),
            row(d(2020, 3, 1), "democrat", 99.0, 99.0),
        ];
        let ts = timeseries_points(&rows, &(d(2020, 4, 1), d(2020, 11, 30)));
        assert_eq!(ts.totals, vec![(d(2020, 5, 1), 6.0), (d(2020, 5, 2), 12.0)]);
        assert_eq!(
            ts.by_party["democrat"],
            vec![(d(2020, 5, 1), 6.0), (d(2020, 5, 2), 20.0)]
        );
        assert_eq!(ts.by_party["republican"], vec![(d(2020, 5, 2), 4.0)]);
    }

    #[test]
    fn legend_heading_comes_first() {
        let rows = vec![
            row(d(2020, 5, 2), "republican", 12.0, 4.0),
            row(d(2020, 5, 2), "democrat", 12.0, 20.0),
        ];
        let ts = timeseries_points(&rows, &(d(2020, 4, 1), d(2020, 11, 30)));
        assert_eq!(
            legend_labels(&ts),
            vec!["Political Party", "democrat", "republican"]
        );
        assert_eq!(legend_labels(&TimeSeries::default()), vec!["Political Party"]);
    }

    /// Needs a system sans-serif font.
    #[test]
    #[ignore]
    fn renders_png() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("average_by_party.png");
        let rows = vec![
            row(d(2020, 5, 1), "democrat", 6.0, 6.0),
            row(d(2020, 5, 2), "republican", 12.0, 4.0),
        ];
        render_timeseries(&rows, (d(2020, 4, 1), d(2020, 11, 30)), &path)?;
        assert!(path.metadata()?.len() > 0);
        Ok(())
    }
}
