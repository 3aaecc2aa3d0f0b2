use anyhow::{Context, Result};
use plotters::prelude::*;
use std::{collections::BTreeSet, fs, path::Path};
use tracing::{info, warn};

use super::{bar_color, value_range};
use crate::process::{
    aggregate::{top_states_after_policy, StateAverage},
    records::{AnalysisRecord, Party},
};

/// Party buckets present among `bars`, in legend order.
pub fn legend_parties(bars: &[StateAverage]) -> Vec<Party> {
    let present: BTreeSet<Party> = bars
        .iter()
        .map(|b| Party::from_label(b.party.as_deref()))
        .collect();
    // the two main parties always get a legend entry
    let mut out = vec![Party::Republican, Party::Democrat];
    if present.contains(&Party::Other) {
        out.push(Party::Other);
    }
    out
}

/// Horizontal bars of the `n` states with the highest mean new cases after
/// reopening, highest at the top, colored by party.
#[tracing::instrument(level = "info", skip(rows), fields(path = %path.display()))]
pub fn render_top_states(rows: &[AnalysisRecord], n: usize, path: &Path) -> Result<()> {
    let bars = top_states_after_policy(rows, n);
    if bars.is_empty() {
        // a chart from an earlier run must not pass for this one
        if path.exists() {
            fs::remove_file(path).with_context(|| format!("removing stale {:?}", path))?;
        }
        warn!(path = %path.display(), "no state has data after its policy date; no chart written");
        return Ok(());
    }
    let count = bars.len() as i32;

    let root = BitMapBackend::new(path, (1500, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let caption = format!(
        "Average Number of New Cases of {} States with Highest Cases after Reopening",
        bars.len()
    );
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(170)
        .build_cartesian_2d(
            value_range(bars.iter().map(|b| b.new_case_after)),
            (0..count).into_segmented(),
        )?;

    // row 0 is drawn at the top
    let name_at = |seg: &SegmentValue<i32>| match seg {
        SegmentValue::CenterOf(y) if (0..count).contains(y) => {
            bars[(count - 1 - y) as usize].state_name.clone()
        }
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Total Cases")
        .y_desc("State")
        .axis_desc_style(("sans-serif", 22))
        .y_labels(bars.len())
        .y_label_formatter(&name_at)
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, b)| {
        let y = count - 1 - i as i32;
        let color = bar_color(Party::from_label(b.party.as_deref()));
        let mut bar = Rectangle::new(
            [
                (0.0, SegmentValue::Exact(y)),
                (b.new_case_after, SegmentValue::Exact(y + 1)),
            ],
            color.filled(),
        );
        bar.set_margin(3, 3, 0, 0);
        bar
    }))?;

    for party in legend_parties(&bars) {
        let color = bar_color(party);
        chart
            .draw_series(std::iter::empty::<Rectangle<(f64, SegmentValue<i32>)>>())?
            .label(party.name())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 16, y + 6)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 18))
        .draw()?;

    root.present()?;
    info!(states = bars.len(), "top states chart saved");
    Ok(())
}
