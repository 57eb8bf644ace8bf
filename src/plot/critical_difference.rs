//! Critical-difference diagram of a comparison report.

use std::error::Error;
use std::path::Path;

use analizar_common::Result;
use plotters::prelude::*;

use super::{axis_range, ensure_parent, plot_error, PlotStyle};
use crate::compare::ComparisonReport;

/// Maximal runs of rank-adjacent treatments that are pairwise not
/// significantly different, as inclusive index ranges into `ranking`.
///
/// `ranking` must be sorted best first. A pair without a p-value counts as
/// different.
pub fn cliques<F>(ranking: &[(String, f64)], p_value: F, alpha: f64) -> Vec<(usize, usize)>
where
    F: Fn(&str, &str) -> Option<f64>,
{
    let joined = |a: usize, b: usize| {
        p_value(ranking[a].0.as_str(), ranking[b].0.as_str()).is_some_and(|p| p >= alpha)
    };

    let mut result: Vec<(usize, usize)> = Vec::new();
    let mut end = 0;
    for start in 0..ranking.len() {
        end = end.max(start);
        while end + 1 < ranking.len() && (start..=end).all(|i| joined(i, end + 1)) {
            end += 1;
        }
        let contained = result.last().is_some_and(|&(_, last_end)| last_end >= end);
        if end > start && !contained {
            result.push((start, end));
        }
    }
    result
}

/// Draw the ranking of `report`; nothing is written when the post-hoc
/// analysis was skipped.
pub fn render_critical_difference(
    path: &Path,
    report: &ComparisonReport,
    alpha: f64,
    style: PlotStyle,
) -> Result<()> {
    let Some(ranking) = report.ranking() else {
        return Ok(());
    };
    let Some(x_range) = axis_range(ranking.iter().map(|(_, r)| *r)) else {
        return Ok(());
    };
    let groups = cliques(&ranking, |a, b| report.p_value_between(a, b), alpha);
    ensure_parent(path)?;
    draw(path, &report.scope, &ranking, &groups, x_range, style).map_err(plot_error)
}

fn draw(
    path: &Path,
    scope: &str,
    ranking: &[(String, f64)],
    groups: &[(usize, usize)],
    x_range: std::ops::Range<f64>,
    style: PlotStyle,
) -> std::result::Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, style.size()).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Average ranks ({scope})"), ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .build_cartesian_2d(x_range, 0.0..1.0)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .disable_y_axis()
        .x_desc("Average rank")
        .draw()?;

    // Clique bars sit just below the top; treatment rows fill the rest.
    let top = 0.95;
    let bar_step = 0.04;
    for (n, &(first, last)) in groups.iter().enumerate() {
        let y = top - bar_step * (n + 1) as f64;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(ranking[first].1, y), (ranking[last].1, y)],
            BLACK.stroke_width(4),
        )))?;
    }

    let rows_top = top - bar_step * (groups.len() + 1) as f64;
    let row_step = rows_top / (ranking.len() + 1) as f64;
    let font = ("sans-serif", 16).into_font();
    for (i, (name, rank)) in ranking.iter().enumerate() {
        let y = rows_top - row_step * (i + 1) as f64;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(*rank, top), (*rank, y)],
            BLACK.stroke_width(1),
        )))?;
        chart.draw_series(std::iter::once(Circle::new((*rank, y), 4, BLACK.filled())))?;
        chart.draw_series(std::iter::once(Text::new(
            format!("{name} ({rank:.3})"),
            (*rank, y),
            font.clone(),
        )))?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::ComparisonScope;
    use std::collections::{BTreeMap, HashSet};

    fn ranking(names: &[&str]) -> Vec<(String, f64)> {
        names.iter().enumerate().map(|(i, n)| (n.to_string(), (i + 1) as f64 / 10.0)).collect()
    }

    fn similar(pairs: &[(&str, &str)]) -> impl Fn(&str, &str) -> Option<f64> {
        let set: HashSet<(String, String)> = pairs
            .iter()
            .flat_map(|&(a, b)| [(a.to_string(), b.to_string()), (b.to_string(), a.to_string())])
            .collect();
        move |a: &str, b: &str| {
            Some(if set.contains(&(a.to_string(), b.to_string())) { 0.5 } else { 0.001 })
        }
    }

    #[test]
    fn test_cliques_chain() {
        let ranking = ranking(&["A", "B", "C", "D"]);
        let pairs = [("A", "B"), ("B", "C"), ("A", "C"), ("C", "D")];
        let groups = cliques(&ranking, similar(&pairs), 0.05);
        assert_eq!(groups, vec![(0, 2), (2, 3)]);
    }

    #[test]
    fn test_no_cliques_when_all_differ() {
        let ranking = ranking(&["A", "B", "C"]);
        assert!(cliques(&ranking, similar(&[]), 0.05).is_empty());
        assert!(cliques(&ranking, |_, _| None, 0.05).is_empty());
    }

    #[test]
    fn test_single_clique_when_all_similar() {
        let ranking = ranking(&["A", "B", "C"]);
        assert_eq!(cliques(&ranking, |_, _| Some(0.9), 0.05), vec![(0, 2)]);
    }

    #[test]
    fn test_nested_run_not_repeated() {
        let ranking = ranking(&["A", "B", "C", "D"]);
        let groups = cliques(&ranking, similar(&[("A", "B"), ("B", "C"), ("A", "C")]), 0.05);
        assert_eq!(groups, vec![(0, 2)]);
    }

    #[test]
    fn test_render_writes_png() {
        let names = ["PSO", "SHADE", "PSORR"];
        let mut report = ComparisonReport::new(&ComparisonScope::Global, 8.4, 0.015, true);
        report.average_ranks = Some(
            names.iter().zip([0.9, 0.6, 0.5]).map(|(n, r)| (n.to_string(), r)).collect(),
        );
        let nemenyi: BTreeMap<String, BTreeMap<String, f64>> = names
            .iter()
            .map(|&a| {
                let row = names
                    .iter()
                    .map(|&b| (b.to_string(), if a == "PSO" && a != b { 0.01 } else { 0.8 }))
                    .collect();
                (a.to_string(), row)
            })
            .collect();
        report.nemenyi = Some(nemenyi);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comparison/d10/critical_difference_d10.png");
        let style = PlotStyle { width: 320, height: 240 };
        render_critical_difference(&path, &report, 0.05, style).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);

        report.average_ranks = None;
        let skipped = dir.path().join("skipped.png");
        render_critical_difference(&skipped, &report, 0.05, style).unwrap();
        assert!(!skipped.exists());
    }
}
