use std::fs;
use std::path::Path;
use plotters::prelude::*;
use crate::budget::evaluate;
use crate::goal_seek::{solve, SearchRequest, SeekSettings};
use crate::scenarios::get_case_catalog;
use crate::utils;

const CURVE_POINTS: usize = 200;

/// Total campaign cost as a function of the targeted ad's spend, sampled over [0, approved ceiling]
pub fn cost_curve(request: &SearchRequest, points: usize) -> Vec<(f64, f64)> {
    let mut spends = request.spends.clone();
    let step = request.approved_ceiling / points.max(1) as f64;
    (0..=points)
        .map(|i| {
            let spend = i as f64 * step;
            spends[request.target_index] = spend;
            (spend, evaluate(&spends, request.fees))
        })
        .collect()
}

/// Render the cost curve of the first catalog case to charts/cost_curve.png
pub fn generate_cost_curve_chart(settings: SeekSettings) -> Result<(), Box<dyn std::error::Error>> {
    let case = get_case_catalog()
        .into_iter()
        .next()
        .ok_or("Case catalog is empty")?;
    let request = case.request(settings);

    fs::create_dir_all("charts")?;
    render_cost_curve(&request, Path::new("charts/cost_curve.png"), case.short_name)
}

/// Plot total cost against the targeted ad's spend, with the approved ceiling and the solved maximum
pub fn render_cost_curve(request: &SearchRequest, path: &Path, title: &str) -> Result<(), Box<dyn std::error::Error>> {
    request.validate()?;
    let max_spend = solve(request)?;
    let curve = cost_curve(request, CURVE_POINTS);

    let x_max = request.approved_ceiling.max(1.0);
    let y_min = curve.iter().map(|&(_, cost)| cost).fold(f64::INFINITY, f64::min).min(request.approved_ceiling);
    let y_max = curve.iter().map(|&(_, cost)| cost).fold(f64::NEG_INFINITY, f64::max).max(request.approved_ceiling);
    let y_pad = ((y_max - y_min) * 0.05).max(1.0);

    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Total cost vs spend of ad {} ({})", utils::ad_label(request.target_index), title), ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..x_max, (y_min - y_pad)..(y_max + y_pad))?;

    chart.configure_mesh()
        .x_desc("Ad spend")
        .y_desc("Total campaign cost")
        .draw()?;

    chart.draw_series(LineSeries::new(curve, &BLUE))?
        .label("Total cost")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart.draw_series(std::iter::once(PathElement::new(
        vec![(0.0, request.approved_ceiling), (x_max, request.approved_ceiling)],
        &RED,
    )))?
    .label(format!("Approved budget: {:.2}", request.approved_ceiling))
    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    let mut spends = request.spends.clone();
    spends[request.target_index] = max_spend;
    let cost_at_max = evaluate(&spends, request.fees);
    chart.draw_series(std::iter::once(Circle::new((max_spend, cost_at_max), 5, BLACK.filled())))?
        .label(format!("Max spend: {:.2}", max_spend))
        .legend(|(x, y)| Circle::new((x + 10, y), 4, BLACK.filled()));

    chart.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;

    println!("Cost curve saved to {}", path.display());
    println!("Max spend for ad {}: {:.2}", utils::ad_label(request.target_index), max_spend);

    Ok(())
}
