use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, GridMark, Line, Plot, PlotPoints, Points, uniform_grid_spacer};

use super::format::prettify;
use crate::color::{ColorScale, DARK_RED};
use crate::data::aggregate::{most_sales, sales_by_date};
use crate::state::{AppState, DistributionTab};

/// Axis labels for categorical bars placed at 0, 1, 2, …
fn category_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Nation row
// ---------------------------------------------------------------------------

/// Horizontal bars of sale counts for the busiest states.
pub fn most_sales_chart(ui: &mut Ui, state: &AppState) {
    ui.strong("Most Sales");
    let Some(ds) = &state.dataset else {
        return;
    };
    let top = most_sales(&ds.regions, state.most_sales_threshold);
    if top.is_empty() {
        ui.label(format!("No state has more than {} sales.", state.most_sales_threshold));
        return;
    }

    let scale = ColorScale::from_values(top.iter().map(|r| r.sale_count as f64));
    let bars: Vec<Bar> = top
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let fill = scale.map_or(DARK_RED, |s| s.color_for(r.sale_count as f64));
            Bar::new(i as f64, r.sale_count as f64)
                .name(&r.state)
                .fill(fill)
                .width(0.7)
        })
        .collect();
    let labels: Vec<String> = top.iter().map(|r| r.state.clone()).collect();

    Plot::new("most_sales")
        .height(280.0)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .x_axis_label("Sale Count")
        .y_axis_formatter(category_formatter(labels))
        .y_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });
}

/// Average sale price per state, cheapest first.
pub fn average_price_chart(ui: &mut Ui, state: &AppState) {
    ui.strong("Average house price");
    let Some(ds) = &state.dataset else {
        return;
    };

    let scale = ColorScale::from_values(ds.regions.iter().map(|r| r.average_price));
    let bars: Vec<Bar> = ds
        .regions
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let fill = scale.map_or(DARK_RED, |s| s.color_for(r.average_price));
            Bar::new(i as f64, r.average_price)
                .name(format!("{}: ${}", r.state, prettify(r.average_price)))
                .fill(fill)
                .width(0.8)
        })
        .collect();
    let labels: Vec<String> = ds.regions.iter().map(|r| r.state.clone()).collect();

    Plot::new("average_price")
        .height(280.0)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .x_axis_formatter(category_formatter(labels))
        .x_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .y_axis_formatter(|mark, _range| format!("${}", prettify(mark.value)))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

// ---------------------------------------------------------------------------
// University row
// ---------------------------------------------------------------------------

/// Summed sale amount by beds, baths, size or age over the unfiltered
/// university subset.
pub fn distribution_chart(ui: &mut Ui, state: &AppState) {
    let Some(sel) = &state.selection else {
        return;
    };
    let dist = &sel.distributions;
    let (bins, x_label) = match state.distribution_tab {
        DistributionTab::Beds => (&dist.beds, "Beds"),
        DistributionTab::Baths => (&dist.baths, "Baths"),
        DistributionTab::Size => (&dist.sqft, "Sqft_home"),
        DistributionTab::Age => (&dist.age, "Age_at_sale"),
    };

    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| {
            Bar::new(b.center(), b.total)
                .width(b.width() * 0.95)
                .fill(DARK_RED)
        })
        .collect();

    Plot::new("distribution")
        .height(350.0)
        .x_axis_label(x_label)
        .y_axis_label("sum of Sale_amount")
        .y_axis_formatter(|mark, _range| prettify(mark.value))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(DARK_RED));
        });
}

/// Summed sale amount per day over the filtered view.
pub fn sales_by_date_chart(ui: &mut Ui, state: &AppState) {
    let series = sales_by_date(state.visible_records());
    if series.is_empty() {
        ui.label("No listings match the current filters.");
        return;
    }
    let points: PlotPoints = series
        .iter()
        .map(|(date, total)| [date.num_days_from_ce() as f64, *total])
        .collect();

    Plot::new("sales_by_date")
        .height(380.0)
        .x_axis_label("Sale_date")
        .y_axis_label("Sale_amount")
        .x_axis_formatter(|mark, _range| {
            NaiveDate::from_num_days_from_ce_opt(mark.value.round() as i32)
                .map(|d| d.format("%b %Y").to_string())
                .unwrap_or_default()
        })
        .y_axis_formatter(|mark, _range| prettify(mark.value))
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).color(DARK_RED).width(1.5));
        });
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Single marker at the geocoded town. Omitted when the lookup failed.
pub fn location_map(ui: &mut Ui, state: &AppState) {
    let (Some(Ok(loc)), Some(sel)) = (&state.location, &state.selection) else {
        return;
    };
    let marker = Points::new(vec![[loc.longitude, loc.latitude]])
        .radius(6.0)
        .color(DARK_RED)
        .name(&sel.university);

    Plot::new("location_map")
        .height(200.0)
        .data_aspect(1.0)
        .include_x(loc.longitude - 2.0)
        .include_x(loc.longitude + 2.0)
        .include_y(loc.latitude - 1.5)
        .include_y(loc.latitude + 1.5)
        .x_axis_label("longitude")
        .y_axis_label("latitude")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.points(marker);
        });
}
