use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use super::format::{prettify, sale_date};
use crate::state::AppState;

const ROW_HEIGHT: f32 = 20.0;

/// Per-state price per square foot, ordered like the region summaries.
pub fn region_table(ui: &mut Ui, state: &AppState) {
    let Some(ds) = &state.dataset else {
        return;
    };
    let max = ds
        .regions
        .iter()
        .filter_map(|r| r.average_price_per_sqft)
        .fold(0.0_f64, f64::max);

    ui.push_id("region_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .max_scroll_height(280.0)
            .column(Column::auto().at_least(50.0))
            .column(Column::remainder())
            .header(ROW_HEIGHT, |mut header| {
                header.col(|ui| {
                    ui.strong("States");
                });
                header.col(|ui| {
                    ui.strong("Price per square foot");
                });
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, ds.regions.len(), |mut row| {
                    let region = &ds.regions[row.index()];
                    row.col(|ui| {
                        ui.label(&region.state);
                    });
                    row.col(|ui| match region.average_price_per_sqft {
                        Some(p) => {
                            let fraction = if max > 0.0 { (p / max) as f32 } else { 0.0 };
                            ui.add(egui::ProgressBar::new(fraction).text(format!("${p:.2}")));
                        }
                        None => {
                            ui.label(RichText::new("no data").italics());
                        }
                    });
                });
            });
    });
}

/// Filtered listings of the selected university.
pub fn listing_table(ui: &mut Ui, state: &AppState) {
    let records = state.visible_records();
    ui.small(format!("{} listings found", records.len()));

    ui.push_id("listing_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .max_scroll_height(460.0)
            .column(Column::auto().at_least(90.0))
            .column(Column::auto().at_least(80.0))
            .column(Column::auto().at_least(80.0))
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::remainder())
            .header(ROW_HEIGHT, |mut header| {
                for title in ["Sale Date", "Sale price", "Size", "Beds", "Baths", "Property age"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, records.len(), |mut row| {
                    let rec = records[row.index()];
                    row.col(|ui| {
                        ui.label(sale_date(rec.sale_date));
                    });
                    row.col(|ui| {
                        ui.label(format!("${}", prettify(rec.sale_amount)));
                    });
                    row.col(|ui| {
                        ui.label(format!("{} sq.ft.", prettify(rec.sqft_home)));
                    });
                    row.col(|ui| {
                        ui.label(rec.beds.to_string());
                    });
                    row.col(|ui| {
                        ui.label(rec.baths.to_string());
                    });
                    row.col(|ui| {
                        ui.label(format!("{} years", rec.age_at_sale));
                    });
                });
            });
    });
}
