use eframe::egui::{self, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct HousePricesApp {
    pub state: AppState,
}

impl HousePricesApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for HousePricesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: university, filters, metrics ----
        egui::SidePanel::left("selection_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: nation row, then university row ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.dataset.is_none() {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading("Open a file to view house sales  (File → Open…)");
                });
                return;
            }

            let state = &mut self.state;
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    ui.group(|ui: &mut Ui| {
                        ui.columns(3, |cols: &mut [Ui]| {
                            plot::most_sales_chart(&mut cols[0], state);
                            plot::average_price_chart(&mut cols[1], state);
                            table::region_table(&mut cols[2], state);
                        });
                    });
                    ui.add_space(8.0);

                    if state.selection.is_none() {
                        ui.label("No data available for the selected university.");
                        return;
                    }
                    ui.columns(2, |cols: &mut [Ui]| {
                        table::listing_table(&mut cols[0], state);
                        panels::university_tabs(&mut cols[1], state);
                    });
                });
        });
    }
}
