use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use super::format::{delta, dollars_cents, prettify};
use super::plot;
use crate::data::aggregate::Metric;
use crate::data::filter::{Domain, RangeFilter};
use crate::state::{AppState, DistributionTab, UniversityTab};

// ---------------------------------------------------------------------------
// Left side panel – university selection, filters, local metrics
// ---------------------------------------------------------------------------

/// Render the left selection panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("US College House Prices Dashboard");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };
    let universities = dataset.universities.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- University selector ----
            ui.strong("Select a university");
            let current = state
                .selection
                .as_ref()
                .map(|s| s.university.clone())
                .unwrap_or_default();
            let mut chosen: Option<String> = None;
            egui::ComboBox::from_id_salt("university")
                .selected_text(&current)
                .width(ui.available_width())
                .show_ui(ui, |ui: &mut Ui| {
                    for university in &universities {
                        if ui
                            .selectable_label(current == *university, university)
                            .clicked()
                        {
                            chosen = Some(university.clone());
                        }
                    }
                });
            if let Some(university) = chosen {
                if university != current {
                    state.select_university(&university);
                }
            }

            if let Some(msg) = &state.status_message {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            ui.separator();

            filter_section(ui, state);
            ui.add_space(8.0);
            metrics_section(ui, state);
            ui.add_space(8.0);
            plot::location_map(ui, state);
        });
}

fn filter_section(ui: &mut Ui, state: &mut AppState) {
    let mut reset = false;
    let Some(sel) = &mut state.selection else {
        return;
    };

    egui::CollapsingHeader::new(RichText::new("Filters").strong())
        .id_salt("filters")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            range_slider(ui, "Price Range (in $)", &sel.domains.price, &mut sel.filters.price, |v| {
                format!("${}", prettify(v))
            });
            range_slider(ui, "House Age (in years)", &sel.domains.age, &mut sel.filters.age, |v| v.to_string());
            range_slider(ui, "Beds", &sel.domains.beds, &mut sel.filters.beds, |v| v.to_string());
            range_slider(ui, "Baths", &sel.domains.baths, &mut sel.filters.baths, |v| v.to_string());
            range_slider(ui, "House Size (in sq.ft)", &sel.domains.sqft, &mut sel.filters.sqft, prettify);
            if ui.small_button("Reset").clicked() {
                reset = true;
            }
        });

    if reset {
        state.reset_filters();
    } else {
        // Memoized: only recomputes when a range actually moved.
        state.refilter();
    }
}

/// Two sliders over the observed values of a column, like a select-slider.
fn range_slider<T: PartialOrd + Copy>(
    ui: &mut Ui,
    label: &str,
    domain: &Domain<T>,
    range: &mut RangeFilter<T>,
    fmt: impl Fn(T) -> String,
) {
    let values = domain.values();
    let Some(last) = values.len().checked_sub(1) else {
        return;
    };
    let mut lo = domain.position(range.min);
    let mut hi = domain.position(range.max);

    ui.label(label);
    let lo_changed = ui
        .add(egui::Slider::new(&mut lo, 0..=last).show_value(false).text("from"))
        .changed();
    let hi_changed = ui
        .add(egui::Slider::new(&mut hi, 0..=last).show_value(false).text("to"))
        .changed();
    if lo_changed && lo > hi {
        hi = lo;
    }
    if hi_changed && hi < lo {
        lo = hi;
    }
    if lo_changed || hi_changed {
        *range = RangeFilter::new(values[lo], values[hi]);
    }
    ui.small(format!("{} – {}", fmt(range.min), fmt(range.max)));
    ui.add_space(4.0);
}

fn metrics_section(ui: &mut Ui, state: &AppState) {
    let (Some(town), Some(cmp)) = (state.selected_town(), &state.comparison) else {
        return;
    };
    ui.heading(format!("Average metrics in {town}"));
    metric(ui, "House Price", cmp.price, |v| format!("${}", prettify(v)));
    metric(ui, "House Size", cmp.sqft, |v| format!("{} sq.ft.", prettify(v)));
    metric(ui, "Price per Sq.Ft.", cmp.price_per_sqft, |v| format!("${}", prettify(v)));
}

fn metric(ui: &mut Ui, label: &str, metric: Option<Metric>, fmt: impl Fn(f64) -> String) {
    ui.label(label);
    match metric {
        Some(m) => {
            ui.label(RichText::new(fmt(m.value)).size(22.0).strong());
            if let Some(d) = m.delta {
                let color = if d < 0.0 { Color32::RED } else { Color32::DARK_GREEN };
                ui.label(RichText::new(delta(d)).color(color));
            }
        }
        None => {
            ui.label(RichText::new("no data").italics());
        }
    }
    ui.add_space(4.0);
}

// ---------------------------------------------------------------------------
// University tabs – distribution, sales by date, price estimate
// ---------------------------------------------------------------------------

pub fn university_tabs(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.selectable_value(&mut state.university_tab, UniversityTab::Distribution, "Sales Distribution");
        ui.selectable_value(&mut state.university_tab, UniversityTab::ByDate, "Sales by date");
        ui.selectable_value(&mut state.university_tab, UniversityTab::Estimate, "Price estimate");
    });
    ui.separator();

    match state.university_tab {
        UniversityTab::Distribution => {
            ui.horizontal(|ui: &mut Ui| {
                ui.selectable_value(&mut state.distribution_tab, DistributionTab::Beds, "with Beds");
                ui.selectable_value(&mut state.distribution_tab, DistributionTab::Baths, "with Baths");
                ui.selectable_value(&mut state.distribution_tab, DistributionTab::Size, "with Size");
                ui.selectable_value(&mut state.distribution_tab, DistributionTab::Age, "with Age of house");
            });
            plot::distribution_chart(ui, state);
        }
        UniversityTab::ByDate => plot::sales_by_date_chart(ui, state),
        UniversityTab::Estimate => estimate_tab(ui, state),
    }
}

fn estimate_tab(ui: &mut Ui, state: &mut AppState) {
    ui.label("Input values to predict the price");
    let form = &mut state.estimate_form;
    ui.columns(2, |cols: &mut [Ui]| {
        cols[0].label("Number of Beds");
        cols[0].text_edit_singleline(&mut form.beds);
        cols[0].label("Number of Baths");
        cols[0].text_edit_singleline(&mut form.baths);
        cols[1].label("Square Footage of Home");
        cols[1].text_edit_singleline(&mut form.sqft_home);
        cols[1].label("Age of Home at Sale");
        cols[1].text_edit_singleline(&mut form.age_at_sale);
    });
    ui.add_space(4.0);

    if ui.button("Estimate Sale Amount").clicked() {
        state.run_estimate();
    }

    match &state.estimate {
        Some(Ok(estimate)) => {
            ui.label(format!("Estimated Sale Amount: {}", dollars_cents(estimate.price)));
            ui.small(format!(
                "Trained on {} sales near {}",
                estimate.training_size, estimate.university
            ));
        }
        Some(Err(e)) => {
            ui.label(RichText::new(e.user_message()).color(Color32::RED));
        }
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} sales loaded, {} universities, {} states",
                ds.len(),
                ds.universities.len(),
                ds.regions.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open house sales")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => state.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
