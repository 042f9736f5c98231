//! Inventory reports panel with period filters and PDF/Excel export.

use chrono::{Duration, Local};
use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_phosphor::regular::{FILE_PDF, FILE_XLS, MAGNIFYING_GLASS};

use crate::calendar::{flexible_date, month_label, week_label};
use crate::export::ExportFormat;
use crate::reports::{Cell, PeriodKind, ReportKind};

use super::app::App;
use super::components::{back_button, panel_header, primary_button_with_icon, styled_button, styled_button_with_icon};

/// Show the reports panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);

    panel_header(ui, "Reportes");

    // Report kind selector
    ui.horizontal_wrapped(|ui| {
        ui.label("Reporte:");
        ui.add_space(10.0);

        for kind in ReportKind::ALL {
            if ui
                .selectable_label(app.report_filter.kind == kind, kind.label())
                .clicked()
                && app.report_filter.kind != kind
            {
                app.report_filter.kind = kind;
                app.report_filter.preview = None;
            }
        }
    });

    ui.add_space(10.0);

    let period = app.report_filter.kind.period();
    if period != PeriodKind::None {
        ui.horizontal(|ui| {
            ui.label("Fecha:");
            let valid = flexible_date(&app.report_filter.date_input).is_ok();
            let response = ui.add(
                egui::TextEdit::singleline(&mut app.report_filter.date_input)
                    .desired_width(100.0)
                    .hint_text("YYYY-MM-DD")
                    .text_color(if valid {
                        ui.visuals().text_color()
                    } else {
                        egui::Color32::from_rgb(220, 50, 50)
                    }),
            );
            if response.changed()
                && let Ok(date) = flexible_date(&app.report_filter.date_input)
            {
                app.report_filter.date = date;
                app.report_filter.preview = None;
            }
            // On focus lost, normalize to YYYY-MM-DD format or reset if invalid
            if response.lost_focus() {
                let date = flexible_date(&app.report_filter.date_input).unwrap_or(app.report_filter.date);
                app.report_filter.set_date(date);
            }

            let mut picked = app.report_filter.date;
            if ui
                .add(egui_extras::DatePickerButton::new(&mut picked).id_salt("report_date_picker"))
                .changed()
            {
                app.report_filter.set_date(picked);
            }

            ui.add_space(20.0);

            let today = Local::now().date_naive();
            match period {
                PeriodKind::Week => {
                    if styled_button(ui, "Esta semana").clicked() {
                        app.report_filter.set_date(today);
                    }
                    if styled_button(ui, "Semana anterior").clicked() {
                        app.report_filter.set_date(today - Duration::days(7));
                    }
                }
                PeriodKind::Month => {
                    if styled_button(ui, "Este mes").clicked() {
                        app.report_filter.set_date(today);
                    }
                    if styled_button(ui, "Mes anterior").clicked() {
                        let previous = crate::calendar::month_range(today).0 - Duration::days(1);
                        app.report_filter.set_date(previous);
                    }
                }
                PeriodKind::None => {}
            }
        });

        ui.label(RichText::new("Acepta: YYYY-MM-DD, YYYY/M/D, DD/MM/YYYY").small().weak());

        let label = match period {
            PeriodKind::Week => week_label(app.report_filter.date),
            _ => month_label(app.report_filter.date),
        };
        ui.label(RichText::new(label).strong());
        ui.add_space(10.0);
    }

    // Actions
    ui.horizontal(|ui| {
        ui.add_enabled_ui(!app.busy.preview, |ui| {
            if primary_button_with_icon(ui, MAGNIFYING_GLASS, "Ver reporte").clicked() {
                app.preview_report();
            }
        });

        ui.add_space(20.0);

        let exporting = app.busy.export;
        ui.add_enabled_ui(exporting.is_none(), |ui| {
            if styled_button_with_icon(ui, FILE_PDF, "Exportar PDF").clicked() {
                app.export_report(ExportFormat::Pdf);
            }
            ui.add_space(10.0);
            if styled_button_with_icon(ui, FILE_XLS, "Exportar Excel").clicked() {
                app.export_report(ExportFormat::Xlsx);
            }
        });

        if let Some(format) = exporting {
            ui.spinner();
            ui.label(format!("Generando {}...", format.label()));
        } else if app.busy.preview {
            ui.spinner();
        }
    });

    ui.add_space(15.0);
    ui.separator();
    ui.add_space(10.0);

    show_preview(app, ui);

    go_back
}

fn show_preview(app: &App, ui: &mut Ui) {
    let Some(table) = &app.report_filter.preview else {
        ui.label("Pulsa 'Ver reporte' para cargar los datos.");
        return;
    };

    ui.label(RichText::new(&table.title).strong());
    ui.label(RichText::new(format!("{} registros", table.len())).small().weak());
    ui.add_space(10.0);

    ScrollArea::both().show(ui, |ui| {
        egui::Grid::new("report_preview_grid")
            .num_columns(table.headers.len())
            .striped(true)
            .min_col_width(80.0)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                for header in &table.headers {
                    ui.strong(header);
                }
                ui.end_row();

                for row in &table.rows {
                    for cell in row {
                        match cell {
                            Cell::Int(n) => ui.label(n.to_string()),
                            Cell::Text(text) => ui.label(text),
                        };
                    }
                    ui.end_row();
                }

                if table.is_empty() {
                    ui.label("No hay productos para este reporte.");
                    ui.end_row();
                }
            });

        if let Some(footer) = &table.footer {
            ui.add_space(10.0);
            ui.label(RichText::new(footer).small().weak());
        }
    });
}
