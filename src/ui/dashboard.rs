//! Dashboard panel with availability summary, charts and navigation cards.

use eframe::egui::{self, CornerRadius, Margin, ProgressBar, RichText, Ui};
use egui_phosphor::regular::{ARROWS_CLOCKWISE, CHART_BAR, PACKAGE, PLUS_CIRCLE, USER_CIRCLE};

use crate::models::Disponibilidad;
use crate::stats::{DisponibilidadSummary, estado_distribution, top_by_stock};

use super::app::{App, Panel};
use super::components::{dashboard_card, disponibilidad_color, styled_button_with_icon};

const TOP_STOCK: usize = 5;

/// Show the dashboard panel.
///
/// Returns `Some(panel)` if navigation is requested.
pub fn show(app: &mut App, ui: &mut Ui) -> Option<Panel> {
    let mut next_panel = None;

    ui.vertical_centered(|ui| {
        ui.add_space(20.0);

        let saludo = app
            .perfil
            .as_ref()
            .map(|p| format!("Hola, {}", p.display_name()))
            .unwrap_or_else(|| "Nexa Inventario".to_string());
        ui.label(RichText::new(saludo).size(28.0).strong());
        ui.add_space(5.0);
        ui.label(RichText::new("Resumen del inventario").size(14.0).weak());

        ui.add_space(20.0);

        // Availability cards
        let summary = DisponibilidadSummary::from_productos(&app.productos);
        ui.horizontal(|ui| {
            let available = ui.available_width();
            let start_offset = ((available - 4.0 * 190.0) / 2.0).max(0.0);
            ui.add_space(start_offset);

            for tier in Disponibilidad::ALL {
                stat_card(ui, tier, summary.count(tier), summary.total());
            }
        });

        ui.add_space(20.0);

        // Navigation cards row
        let available = ui.available_width();
        let num_cards = 4.0;
        let spacing = 30.0;
        let total_spacing = spacing * (num_cards - 1.0);
        let card_width = ((available - total_spacing) / num_cards).clamp(150.0, 230.0);
        let card_size = egui::vec2(card_width, card_width * 0.7);
        let total_width = card_width * num_cards + total_spacing;
        let start_offset = ((available - total_width) / 2.0).max(0.0);

        ui.horizontal(|ui| {
            ui.add_space(start_offset);

            if dashboard_card(ui, "Productos", "Buscar y editar", PACKAGE, card_size).clicked() {
                next_panel = Some(Panel::Products);
            }
            ui.add_space(spacing);

            if dashboard_card(ui, "Registrar", "Código, foto y stock", PLUS_CIRCLE, card_size).clicked() {
                next_panel = Some(Panel::Register);
            }
            ui.add_space(spacing);

            if dashboard_card(ui, "Reportes", "PDF y Excel", CHART_BAR, card_size).clicked() {
                next_panel = Some(Panel::Reports);
            }
            ui.add_space(spacing);

            if dashboard_card(ui, "Perfil", "Tus datos", USER_CIRCLE, card_size).clicked() {
                next_panel = Some(Panel::Profile);
            }
        });

        ui.add_space(20.0);
    });

    // Two-column layout: condition distribution | top stock
    let column_width = (ui.available_width() - 40.0) / 2.0;

    ui.horizontal(|ui| {
        ui.add_space(10.0);

        ui.vertical(|ui| {
            ui.set_width(column_width);
            section_frame(ui, column_width, |ui| {
                ui.label(RichText::new("Productos por estado").strong());
                ui.add_space(10.0);

                let shares = estado_distribution(&app.productos);
                if shares.is_empty() {
                    ui.label(RichText::new("Sin productos registrados").weak());
                }
                for share in shares {
                    ui.horizontal(|ui| {
                        ui.add_sized([110.0, 18.0], egui::Label::new(&share.estado));
                        ui.add(
                            ProgressBar::new((share.porcentaje / 100.0) as f32)
                                .desired_width(column_width - 180.0)
                                .text(format!("{} ({:.0}%)", share.cantidad, share.porcentaje)),
                        );
                    });
                }
            });
        });

        ui.add_space(20.0);

        ui.vertical(|ui| {
            ui.set_width(column_width);
            section_frame(ui, column_width, |ui| {
                ui.label(RichText::new(format!("Top {TOP_STOCK} por stock")).strong());
                ui.add_space(10.0);

                let top = top_by_stock(&app.productos, TOP_STOCK);
                let max = top.first().map(|p| p.cantidad.max(1)).unwrap_or(1);
                if top.is_empty() {
                    ui.label(RichText::new("Sin productos registrados").weak());
                }
                for producto in top {
                    ui.horizontal(|ui| {
                        ui.add_sized([140.0, 18.0], egui::Label::new(&producto.nombre).truncate());
                        ui.add(
                            ProgressBar::new(producto.cantidad.max(0) as f32 / max as f32)
                                .desired_width(column_width - 210.0)
                                .fill(disponibilidad_color(producto.disponibilidad()))
                                .text(producto.cantidad.to_string()),
                        );
                    });
                }
            });
        });
    });

    ui.add_space(15.0);
    ui.horizontal(|ui| {
        ui.add_space(10.0);
        ui.add_enabled_ui(!app.busy.productos, |ui| {
            if styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Actualizar").clicked() {
                app.load_productos();
            }
        });
        if app.busy.productos {
            ui.spinner();
        }
    });

    next_panel
}

fn section_frame(ui: &mut Ui, width: f32, add_contents: impl FnOnce(&mut Ui)) {
    egui::Frame::new()
        .fill(ui.style().visuals.extreme_bg_color)
        .inner_margin(Margin::same(15))
        .corner_radius(CornerRadius::same(8))
        .show(ui, |ui| {
            ui.set_min_width(width - 30.0);
            add_contents(ui);
        });
}

/// Render a stat card for one availability tier.
fn stat_card(ui: &mut Ui, tier: Disponibilidad, count: usize, total: usize) {
    egui::Frame::new()
        .fill(ui.style().visuals.extreme_bg_color)
        .inner_margin(Margin::same(15))
        .outer_margin(Margin::same(5))
        .corner_radius(CornerRadius::same(8))
        .show(ui, |ui| {
            ui.set_min_width(150.0);

            ui.vertical(|ui| {
                ui.label(RichText::new(tier.description()).small());
                ui.label(
                    RichText::new(count.to_string())
                        .heading()
                        .strong()
                        .color(disponibilidad_color(tier)),
                );
                ui.label(RichText::new(format!("de {total} productos")).small().weak());
            });
        });
}
