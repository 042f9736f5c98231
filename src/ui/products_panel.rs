//! Product list with search by name, condition or availability.

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_phosphor::regular::{ARROWS_CLOCKWISE, MAGNIFYING_GLASS, PENCIL_SIMPLE};

use crate::search::filter_productos;

use super::app::App;
use super::components::{back_button, disponibilidad_color, panel_header, styled_button_with_icon};

/// Show the products panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);

    panel_header(ui, "Productos");

    ui.horizontal(|ui| {
        ui.label(MAGNIFYING_GLASS);
        ui.add(
            egui::TextEdit::singleline(&mut app.search)
                .hint_text("Nombre, estado o disponibilidad")
                .desired_width(280.0),
        );
        if !app.search.is_empty() && ui.small_button("x").clicked() {
            app.search.clear();
        }

        ui.add_space(20.0);

        ui.add_enabled_ui(!app.busy.productos, |ui| {
            if styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Actualizar").clicked() {
                app.load_productos();
            }
        });
        if app.busy.productos {
            ui.spinner();
        }
    });

    let visibles = filter_productos(&app.productos, &app.search);
    ui.label(
        RichText::new(format!("{} de {} productos", visibles.len(), app.productos.len()))
            .small()
            .weak(),
    );

    ui.add_space(10.0);
    ui.separator();
    ui.add_space(10.0);

    let mut edit_id = None;

    ScrollArea::both().show(ui, |ui| {
        egui::Grid::new("productos_grid")
            .num_columns(8)
            .striped(true)
            .min_col_width(70.0)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.strong("Código");
                ui.strong("Nombre");
                ui.strong("Marca");
                ui.strong("Categoría");
                ui.strong("Estado");
                ui.strong("Stock");
                ui.strong("Disponibilidad");
                ui.strong("");
                ui.end_row();

                for producto in &visibles {
                    ui.label(producto.codigo());
                    ui.label(&producto.nombre);
                    ui.label(producto.marca.as_deref().unwrap_or("-"));
                    ui.label(producto.categoria.as_deref().unwrap_or("-"));
                    ui.label(producto.estado_label());
                    ui.label(producto.cantidad.to_string());
                    let tier = producto.disponibilidad();
                    ui.colored_label(disponibilidad_color(tier), tier.label());
                    if ui.button(PENCIL_SIMPLE).on_hover_text("Editar").clicked() {
                        edit_id = Some(producto.id);
                    }
                    ui.end_row();
                }

                if visibles.is_empty() {
                    let text = if app.productos.is_empty() {
                        "No hay productos registrados."
                    } else {
                        "Ningún producto coincide con la búsqueda."
                    };
                    ui.label(text);
                    ui.end_row();
                }
            });
    });

    if let Some(id) = edit_id {
        app.open_editor(id);
    }

    go_back
}
