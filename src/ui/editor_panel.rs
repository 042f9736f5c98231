//! Single-product editor. Only changed fields are written back.

use eframe::egui::{self, RichText, Ui};
use egui_phosphor::regular::FLOPPY_DISK;

use crate::calendar::format_fecha;
use crate::inventory::diff_update;

use super::app::App;
use super::components::{disponibilidad_color, panel_header, primary_button_with_icon};

/// Show the editor panel.
///
/// Returns `true` when the user leaves the editor.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let mut go_back = ui.button(RichText::new("< Volver a productos").size(14.0)).clicked();

    panel_header(ui, "Editar producto");

    if app.busy.editor_load {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Cargando producto...");
        });
        return go_back;
    }

    let Some(original) = app.editor.original.clone() else {
        ui.label("Producto no disponible.");
        return go_back;
    };

    egui::Grid::new("editor_info_grid")
        .num_columns(2)
        .spacing([20.0, 8.0])
        .show(ui, |ui| {
            ui.label("Código:");
            ui.label(RichText::new(original.codigo()).monospace());
            ui.end_row();

            ui.label("Categoría:");
            ui.label(original.categoria.as_deref().unwrap_or("-"));
            ui.end_row();

            ui.label("Estado:");
            ui.label(original.estado_label());
            ui.end_row();

            ui.label("Stock:");
            let tier = original.disponibilidad();
            ui.horizontal(|ui| {
                ui.label(original.cantidad.to_string());
                ui.colored_label(disponibilidad_color(tier), tier.description());
            });
            ui.end_row();

            ui.label("Registrado:");
            ui.label(format_fecha(original.created_at.date_naive()));
            ui.end_row();

            if let Some(url) = &original.imagen_url {
                ui.label("Imagen:");
                ui.hyperlink_to("Ver foto", url);
                ui.end_row();
            }
        });

    ui.add_space(10.0);
    ui.separator();
    ui.add_space(10.0);

    let draft = &mut app.editor.draft;
    egui::Grid::new("editor_form_grid")
        .num_columns(2)
        .spacing([20.0, 8.0])
        .striped(true)
        .show(ui, |ui| {
            ui.label("Nombre:");
            ui.add(egui::TextEdit::singleline(&mut draft.nombre).desired_width(320.0));
            ui.end_row();

            ui.label("Marca:");
            ui.add(egui::TextEdit::singleline(&mut draft.marca).desired_width(320.0));
            ui.end_row();

            ui.label("Modelo:");
            ui.add(egui::TextEdit::singleline(&mut draft.modelo).desired_width(320.0));
            ui.end_row();

            ui.label("Compatibilidad:");
            ui.add(egui::TextEdit::singleline(&mut draft.compatibilidad).desired_width(320.0));
            ui.end_row();

            ui.label("Observaciones:");
            ui.add(
                egui::TextEdit::multiline(&mut draft.observaciones)
                    .desired_rows(3)
                    .desired_width(320.0),
            );
            ui.end_row();
        });

    let pending = diff_update(&original, &app.editor.draft);

    ui.add_space(15.0);
    ui.horizontal(|ui| {
        if ui.button("Cancelar").clicked() {
            go_back = true;
        }
        ui.add_space(10.0);
        ui.add_enabled_ui(!app.busy.editor_save && !pending.is_empty(), |ui| {
            if primary_button_with_icon(ui, FLOPPY_DISK, "Guardar cambios").clicked() {
                app.save_editor();
            }
        });
        if app.busy.editor_save {
            ui.spinner();
        } else if pending.is_empty() {
            ui.label(RichText::new("Sin cambios").small().weak());
        }
    });

    go_back
}
