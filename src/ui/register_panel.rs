//! Product registration: barcode lookup, scanner input, photo and stock.

use eframe::egui::{self, RichText, Ui};
use egui_phosphor::regular::{BARCODE, CAMERA, FLOPPY_DISK};

use crate::inventory::LOOKUP_MIN_LEN;
use crate::models::EstadoProducto;

use super::app::App;
use super::components::{
    back_button, colors, disponibilidad_color, panel_header, primary_button_with_icon, styled_button_with_icon,
};

/// Show the registration panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);

    panel_header(ui, "Registrar producto");

    // Scanner gun input
    ui.horizontal(|ui| {
        ui.label(BARCODE);
        let response = ui.add(
            egui::TextEdit::singleline(&mut app.register.scan_input)
                .hint_text("Escanea un código")
                .desired_width(220.0),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            app.scan_code();
        }
        if ui.button("Buscar").clicked() {
            app.scan_code();
        }
    });
    if let Some(message) = &app.register.scan_message {
        ui.label(RichText::new(message).small());
    }

    ui.add_space(10.0);
    ui.separator();
    ui.add_space(10.0);

    let mut codigo_changed = false;
    let categorias = &app.categorias;
    let form = &mut app.register.form;

    egui::Grid::new("register_grid")
        .num_columns(2)
        .spacing([20.0, 8.0])
        .striped(true)
        .show(ui, |ui| {
            ui.label("Código:");
            ui.horizontal(|ui| {
                codigo_changed = ui
                    .add(
                        egui::TextEdit::singleline(&mut form.codigo)
                            .hint_text(format!("Mínimo {LOOKUP_MIN_LEN} caracteres"))
                            .desired_width(220.0),
                    )
                    .changed();
                if app.busy.lookup {
                    ui.spinner();
                } else if app.register.existing_id.is_some() {
                    ui.colored_label(colors::INFO, "Producto existente");
                }
            });
            ui.end_row();

            ui.label("Nombre:");
            ui.add(egui::TextEdit::singleline(&mut form.nombre).desired_width(320.0));
            ui.end_row();

            ui.label("Marca:");
            ui.add(egui::TextEdit::singleline(&mut form.marca).desired_width(320.0));
            ui.end_row();

            ui.label("Modelo:");
            ui.add(egui::TextEdit::singleline(&mut form.modelo).desired_width(320.0));
            ui.end_row();

            ui.label("Categoría:");
            egui::ComboBox::from_id_salt("register_categoria")
                .width(220.0)
                .selected_text(
                    form.categoria_id
                        .and_then(|id| categorias.iter().find(|c| c.id == id))
                        .map(|c| c.nombre.as_str())
                        .unwrap_or("Sin categoría"),
                )
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut form.categoria_id, None, "Sin categoría");
                    for categoria in categorias {
                        ui.selectable_value(&mut form.categoria_id, Some(categoria.id), &categoria.nombre);
                    }
                });
            ui.end_row();

            ui.label("Estado:");
            egui::ComboBox::from_id_salt("register_estado")
                .width(220.0)
                .selected_text(form.estado.map(|e| e.as_str()).unwrap_or("Selecciona..."))
                .show_ui(ui, |ui| {
                    for estado in EstadoProducto::ALL {
                        ui.selectable_value(&mut form.estado, Some(estado), estado.as_str());
                    }
                });
            ui.end_row();

            ui.label("Compatibilidad:");
            ui.add(egui::TextEdit::singleline(&mut form.compatibilidad).desired_width(320.0));
            ui.end_row();

            ui.label("Observaciones:");
            ui.add(
                egui::TextEdit::multiline(&mut form.observaciones)
                    .desired_rows(3)
                    .desired_width(320.0),
            );
            ui.end_row();

            ui.label("Stock:");
            ui.horizontal(|ui| {
                ui.add(egui::DragValue::new(&mut form.stock).range(0..=100_000));
                let tier = form.disponibilidad();
                ui.colored_label(disponibilidad_color(tier), tier.label());
            });
            ui.end_row();

            ui.label("Imagen:");
            match &form.imagen_url {
                Some(url) => {
                    ui.hyperlink_to("Ver foto", url);
                }
                None => {
                    ui.label(RichText::new("Sin foto").weak());
                }
            }
            ui.end_row();
        });

    if codigo_changed {
        app.lookup_register_code();
    }

    ui.add_space(15.0);
    ui.horizontal(|ui| {
        ui.add_enabled_ui(!app.busy.upload, |ui| {
            if styled_button_with_icon(ui, CAMERA, "Adjuntar foto").clicked() {
                app.attach_image();
            }
        });
        if app.busy.upload {
            ui.spinner();
            ui.label("Subiendo imagen...");
        }

        ui.add_space(20.0);

        ui.add_enabled_ui(!app.busy.register, |ui| {
            if primary_button_with_icon(ui, FLOPPY_DISK, "Guardar producto").clicked() {
                app.save_register();
            }
        });
        if app.busy.register {
            ui.spinner();
        }

        ui.add_space(10.0);
        if ui.button("Limpiar").clicked() {
            app.register.reset();
        }
    });

    go_back
}
