//! Profile of the signed-in user: data, display name and sign-out.

use eframe::egui::{self, RichText, Ui};
use egui_phosphor::regular::{FLOPPY_DISK, SIGN_OUT};

use crate::calendar::format_fecha;

use super::app::App;
use super::components::{back_button, colors, panel_header, primary_button_with_icon, styled_button_with_icon};

/// Show the profile panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);

    panel_header(ui, "Perfil");

    let Some(perfil) = app.perfil.clone() else {
        return go_back;
    };

    if perfil.needs_name() {
        ui.colored_label(
            colors::WARNING,
            "Es tu primer ingreso. Indica tu nombre y apellido para continuar.",
        );
        ui.add_space(10.0);
    }

    egui::Grid::new("perfil_grid")
        .num_columns(2)
        .spacing([20.0, 8.0])
        .striped(true)
        .show(ui, |ui| {
            ui.label("Nombre:");
            ui.label(RichText::new(perfil.display_name()).strong());
            ui.end_row();

            ui.label("Correo:");
            ui.label(&perfil.email);
            ui.end_row();

            ui.label("Rol:");
            ui.label(&perfil.rol);
            ui.end_row();

            ui.label("Fecha de ingreso:");
            ui.label(format_fecha(perfil.fecha_ingreso.date_naive()));
            ui.end_row();
        });

    ui.add_space(20.0);
    ui.separator();
    ui.add_space(10.0);

    ui.label(RichText::new("Cambiar nombre").strong());
    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(&mut app.nombre_input)
                .hint_text("Juan Pérez")
                .desired_width(260.0),
        );
        let submit = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        ui.add_enabled_ui(!app.busy.nombre, |ui| {
            if primary_button_with_icon(ui, FLOPPY_DISK, "Guardar").clicked() || submit {
                app.save_nombre();
            }
        });
        if app.busy.nombre {
            ui.spinner();
        }
    });

    ui.add_space(30.0);

    if styled_button_with_icon(ui, SIGN_OUT, "Cerrar sesión").clicked() {
        app.sign_out();
    }

    // First login stays here until a name is saved.
    go_back && !perfil.needs_name()
}
