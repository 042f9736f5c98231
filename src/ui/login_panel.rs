//! Sign-in screen: email/password or OAuth via the browser.

use eframe::egui::{self, RichText, Ui};
use egui_phosphor::regular::{GOOGLE_LOGO, SIGN_IN};

use super::app::App;
use super::components::primary_button_with_icon;

/// Show the login panel.
pub fn show(app: &mut App, ui: &mut Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(60.0);
        ui.label(RichText::new("Nexa Inventario").size(32.0).strong());
        ui.add_space(5.0);
        ui.label(RichText::new("Control de productos y stock").size(14.0).weak());
        ui.add_space(30.0);

        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_max_width(380.0);

            egui::Grid::new("login_grid")
                .num_columns(2)
                .spacing([20.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Correo:");
                    ui.add(
                        egui::TextEdit::singleline(&mut app.login.email)
                            .hint_text("usuario@empresa.cl")
                            .desired_width(220.0),
                    );
                    ui.end_row();

                    ui.label("Contraseña:");
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut app.login.password)
                            .password(true)
                            .desired_width(220.0),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        app.sign_in_with_password();
                    }
                    ui.end_row();
                });

            ui.add_space(10.0);

            ui.add_enabled_ui(!app.login.busy, |ui| {
                if primary_button_with_icon(ui, SIGN_IN, "Iniciar sesión").clicked() {
                    app.sign_in_with_password();
                }
            });

            if app.login.busy {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Verificando acceso...");
                });
            }
        });

        ui.add_space(20.0);

        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_max_width(380.0);
            ui.label(RichText::new("Acceso con Google").strong());
            ui.add_space(5.0);

            if ui.button(format!("{GOOGLE_LOGO} Abrir en el navegador")).clicked() {
                app.start_oauth(ui.ctx(), "google");
            }

            ui.add_space(5.0);
            ui.label(RichText::new("Dirección de retorno:").small());
            ui.add(
                egui::TextEdit::singleline(&mut app.login.callback_url)
                    .hint_text("http://localhost:3000/auth/callback#access_token=...")
                    .desired_width(340.0),
            );

            let can_finish = !app.login.busy && !app.login.callback_url.trim().is_empty();
            if ui.add_enabled(can_finish, egui::Button::new("Continuar")).clicked() {
                app.complete_oauth();
            }
        });
    });
}
