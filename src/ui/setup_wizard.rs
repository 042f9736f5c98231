//! First-run setup wizard for configuration.

use std::path::PathBuf;

use crate::config::AppConfig;
use eframe::egui::{self, Color32, RichText};
use tokio::sync::mpsc;

/// Connection test state.
#[derive(Default, Clone)]
pub enum ConnectionTestState {
    #[default]
    NotTested,
    Testing,
    Success,
    Failed(String),
}

/// Setup wizard state.
pub struct SetupWizard {
    /// Current step (0-4).
    pub current_step: usize,
    /// Configuration being built.
    pub config: AppConfig,
    /// Database connection test state.
    pub db_test_state: ConnectionTestState,
    /// Backend reachability test state.
    pub backend_test_state: ConnectionTestState,
    /// Wizard completed flag.
    pub completed: bool,
    /// Port input as string for text editing.
    port_input: String,
    /// Timeout input as string.
    timeout_input: String,
}

impl Default for SetupWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupWizard {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Start from an existing (possibly invalid) configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            current_step: 0,
            port_input: config.database.port.to_string(),
            timeout_input: config.backend.timeout_secs.to_string(),
            config,
            db_test_state: ConnectionTestState::NotTested,
            backend_test_state: ConnectionTestState::NotTested,
            completed: false,
        }
    }

    /// Check if user can proceed to next step.
    pub fn can_proceed(&self) -> bool {
        match self.current_step {
            0 => true,
            1 => matches!(self.db_test_state, ConnectionTestState::Success),
            2 => self.validate_backend_step().is_ok(),
            3 => true,
            4 => self.config.validate().is_ok(),
            _ => false,
        }
    }

    /// Validate backend step inputs.
    fn validate_backend_step(&self) -> Result<(), String> {
        let backend = &self.config.backend;
        if !backend.url.starts_with("http") {
            return Err("La URL debe comenzar con http:// o https://".to_string());
        }
        if backend.anon_key.trim().is_empty() {
            return Err("La clave pública (anon key) es obligatoria".to_string());
        }
        if backend.storage_bucket.trim().is_empty() {
            return Err("Indica el bucket de imágenes".to_string());
        }
        if backend.timeout_secs < 5 {
            return Err("El tiempo de espera debe ser de al menos 5 segundos".to_string());
        }
        Ok(())
    }

    /// Get step title.
    fn step_title(&self) -> &'static str {
        match self.current_step {
            0 => "Bienvenida",
            1 => "Base de datos",
            2 => "Servidor de autenticación",
            3 => "Reportes",
            4 => "Confirmación",
            _ => "Configuración",
        }
    }

    /// Total number of steps.
    const TOTAL_STEPS: usize = 5;
}

/// Setup wizard application.
pub struct SetupApp {
    pub wizard: SetupWizard,
    pub initial_error: Option<String>,
    config_path: PathBuf,
    rt: tokio::runtime::Runtime,
    db_test_rx: Option<mpsc::UnboundedReceiver<Result<(), String>>>,
    backend_test_rx: Option<mpsc::UnboundedReceiver<Result<(), String>>>,
}

impl SetupApp {
    pub fn new(
        wizard: SetupWizard,
        initial_error: Option<String>,
        config_path: PathBuf,
        rt: tokio::runtime::Runtime,
    ) -> Self {
        Self {
            wizard,
            initial_error,
            config_path,
            rt,
            db_test_rx: None,
            backend_test_rx: None,
        }
    }

    /// Test database connection asynchronously.
    fn start_db_test(&mut self) {
        let conn_str = self.wizard.config.database.connection_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.db_test_rx = Some(rx);
        self.wizard.db_test_state = ConnectionTestState::Testing;

        self.rt.spawn(async move {
            let result = test_db_connection(&conn_str).await;
            let _ = tx.send(result);
        });
    }

    /// Check the auth endpoint answers with the given key.
    fn start_backend_test(&mut self) {
        let url = self.wizard.config.backend.url.clone();
        let key = self.wizard.config.backend.anon_key.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        self.backend_test_rx = Some(rx);
        self.wizard.backend_test_state = ConnectionTestState::Testing;

        self.rt.spawn(async move {
            let result = test_backend_connection(&url, &key).await;
            let _ = tx.send(result);
        });
    }

    /// Check for async test results.
    fn poll_test_results(&mut self) {
        if let Some(rx) = &mut self.db_test_rx
            && let Ok(result) = rx.try_recv()
        {
            self.wizard.db_test_state = match result {
                Ok(()) => ConnectionTestState::Success,
                Err(e) => ConnectionTestState::Failed(e),
            };
            self.db_test_rx = None;
        }

        if let Some(rx) = &mut self.backend_test_rx
            && let Ok(result) = rx.try_recv()
        {
            self.wizard.backend_test_state = match result {
                Ok(()) => ConnectionTestState::Success,
                Err(e) => ConnectionTestState::Failed(e),
            };
            self.backend_test_rx = None;
        }
    }
}

impl eframe::App for SetupApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll async test results
        self.poll_test_results();

        // Request repaint while testing
        if matches!(self.wizard.db_test_state, ConnectionTestState::Testing)
            || matches!(self.wizard.backend_test_state, ConnectionTestState::Testing)
        {
            ctx.request_repaint();
        }

        // Show initial error dialog
        if let Some(err) = self.initial_error.clone() {
            egui::Window::new("Error de configuración")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.colored_label(Color32::from_rgb(255, 100, 100), &err);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.initial_error = None;
                    }
                });
            return;
        }

        // Main wizard panel
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(20.0);

                // Header
                ui.horizontal(|ui| {
                    ui.heading(RichText::new("Configuración de Nexa Inventario").size(24.0).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(format!(
                            "Paso {} de {}",
                            self.wizard.current_step + 1,
                            SetupWizard::TOTAL_STEPS
                        ));
                    });
                });

                ui.separator();
                ui.add_space(10.0);

                // Step title
                ui.heading(self.wizard.step_title());
                ui.add_space(20.0);

                // Step content
                let mut needs_db_test = false;
                let mut needs_backend_test = false;
                match self.wizard.current_step {
                    0 => show_welcome_step(ui),
                    1 => needs_db_test = show_database_step(ui, &mut self.wizard),
                    2 => needs_backend_test = show_backend_step(ui, &mut self.wizard),
                    3 => show_export_step(ui, &mut self.wizard),
                    4 => show_confirmation_step(ui, &self.wizard),
                    _ => {}
                }

                if needs_db_test {
                    self.start_db_test();
                }
                if needs_backend_test {
                    self.start_backend_test();
                }

                ui.add_space(30.0);
                ui.separator();

                // Navigation buttons
                ui.horizontal(|ui| {
                    if self.wizard.current_step > 0 && ui.button("< Atrás").clicked() {
                        self.wizard.current_step -= 1;
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if self.wizard.current_step < SetupWizard::TOTAL_STEPS - 1 {
                            let btn_text = if self.wizard.current_step == 0 {
                                "Comenzar >"
                            } else {
                                "Siguiente >"
                            };
                            let enabled = self.wizard.can_proceed();
                            if ui.add_enabled(enabled, egui::Button::new(btn_text)).clicked() {
                                self.wizard.current_step += 1;
                            }
                        } else {
                            let enabled = self.wizard.can_proceed();
                            if ui.add_enabled(enabled, egui::Button::new("Guardar y salir")).clicked() {
                                self.wizard.completed = true;
                            }
                        }
                    });
                });
            });
        });

        // Handle completion
        if self.wizard.completed {
            match self.wizard.config.save(&self.config_path) {
                Ok(()) => {
                    tracing::info!("Config saved to {:?}", self.config_path);
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                Err(e) => {
                    self.initial_error = Some(format!("No se pudo guardar la configuración: {}", e));
                    self.wizard.completed = false;
                }
            }
        }
    }
}

fn show_welcome_step(ui: &mut egui::Ui) {
    ui.label("¡Bienvenido/a a Nexa Inventario!");
    ui.add_space(10.0);
    ui.label("Este asistente te ayudará a configurar la aplicación.");
    ui.add_space(20.0);
    ui.label("Necesitarás:");
    ui.add_space(5.0);
    ui.label("  - Datos de conexión a la base de datos PostgreSQL");
    ui.label("  - URL del proyecto y clave pública (anon key)");
    ui.label("  - Carpeta con las fuentes LiberationSans para los PDF");
}

fn show_database_step(ui: &mut egui::Ui, wizard: &mut SetupWizard) -> bool {
    let mut needs_test = false;

    egui::Grid::new("db_grid")
        .num_columns(2)
        .spacing([20.0, 8.0])
        .striped(true)
        .show(ui, |ui| {
            ui.label("Host:");
            ui.text_edit_singleline(&mut wizard.config.database.host);
            ui.end_row();

            ui.label("Puerto:");
            if ui.text_edit_singleline(&mut wizard.port_input).changed()
                && let Ok(p) = wizard.port_input.parse()
            {
                wizard.config.database.port = p;
            }
            ui.end_row();

            ui.label("Base de datos:");
            ui.text_edit_singleline(&mut wizard.config.database.name);
            ui.end_row();

            ui.label("Usuario:");
            ui.text_edit_singleline(&mut wizard.config.database.username);
            ui.end_row();

            ui.label("Contraseña:");
            ui.add(egui::TextEdit::singleline(&mut wizard.config.database.password).password(true));
            ui.end_row();

            ui.label("SSL:");
            ui.checkbox(&mut wizard.config.database.require_ssl, "Requerir SSL");
            ui.end_row();
        });

    ui.add_space(20.0);

    ui.horizontal(|ui| {
        let testing = matches!(wizard.db_test_state, ConnectionTestState::Testing);
        if ui.add_enabled(!testing, egui::Button::new("Probar conexión")).clicked() {
            needs_test = true;
        }

        ui.add_space(10.0);
        show_test_state(ui, &wizard.db_test_state);
    });

    needs_test
}

fn show_backend_step(ui: &mut egui::Ui, wizard: &mut SetupWizard) -> bool {
    let mut needs_test = false;

    egui::Grid::new("backend_grid")
        .num_columns(2)
        .spacing([20.0, 8.0])
        .striped(true)
        .show(ui, |ui| {
            ui.label("URL del proyecto:");
            ui.text_edit_singleline(&mut wizard.config.backend.url);
            ui.end_row();

            ui.label("Anon key:");
            ui.add(egui::TextEdit::singleline(&mut wizard.config.backend.anon_key).password(true));
            ui.end_row();

            ui.label("Bucket de imágenes:");
            ui.text_edit_singleline(&mut wizard.config.backend.storage_bucket);
            ui.end_row();

            ui.label("Redirección OAuth:");
            ui.text_edit_singleline(&mut wizard.config.backend.oauth_redirect_url);
            ui.end_row();

            ui.label("Tiempo de espera (s):");
            if ui.text_edit_singleline(&mut wizard.timeout_input).changed()
                && let Ok(t) = wizard.timeout_input.parse()
            {
                wizard.config.backend.timeout_secs = t;
            }
            ui.end_row();
        });

    ui.add_space(10.0);

    ui.horizontal(|ui| {
        let testing = matches!(wizard.backend_test_state, ConnectionTestState::Testing);
        if ui.add_enabled(!testing, egui::Button::new("Probar servidor")).clicked() {
            needs_test = true;
        }

        ui.add_space(10.0);
        show_test_state(ui, &wizard.backend_test_state);
    });

    // Validation feedback
    if let Err(e) = wizard.validate_backend_step() {
        ui.add_space(10.0);
        ui.colored_label(Color32::from_rgb(255, 100, 100), e);
    }

    needs_test
}

fn show_export_step(ui: &mut egui::Ui, wizard: &mut SetupWizard) {
    ui.label("Dónde se guardan los reportes PDF y Excel.");
    ui.add_space(10.0);

    let export = &mut wizard.config.export;
    let current = export.resolved_output_dir();

    egui::Grid::new("export_grid")
        .num_columns(2)
        .spacing([20.0, 8.0])
        .striped(true)
        .show(ui, |ui| {
            ui.label("Carpeta de reportes:");
            ui.horizontal(|ui| {
                ui.label(current.display().to_string());
                if ui.button("Elegir...").clicked()
                    && let Some(dir) = rfd::FileDialog::new().set_directory(&current).pick_folder()
                {
                    export.output_dir = Some(dir);
                }
            });
            ui.end_row();

            ui.label("Carpeta de fuentes:");
            ui.horizontal(|ui| {
                ui.label(export.fonts_dir.display().to_string());
                if ui.button("Elegir...").clicked()
                    && let Some(dir) = rfd::FileDialog::new().pick_folder()
                {
                    export.fonts_dir = dir;
                }
            });
            ui.end_row();

            ui.label("Al terminar:");
            ui.checkbox(&mut export.open_after_export, "Abrir el archivo generado");
            ui.end_row();
        });

    ui.add_space(10.0);
    ui.checkbox(&mut wizard.config.permissions.camera, "Permitir adjuntar fotos de productos");
}

fn show_confirmation_step(ui: &mut egui::Ui, wizard: &SetupWizard) {
    ui.label("Revisa tu configuración:");
    ui.add_space(10.0);

    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.heading("Base de datos");
        ui.label(format!(
            "  {}@{}:{}/{}",
            wizard.config.database.username,
            wizard.config.database.host,
            wizard.config.database.port,
            wizard.config.database.name
        ));
    });

    ui.add_space(10.0);

    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.heading("Servidor");
        ui.label(format!("  {}", wizard.config.backend.url));
        ui.label(format!("  Bucket: {}", wizard.config.backend.storage_bucket));
    });

    ui.add_space(10.0);

    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.heading("Reportes");
        ui.label(format!("  Carpeta: {}", wizard.config.export.resolved_output_dir().display()));
        ui.label(format!("  Fuentes: {}", wizard.config.export.fonts_dir.display()));
    });

    if let Err(e) = wizard.config.validate() {
        ui.add_space(10.0);
        ui.colored_label(Color32::from_rgb(255, 100, 100), e.to_string());
    }

    ui.add_space(20.0);
    ui.label("Pulsa 'Guardar y salir' para guardar y cerrar el asistente.");
    ui.label("Luego vuelve a abrir la aplicación.");
}

fn show_test_state(ui: &mut egui::Ui, state: &ConnectionTestState) {
    match state {
        ConnectionTestState::NotTested => {
            ui.label("Sin probar");
        }
        ConnectionTestState::Testing => {
            ui.spinner();
            ui.label("Probando...");
        }
        ConnectionTestState::Success => {
            ui.colored_label(Color32::from_rgb(100, 200, 100), "¡Conexión exitosa!");
        }
        ConnectionTestState::Failed(e) => {
            ui.colored_label(Color32::from_rgb(255, 100, 100), format!("Falló: {}", e));
        }
    }
}

/// Test database connection.
async fn test_db_connection(conn_str: &str) -> Result<(), String> {
    let conn = crate::db::connect(conn_str).await.map_err(|e| e.to_string())?;

    crate::db::test_connection(&conn).await.map_err(|e| e.to_string())
}

/// Hit the auth health endpoint with the anon key.
async fn test_backend_connection(url: &str, anon_key: &str) -> Result<(), String> {
    if url.is_empty() {
        return Err("URL vacía".to_string());
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .map_err(|e| e.to_string())?;

    let response = client
        .get(format!("{}/auth/v1/health", url.trim_end_matches('/')))
        .header("apikey", anon_key)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(response.status().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_step_requires_successful_test() {
        let mut wizard = SetupWizard::new();
        wizard.current_step = 1;
        assert!(!wizard.can_proceed());

        wizard.db_test_state = ConnectionTestState::Success;
        assert!(wizard.can_proceed());
    }

    #[test]
    fn test_backend_step_requires_key() {
        let mut wizard = SetupWizard::new();
        wizard.current_step = 2;
        assert!(!wizard.can_proceed());

        wizard.config.backend.anon_key = "public-anon-key".to_string();
        assert!(wizard.can_proceed());

        wizard.config.backend.url = "demo.supabase.co".to_string();
        assert!(!wizard.can_proceed());
    }

    #[test]
    fn test_confirmation_step_agrees_with_backend_step() {
        let mut wizard = SetupWizard::new();
        wizard.current_step = 4;
        assert!(!wizard.can_proceed());

        wizard.config.backend.anon_key = "public-anon-key".to_string();
        assert!(wizard.can_proceed());
    }
}
