//! Main application UI.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use eframe::egui::{self, Align, Layout};
use egui_phosphor::regular::{MOON, SIGN_OUT, SUN};
use sea_orm::DatabaseConnection;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::auth::{AccessGate, AuthClient, Session, session_from_redirect, validate_nombre};
use crate::config::AppConfig;
use crate::db;
use crate::download::{FolderDownload, open_or_notice};
use crate::entities::{categorias, productos};
use crate::error::AppError;
use crate::export::{self, ExportFormat};
use crate::inventory::{self, Lookup, SavedProducto, ScanResult};
use crate::models::{Perfil, ProductoConStock, ProductoForm};
use crate::permissions::DesktopCapabilities;
use crate::reports::{self, ReportKind, ReportTable};
use crate::storage::StorageClient;

use super::components::{Toast, ToastLevel, colors, show_toasts};
use super::{dashboard, editor_panel, login_panel, products_panel, profile_panel, register_panel, reports_panel};

/// Current panel being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Login,
    Dashboard,
    Products,
    Editor,
    Register,
    Reports,
    Profile,
}

impl Panel {
    /// Get the display name for the panel.
    pub fn name(&self) -> &'static str {
        match self {
            Panel::Login => "Iniciar sesión",
            Panel::Dashboard => "Panel",
            Panel::Products => "Productos",
            Panel::Editor => "Editar producto",
            Panel::Register => "Registrar producto",
            Panel::Reports => "Reportes",
            Panel::Profile => "Perfil",
        }
    }
}

/// Messages from async tasks to UI.
pub enum UiMessage {
    // Session
    SignedIn(Box<Session>, Perfil),
    SignInFailed(String),
    SignedOut,

    // Data loading
    ProductosLoaded(Vec<ProductoConStock>),
    CategoriasLoaded(Vec<categorias::Model>),

    // Editor
    EditorLoaded {
        request_id: u64,
        producto: Option<ProductoConStock>,
    },
    ProductoUpdated(productos::Model),

    // Registration
    LookupDone { codigo: String, lookup: Option<Lookup> },
    ScanDone(Option<ScanResult>),
    ProductoSaved(SavedProducto),
    ImageAttached { codigo: String, form: ProductoForm },

    // Reports
    ReportPreview(ReportTable),
    ExportDone(String),

    // Profile
    NombreSaved(String),

    /// A background task failed; only its own in-flight flag is released.
    Failed(Operation, String),
}

/// Background work that blocks repeated clicks while in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LoadProductos,
    LoadCategorias,
    LoadEditor { request_id: u64 },
    SaveEditor,
    Lookup,
    Scan,
    UploadImage,
    SaveRegister,
    PreviewReport,
    ExportReport,
    SaveNombre,
}

/// Flags of the operations currently running.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InFlight {
    pub productos: bool,
    pub editor_load: bool,
    pub editor_save: bool,
    pub lookup: bool,
    pub upload: bool,
    pub register: bool,
    pub preview: bool,
    pub export: Option<ExportFormat>,
    pub nombre: bool,
}

impl InFlight {
    /// Clear the flag owned by `op`, leaving the others alone.
    pub fn release(&mut self, op: Operation) {
        match op {
            Operation::LoadProductos => self.productos = false,
            Operation::LoadEditor { .. } => self.editor_load = false,
            Operation::SaveEditor => self.editor_save = false,
            Operation::Lookup => self.lookup = false,
            Operation::UploadImage => self.upload = false,
            Operation::SaveRegister => self.register = false,
            Operation::PreviewReport => self.preview = false,
            Operation::ExportReport => self.export = None,
            Operation::SaveNombre => self.nombre = false,
            Operation::LoadCategorias | Operation::Scan => {}
        }
    }

    pub fn any(&self) -> bool {
        self.productos
            || self.editor_load
            || self.editor_save
            || self.lookup
            || self.upload
            || self.register
            || self.preview
            || self.export.is_some()
            || self.nombre
    }
}

/// Sign-in form state.
#[derive(Default, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Callback URL pasted back from the browser after OAuth.
    pub callback_url: String,
    pub busy: bool,
}

/// Single-product editor state.
#[derive(Default, Clone)]
pub struct EditorState {
    /// Bumped every time the editor opens or closes; stale loads are dropped.
    pub request_id: u64,
    pub original: Option<ProductoConStock>,
    pub draft: ProductoForm,
}

/// Registration form state.
#[derive(Default, Clone)]
pub struct RegisterState {
    pub form: ProductoForm,
    /// Id of the product the typed code resolved to, if any.
    pub existing_id: Option<i32>,
    /// Last code sent to lookup, to avoid repeating it every frame.
    pub last_lookup: String,
    pub scan_input: String,
    pub scan_message: Option<String>,
}

impl RegisterState {
    /// Reset the form to default values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply an uploaded photo if the form still holds the code it was taken for.
    pub fn apply_uploaded_image(&mut self, codigo: &str, uploaded: ProductoForm) -> bool {
        if self.form.codigo.trim() != codigo {
            return false;
        }
        self.form.imagen_url = uploaded.imagen_url;
        self.form.stock = uploaded.stock;
        true
    }
}

/// Filter state for reports.
#[derive(Clone)]
pub struct ReportFilter {
    pub kind: ReportKind,
    pub date: NaiveDate,
    pub date_input: String,
    pub preview: Option<ReportTable>,
}

impl Default for ReportFilter {
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self {
            kind: ReportKind::Productos,
            date: today,
            date_input: today.format("%Y-%m-%d").to_string(),
            preview: None,
        }
    }
}

impl ReportFilter {
    /// Set the period date and mirror it in the text input.
    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
        self.date_input = date.format("%Y-%m-%d").to_string();
        self.preview = None;
    }
}

/// Main application state.
pub struct App {
    // Runtime and database
    pub rt: tokio::runtime::Runtime,
    pub pool: DatabaseConnection,

    // Message channel for async communication
    pub tx: mpsc::UnboundedSender<UiMessage>,
    pub rx: mpsc::UnboundedReceiver<UiMessage>,

    // Backend services
    pub auth: AuthClient,
    pub storage: StorageClient,
    pub capabilities: Arc<DesktopCapabilities>,
    pub downloads: Arc<FolderDownload>,

    // Configuration
    pub config: AppConfig,
    config_path: PathBuf,

    // Session
    pub session: Option<Session>,
    pub perfil: Option<Perfil>,

    // Navigation
    pub current_panel: Panel,

    // Cached data
    pub productos: Vec<ProductoConStock>,
    pub categorias: Vec<categorias::Model>,

    // Loading states
    pub busy: InFlight,

    // Forms
    pub login: LoginForm,
    pub search: String,
    pub editor: EditorState,
    pub register: RegisterState,
    pub report_filter: ReportFilter,
    pub nombre_input: String,

    // Notifications
    pub toasts: Vec<Toast>,
}

impl App {
    pub fn new(
        pool: DatabaseConnection,
        config: AppConfig,
        config_path: PathBuf,
        rt: tokio::runtime::Runtime,
    ) -> crate::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let auth = AuthClient::new(&config.backend)?;
        let storage = StorageClient::new(&config.backend)?;
        let capabilities = Arc::new(DesktopCapabilities::new(&config.export, &config.permissions));
        let downloads = Arc::new(FolderDownload::new(config.export.resolved_output_dir()));

        Ok(Self {
            rt,
            pool,
            tx,
            rx,
            auth,
            storage,
            capabilities,
            downloads,
            config,
            config_path,
            session: None,
            perfil: None,
            current_panel: Panel::default(),
            productos: Vec::new(),
            categorias: Vec::new(),
            busy: InFlight::default(),
            login: LoginForm::default(),
            search: String::new(),
            editor: EditorState::default(),
            register: RegisterState::default(),
            report_filter: ReportFilter::default(),
            nombre_input: String::new(),
            toasts: Vec::new(),
        })
    }

    /// Show a transient notification.
    pub fn notify(&mut self, level: ToastLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ToastLevel::Error => warn!("{}", message),
            _ => info!("{}", message),
        }
        self.toasts.push(Toast::new(level, message));
    }

    pub fn notify_error(&mut self, err: &AppError) {
        error!("{}", err);
        self.toasts.push(Toast::new(ToastLevel::Error, err.user_message()));
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some() && self.perfil.is_some()
    }

    /// Sign in with email and password.
    pub fn sign_in_with_password(&mut self) {
        if self.login.busy {
            return;
        }
        let email = self.login.email.trim().to_string();
        if email.is_empty() || self.login.password.is_empty() {
            self.notify(ToastLevel::Error, "Ingresa tu correo y contraseña.");
            return;
        }

        self.login.busy = true;
        let auth = self.auth.clone();
        let password = self.login.password.clone();
        let pool = self.pool.clone();
        let capabilities = self.capabilities.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            let result = match auth.sign_in_with_password(&email, &password).await {
                Ok(session) => admit_session(&pool, &auth, capabilities.as_ref(), session).await,
                Err(e) => Err(e),
            };
            let _ = tx.send(signed_in_message(result));
        });
    }

    /// Open the provider's consent page in the browser.
    pub fn start_oauth(&mut self, ctx: &egui::Context, provider: &str) {
        match self.auth.oauth_authorize_url(provider) {
            Ok(url) => {
                ctx.open_url(egui::OpenUrl::new_tab(url.as_str()));
                self.notify(
                    ToastLevel::Info,
                    "Completa el acceso en el navegador y pega aquí la dirección de retorno.",
                );
            }
            Err(e) => self.notify_error(&e),
        }
    }

    /// Finish OAuth with the callback URL the browser landed on.
    pub fn complete_oauth(&mut self) {
        if self.login.busy {
            return;
        }
        let session = match session_from_redirect(&self.login.callback_url) {
            Ok(session) => session,
            Err(e) => {
                self.notify_error(&e);
                return;
            }
        };

        self.login.busy = true;
        let auth = self.auth.clone();
        let pool = self.pool.clone();
        let capabilities = self.capabilities.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            let result = admit_session(&pool, &auth, capabilities.as_ref(), session).await;
            let _ = tx.send(signed_in_message(result));
        });
    }

    /// End the session locally and on the server.
    pub fn sign_out(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.perfil = None;
        self.productos.clear();
        self.editor = EditorState {
            request_id: self.editor.request_id + 1,
            ..EditorState::default()
        };
        self.register.reset();
        self.report_filter = ReportFilter::default();
        self.busy = InFlight::default();
        self.current_panel = Panel::Login;

        let auth = self.auth.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            if let Err(e) = auth.sign_out(&session).await {
                warn!("Sign-out request failed: {}", e);
            }
            let _ = tx.send(UiMessage::SignedOut);
        });
    }

    /// Load products with their stock. No-op while a load is in flight.
    pub fn load_productos(&mut self) {
        if self.busy.productos {
            return;
        }
        self.busy.productos = true;
        let pool = self.pool.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            match db::producto::list_with_stock(&pool).await {
                Ok(rows) => {
                    let _ = tx.send(UiMessage::ProductosLoaded(rows));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed(
                        Operation::LoadProductos,
                        AppError::from(e).user_message(),
                    ));
                }
            }
        });
    }

    /// Load categories for the registration form.
    pub fn load_categorias(&mut self) {
        let pool = self.pool.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            match db::categoria::list_all(&pool).await {
                Ok(rows) => {
                    let _ = tx.send(UiMessage::CategoriasLoaded(rows));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed(
                        Operation::LoadCategorias,
                        AppError::from(e).user_message(),
                    ));
                }
            }
        });
    }

    /// Open the editor for one product.
    pub fn open_editor(&mut self, id: i32) {
        self.editor = EditorState {
            request_id: self.editor.request_id + 1,
            ..EditorState::default()
        };
        self.busy.editor_load = true;
        self.busy.editor_save = false;
        self.current_panel = Panel::Editor;

        let request_id = self.editor.request_id;
        let pool = self.pool.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            match db::producto::get_by_id(&pool, id).await {
                Ok(producto) => {
                    let _ = tx.send(UiMessage::EditorLoaded { request_id, producto });
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed(
                        Operation::LoadEditor { request_id },
                        AppError::from(e).user_message(),
                    ));
                }
            }
        });
    }

    /// Leave the editor; any load still in flight is discarded.
    pub fn close_editor(&mut self) {
        self.editor = EditorState {
            request_id: self.editor.request_id + 1,
            ..EditorState::default()
        };
        self.busy.editor_load = false;
        self.current_panel = Panel::Products;
    }

    /// Save only the fields that changed in the editor.
    pub fn save_editor(&mut self) {
        if self.busy.editor_save {
            return;
        }
        let Some(original) = &self.editor.original else {
            return;
        };
        let id = original.id;
        let update = inventory::diff_update(original, &self.editor.draft);
        if update.is_empty() {
            self.notify(ToastLevel::Info, "No hay cambios para guardar.");
            return;
        }

        self.busy.editor_save = true;
        let pool = self.pool.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            match inventory::edit_producto(&pool, id, update).await {
                Ok(model) => {
                    let _ = tx.send(UiMessage::ProductoUpdated(model));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed(Operation::SaveEditor, e.user_message()));
                }
            }
        });
    }

    /// Look the typed code up once it is long enough and has changed.
    pub fn lookup_register_code(&mut self) {
        let codigo = self.register.form.codigo.trim().to_string();
        if codigo == self.register.last_lookup || !inventory::should_lookup(&codigo) {
            return;
        }
        self.register.last_lookup = codigo.clone();
        self.busy.lookup = true;

        let pool = self.pool.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            match inventory::lookup_barcode(&pool, &codigo).await {
                Ok(lookup) => {
                    let _ = tx.send(UiMessage::LookupDone { codigo, lookup });
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed(Operation::Lookup, e.user_message()));
                }
            }
        });
    }

    /// Resolve a code read by a scanner gun.
    pub fn scan_code(&mut self) {
        let codigo = self.register.scan_input.trim().to_string();
        if !inventory::is_scanner_code(&codigo) {
            self.register.scan_message = Some(format!(
                "El código escaneado debe tener al menos {} caracteres.",
                inventory::SCANNER_MIN_LEN
            ));
            return;
        }

        let pool = self.pool.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            match inventory::scan(&pool, &codigo).await {
                Ok(result) => {
                    let _ = tx.send(UiMessage::ScanDone(result));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed(Operation::Scan, e.user_message()));
                }
            }
        });
    }

    /// Pick a photo, upload it and add one unit to the form.
    pub fn attach_image(&mut self) {
        if self.busy.upload {
            return;
        }
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Imágenes", &["jpg", "jpeg", "png", "webp"])
            .pick_file()
        else {
            return;
        };

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.notify_error(&AppError::Io(e));
                return;
            }
        };
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg")
            .to_lowercase();

        self.busy.upload = true;
        let mut form = self.register.form.clone();
        let codigo = form.codigo.trim().to_string();
        let storage = self.storage.clone();
        let capabilities = self.capabilities.clone();
        let session = self.session.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            let result = inventory::attach_image(
                &storage,
                capabilities.as_ref(),
                session.as_ref(),
                &mut form,
                bytes,
                &extension,
            )
            .await;
            match result {
                Ok(_) => {
                    let _ = tx.send(UiMessage::ImageAttached { codigo, form });
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed(Operation::UploadImage, e.user_message()));
                }
            }
        });
    }

    /// Validate and upsert the registration form.
    pub fn save_register(&mut self) {
        if self.busy.register {
            return;
        }
        if let Err(e) = self.register.form.validate() {
            self.notify_error(&e);
            return;
        }

        self.busy.register = true;
        let form = self.register.form.clone();
        let pool = self.pool.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            match inventory::save_producto(&pool, &form).await {
                Ok(saved) => {
                    let _ = tx.send(UiMessage::ProductoSaved(saved));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed(Operation::SaveRegister, e.user_message()));
                }
            }
        });
    }

    /// Load the rows of the selected report for the on-screen preview.
    pub fn preview_report(&mut self) {
        if self.busy.preview {
            return;
        }
        self.busy.preview = true;
        let kind = self.report_filter.kind;
        let date = self.report_filter.date;
        let pool = self.pool.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            match reports::fetch(&pool, kind, date).await {
                Ok(table) => {
                    let _ = tx.send(UiMessage::ReportPreview(table));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed(Operation::PreviewReport, e.user_message()));
                }
            }
        });
    }

    /// Export the selected report. Each click writes a new file.
    pub fn export_report(&mut self, format: ExportFormat) {
        if self.busy.export.is_some() {
            return;
        }
        self.busy.export = Some(format);
        self.notify(ToastLevel::Info, format!("Generando {}...", format.label()));

        let kind = self.report_filter.kind;
        let date = self.report_filter.date;
        let fonts_dir = self.config.export.fonts_dir.clone();
        let open_after = self.config.export.open_after_export;
        let pool = self.pool.clone();
        let capabilities = self.capabilities.clone();
        let downloads = self.downloads.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            let result = export::export_report(
                &pool,
                kind,
                date,
                format,
                &fonts_dir,
                capabilities.as_ref(),
                downloads.as_ref(),
            )
            .await;

            let message = match result {
                Ok(outcome) if open_after => {
                    let path = outcome.path;
                    tokio::task::spawn_blocking(move || open_or_notice(&path))
                        .await
                        .unwrap_or_else(|_| "Archivo guardado.".to_string())
                }
                Ok(outcome) => format!("Archivo guardado en {}", outcome.path.display()),
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed(Operation::ExportReport, e.user_message()));
                    return;
                }
            };
            let _ = tx.send(UiMessage::ExportDone(message));
        });
    }

    /// Save the display name of the signed-in user.
    pub fn save_nombre(&mut self) {
        if self.busy.nombre {
            return;
        }
        let nombre = match validate_nombre(&self.nombre_input) {
            Ok(nombre) => nombre,
            Err(e) => {
                self.notify_error(&e);
                return;
            }
        };
        let uid = match self.session.as_ref().and_then(|s| s.user.as_ref()).map(|u| u.uid()) {
            Some(Ok(uid)) => uid,
            Some(Err(e)) => {
                self.notify_error(&e);
                return;
            }
            None => {
                self.notify(ToastLevel::Error, "No hay una sesión activa.");
                return;
            }
        };

        self.busy.nombre = true;
        let pool = self.pool.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            match db::usuario::update_nombre(&pool, uid, &nombre).await {
                Ok(0) => {
                    let _ = tx.send(UiMessage::Failed(
                        Operation::SaveNombre,
                        AppError::not_found("tu usuario").user_message(),
                    ));
                }
                Ok(_) => {
                    let _ = tx.send(UiMessage::NombreSaved(nombre));
                }
                Err(e) => {
                    let _ = tx.send(UiMessage::Failed(Operation::SaveNombre, AppError::from(e).user_message()));
                }
            }
        });
    }

    /// Switch between light and dark and remember the choice.
    pub fn toggle_theme(&mut self, ctx: &egui::Context) {
        self.config.ui.dark_mode = !self.config.ui.dark_mode;
        apply_theme(ctx, self.config.ui.dark_mode);
        if let Err(e) = AppConfig::save_dark_mode(&self.config_path, self.config.ui.dark_mode) {
            warn!("Could not persist theme: {}", e);
        }
    }

    /// Poll async operation results.
    fn poll_async_results(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                UiMessage::SignedIn(session, perfil) => {
                    self.login = LoginForm::default();
                    self.nombre_input = perfil.nombre.clone().unwrap_or_default();
                    let greeting = format!("¡Bienvenido/a, {}!", perfil.display_name());
                    let needs_name = perfil.needs_name();
                    self.session = Some(*session);
                    self.perfil = Some(perfil);
                    self.current_panel = if needs_name { Panel::Profile } else { Panel::Dashboard };
                    self.notify(ToastLevel::Success, greeting);
                    self.load_productos();
                    self.load_categorias();
                }
                UiMessage::SignInFailed(e) => {
                    self.login.busy = false;
                    self.notify(ToastLevel::Error, e);
                }
                UiMessage::SignedOut => {
                    self.notify(ToastLevel::Info, "Sesión cerrada.");
                }
                UiMessage::ProductosLoaded(rows) => {
                    self.productos = rows;
                    self.busy.productos = false;
                }
                UiMessage::CategoriasLoaded(rows) => {
                    self.categorias = rows;
                }
                UiMessage::EditorLoaded { request_id, producto } => {
                    if request_id != self.editor.request_id {
                        continue;
                    }
                    self.busy.editor_load = false;
                    match producto {
                        Some(p) => {
                            self.editor.draft = ProductoForm::from_producto(&p);
                            self.editor.original = Some(p);
                        }
                        None => {
                            self.notify(ToastLevel::Error, "No se encontró el producto.");
                            self.close_editor();
                        }
                    }
                }
                UiMessage::ProductoUpdated(model) => {
                    self.busy.editor_save = false;
                    self.notify(ToastLevel::Success, format!("Producto '{}' actualizado.", model.nombre));
                    self.load_productos();
                    if self.current_panel == Panel::Editor {
                        self.open_editor(model.id);
                    }
                }
                UiMessage::LookupDone { codigo, lookup } => {
                    if codigo != self.register.form.codigo.trim() {
                        continue;
                    }
                    self.busy.lookup = false;
                    match lookup {
                        Some(Lookup::Existing { id, form }) => {
                            self.register.existing_id = Some(id);
                            self.register.form = form;
                        }
                        Some(Lookup::New(form)) => {
                            if self.register.existing_id.take().is_some() {
                                self.register.form = form;
                            } else {
                                self.register.form.stock = form.stock;
                            }
                        }
                        None => {}
                    }
                }
                UiMessage::ScanDone(result) => {
                    let Some(result) = result else { continue };
                    self.register.scan_message = Some(result.message());
                    match result {
                        ScanResult::Found(p) => {
                            self.register.existing_id = Some(p.id);
                            self.register.form = ProductoForm::from_producto(&p);
                            self.register.last_lookup = self.register.form.codigo.clone();
                        }
                        ScanResult::Missing(codigo) => {
                            self.register.existing_id = None;
                            self.register.form = ProductoForm::blank(&codigo);
                            self.register.last_lookup = codigo;
                        }
                    }
                    self.register.scan_input.clear();
                }
                UiMessage::ImageAttached { codigo, form } => {
                    self.busy.upload = false;
                    if self.register.apply_uploaded_image(&codigo, form) {
                        self.notify(ToastLevel::Success, "Imagen subida. Se agregó una unidad al stock.");
                    } else {
                        self.notify(
                            ToastLevel::Error,
                            format!("La imagen subida era para el código {codigo}; no se aplicó al formulario."),
                        );
                    }
                }
                UiMessage::ProductoSaved(saved) => {
                    self.busy.register = false;
                    self.notify(
                        ToastLevel::Success,
                        format!(
                            "Producto '{}' guardado con {} unidades.",
                            saved.producto.nombre, saved.cantidad
                        ),
                    );
                    self.register.reset();
                    self.load_productos();
                }
                UiMessage::ReportPreview(table) => {
                    self.busy.preview = false;
                    if table.kind == self.report_filter.kind {
                        self.report_filter.preview = Some(table);
                    }
                }
                UiMessage::ExportDone(message) => {
                    self.busy.export = None;
                    self.notify(ToastLevel::Success, message);
                }
                UiMessage::NombreSaved(nombre) => {
                    self.busy.nombre = false;
                    if let Some(perfil) = &mut self.perfil {
                        perfil.nombre = Some(nombre.clone());
                    }
                    self.nombre_input = nombre;
                    self.notify(ToastLevel::Success, "Nombre actualizado.");
                }
                UiMessage::Failed(op, e) => {
                    if let Operation::LoadEditor { request_id } = op
                        && request_id != self.editor.request_id
                    {
                        continue;
                    }
                    if op == Operation::Lookup {
                        self.register.last_lookup.clear();
                    }
                    self.busy.release(op);
                    self.notify(ToastLevel::Error, e);
                }
            }
        }
    }

    fn is_busy(&self) -> bool {
        self.login.busy || self.busy.any()
    }

    /// Render menu bar.
    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Nexa Inventario");
                ui.separator();
                ui.label(self.current_panel.name());

                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    let icon = if self.config.ui.dark_mode { SUN } else { MOON };
                    if ui.button(icon).on_hover_text("Cambiar tema").clicked() {
                        self.toggle_theme(ctx);
                    }

                    if self.is_signed_in() {
                        if ui.button(format!("{SIGN_OUT} Cerrar sesión")).clicked() {
                            self.sign_out();
                        }
                        if let Some(perfil) = &self.perfil {
                            ui.label(perfil.display_name());
                        }
                    }
                });
            });
        });
    }

    /// Render status bar (display only, no interaction).
    fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar")
            .min_height(28.0)
            .show(ctx, |ui| {
                ui.disable();
                ui.horizontal(|ui| {
                    let (color, text) = if self.is_signed_in() {
                        (colors::SUCCESS, "Conectado")
                    } else {
                        (colors::NEUTRAL, "Sin sesión")
                    };
                    ui.colored_label(color, text);

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if self.is_busy() {
                            ui.spinner();
                        }
                        if self.is_signed_in() {
                            ui.label(format!("{} productos", self.productos.len()));
                        }
                    });
                });
            });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll async results
        self.poll_async_results();

        // Request repaint during async operations
        if self.is_busy() {
            ctx.request_repaint();
        }

        self.show_menu_bar(ctx);
        self.show_status_bar(ctx);
        show_toasts(ctx, &mut self.toasts);

        if !self.is_signed_in() && self.current_panel != Panel::Login {
            self.current_panel = Panel::Login;
        }

        // Main content
        egui::CentralPanel::default().show(ctx, |ui| match self.current_panel {
            Panel::Login => login_panel::show(self, ui),
            Panel::Dashboard => {
                if let Some(next) = dashboard::show(self, ui) {
                    self.current_panel = next;
                }
            }
            Panel::Products => {
                if products_panel::show(self, ui) {
                    self.current_panel = Panel::Dashboard;
                }
            }
            Panel::Editor => {
                if editor_panel::show(self, ui) {
                    self.close_editor();
                }
            }
            Panel::Register => {
                if register_panel::show(self, ui) {
                    self.current_panel = Panel::Dashboard;
                }
            }
            Panel::Reports => {
                if reports_panel::show(self, ui) {
                    self.current_panel = Panel::Dashboard;
                }
            }
            Panel::Profile => {
                if profile_panel::show(self, ui) {
                    self.current_panel = Panel::Dashboard;
                }
            }
        });
    }
}

/// Apply the light or dark visuals.
pub fn apply_theme(ctx: &egui::Context, dark_mode: bool) {
    ctx.set_visuals(if dark_mode {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    });
}

/// Make sure the session carries its user, then admit it.
async fn admit_session(
    pool: &DatabaseConnection,
    auth: &AuthClient,
    capabilities: &DesktopCapabilities,
    mut session: Session,
) -> crate::Result<(Session, Perfil)> {
    if session.user.as_ref().is_none_or(|u| u.email.is_none()) {
        session.user = Some(auth.get_user(&session).await?);
    }

    let gate = AccessGate {
        db: pool,
        auth,
        capabilities,
    };
    let perfil = gate.admit(&session).await?;
    Ok((session, perfil))
}

fn signed_in_message(result: crate::Result<(Session, Perfil)>) -> UiMessage {
    match result {
        Ok((session, perfil)) => UiMessage::SignedIn(Box::new(session), perfil),
        Err(e) => UiMessage::SignInFailed(e.user_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_filter_set_date_syncs_input() {
        let mut filter = ReportFilter::default();
        filter.set_date(NaiveDate::from_ymd_opt(2026, 10, 12).unwrap());
        assert_eq!(filter.date_input, "2026-10-12");
        assert!(filter.preview.is_none());
    }

    #[test]
    fn test_sign_in_failure_message_is_user_text() {
        let msg = signed_in_message(Err(AppError::AccessDenied(
            crate::auth::NOT_ENABLED_MESSAGE.to_string(),
        )));
        match msg {
            UiMessage::SignInFailed(text) => assert_eq!(text, crate::auth::NOT_ENABLED_MESSAGE),
            _ => panic!("expected SignInFailed"),
        }
    }

    #[test]
    fn test_failure_releases_only_its_own_operation() {
        let mut busy = InFlight {
            editor_load: true,
            register: true,
            export: Some(ExportFormat::Pdf),
            ..InFlight::default()
        };

        busy.release(Operation::LoadEditor { request_id: 3 });
        assert!(!busy.editor_load);
        assert!(busy.register);
        assert_eq!(busy.export, Some(ExportFormat::Pdf));

        busy.release(Operation::Scan);
        busy.release(Operation::LoadCategorias);
        assert!(busy.register);
        assert!(busy.any());

        busy.release(Operation::SaveRegister);
        busy.release(Operation::ExportReport);
        assert!(!busy.any());
    }

    #[test]
    fn test_uploaded_image_applies_to_same_code_only() {
        let mut register = RegisterState::default();
        register.form.codigo = "7791234567890".to_string();
        register.form.stock = 2;

        let mut uploaded = register.form.clone();
        uploaded.imagen_url = Some("https://demo/foto.jpg".to_string());
        uploaded.stock = 3;

        register.form.codigo = "1111222233334".to_string();
        assert!(!register.apply_uploaded_image("7791234567890", uploaded.clone()));
        assert!(register.form.imagen_url.is_none());
        assert_eq!(register.form.stock, 2);

        register.form.codigo = "7791234567890".to_string();
        assert!(register.apply_uploaded_image("7791234567890", uploaded));
        assert_eq!(register.form.imagen_url.as_deref(), Some("https://demo/foto.jpg"));
        assert_eq!(register.form.stock, 3);
    }
}
