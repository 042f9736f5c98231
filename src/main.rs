//! Nexa Inventario - desktop inventory client for products, stock and reports.

use std::path::PathBuf;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use eframe::egui;
use nexa_inventario as app;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use app::calendar::flexible_date;
use app::config::{AppConfig, ConfigLoadResult};
use app::db;
use app::download::{FolderDownload, download_base64, open_or_notice};
use app::export::{ExportFormat, export_report};
use app::permissions::DesktopCapabilities;
use app::reports::ReportKind;
use app::ui::{App, SetupApp, SetupWizard, apply_theme};

/// Desktop inventory client for products, stock and reports.
#[derive(Parser)]
#[command(name = "nexa-inventario", version)]
struct Cli {
    /// Use config.toml from current directory (dev mode)
    #[arg(long)]
    dev: bool,

    /// Open the setup wizard even when the config is valid
    #[arg(long)]
    setup: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a report without opening the window
    Export {
        /// Report to generate
        #[arg(long, value_enum)]
        report: ReportKind,

        /// Output format
        #[arg(long, value_enum, default_value = "pdf")]
        format: ExportFormat,

        /// Any day of the week or month to report (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Destination folder (default: configured export folder)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Open the file with the system viewer when done
        #[arg(long)]
        open: bool,
    },

    /// List active products whose name contains a text
    Buscar {
        /// Text to look for, case-insensitive
        term: String,
    },

    /// Save a base64 payload read from stdin without overwriting files
    Guardar {
        /// Name of the file to create
        file_name: String,

        /// MIME type of the payload
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,

        /// Destination folder (default: configured export folder)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Application launch mode.
enum LaunchMode {
    /// Normal operation with valid config.
    Normal(AppConfig),
    /// Setup wizard for first run or invalid config.
    Setup(SetupWizard, Option<String>),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Determine config path based on mode
    let config_path = if cli.dev {
        PathBuf::from("config.toml")
    } else {
        AppConfig::default_path()
    };

    let loaded = AppConfig::try_load(&config_path);
    let log_to_file = matches!(&loaded, ConfigLoadResult::Loaded(c) if c.logging.file);
    let _log_guard = init_logging(log_to_file);

    tracing::info!("Nexa Inventario {} starting...", env!("CARGO_PKG_VERSION"));
    if cli.dev {
        tracing::info!("Dev mode: loading config from current directory");
    }
    tracing::info!("Config path: {:?}", config_path);

    let launch_mode = match loaded {
        ConfigLoadResult::Loaded(_) if cli.setup => {
            tracing::info!("Setup requested, opening wizard with current config");
            // The wizard saves what it edits, so start from the file without env overrides.
            let on_disk = AppConfig::read_file(&config_path).unwrap_or_default();
            LaunchMode::Setup(SetupWizard::with_config(on_disk), None)
        }
        ConfigLoadResult::Loaded(config) => {
            tracing::info!("Config loaded successfully");
            LaunchMode::Normal(config)
        }
        ConfigLoadResult::Missing => {
            tracing::info!("Config missing, starting setup wizard");
            LaunchMode::Setup(SetupWizard::new(), None)
        }
        ConfigLoadResult::Invalid(e) => {
            tracing::warn!("Config invalid: {}", e);
            LaunchMode::Setup(SetupWizard::new(), Some(e.to_string()))
        }
    };

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    match (launch_mode, cli.command) {
        (LaunchMode::Normal(config), Some(Command::Export { report, format, date, output, open })) => {
            run_export(rt, config, report, format, date, output, open)
        }
        (LaunchMode::Normal(config), Some(Command::Buscar { term })) => run_search(rt, config, &term),
        (LaunchMode::Normal(config), Some(Command::Guardar { file_name, mime, output })) => {
            run_save_payload(config, &file_name, &mime, output)
        }
        (LaunchMode::Setup(_, error), Some(_)) => bail!(
            "No hay una configuración válida en {}: {}",
            config_path.display(),
            error.unwrap_or_else(|| "archivo no encontrado".to_string())
        ),
        (LaunchMode::Normal(config), None) => run_main_app(rt, config, config_path),
        (LaunchMode::Setup(wizard, error), None) => run_setup_wizard(rt, wizard, error, config_path),
    }
}

/// Console logging, plus a daily file in the data directory when enabled.
fn init_logging(to_file: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = if to_file {
        let appender = tracing_appender::rolling::daily(AppConfig::data_dir().join("logs"), "nexa-inventario.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Run the setup wizard.
fn run_setup_wizard(
    rt: tokio::runtime::Runtime,
    wizard: SetupWizard,
    initial_error: Option<String>,
    config_path: PathBuf,
) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Nexa Inventario - Configuración")
            .with_inner_size([640.0, 560.0])
            .with_min_inner_size([520.0, 440.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "Nexa Inventario - Configuración",
        options,
        Box::new(|_cc| Ok(Box::new(SetupApp::new(wizard, initial_error, config_path, rt)))),
    )
    .map_err(|e| anyhow!("Setup window failed: {e}"))
}

/// Run the main application.
fn run_main_app(rt: tokio::runtime::Runtime, config: AppConfig, config_path: PathBuf) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Nexa Inventario")
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    let pool = rt.block_on(connect_and_report(&config))?;

    let dark_mode = config.ui.dark_mode;
    let app = App::new(pool, config, config_path, rt)?;

    eframe::run_native(
        "Nexa Inventario",
        options,
        Box::new(move |cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            apply_theme(&cc.egui_ctx, dark_mode);
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("Main window failed: {e}"))
}

/// Generate one report from the command line.
fn run_export(
    rt: tokio::runtime::Runtime,
    mut config: AppConfig,
    report: ReportKind,
    format: ExportFormat,
    date: Option<String>,
    output: Option<PathBuf>,
    open: bool,
) -> anyhow::Result<()> {
    let date = match date {
        Some(input) => flexible_date(&input)?,
        None => chrono::Local::now().date_naive(),
    };
    if output.is_some() {
        config.export.output_dir = output;
    }

    let capabilities = DesktopCapabilities::new(&config.export, &config.permissions);
    let downloads = FolderDownload::new(config.export.resolved_output_dir());

    let outcome = rt.block_on(async {
        let pool = connect_and_report(&config).await?;
        let outcome = export_report(
            &pool,
            report,
            date,
            format,
            &config.export.fonts_dir,
            &capabilities,
            &downloads,
        )
        .await?;
        anyhow::Ok(outcome)
    })?;

    if open {
        println!("{}", open_or_notice(&outcome.path));
    } else {
        println!("{}", outcome.path.display());
    }
    Ok(())
}

/// Print the active products matching `term`.
fn run_search(rt: tokio::runtime::Runtime, config: AppConfig, term: &str) -> anyhow::Result<()> {
    let productos = rt.block_on(async {
        let pool = connect_and_report(&config).await?;
        let productos = db::producto::search_by_name(&pool, term).await?;
        anyhow::Ok(productos)
    })?;

    if productos.is_empty() {
        println!("No hay productos que coincidan con '{}'.", term.trim());
        return Ok(());
    }
    for p in &productos {
        println!(
            "{:<16} {:<40} {:>6}  {}",
            p.codigo_barras.as_deref().unwrap_or("-"),
            p.nombre,
            p.cantidad,
            p.disponibilidad().label()
        );
    }
    Ok(())
}

/// Decode base64 from stdin into the export folder.
fn run_save_payload(mut config: AppConfig, file_name: &str, mime: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    if output.is_some() {
        config.export.output_dir = output;
    }
    let payload = std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?;

    let downloads = FolderDownload::new(config.export.resolved_output_dir());
    let outcome = download_base64(&downloads, file_name, &payload, mime)?;
    if !outcome.success {
        bail!("El contenido recibido no es base64 válido");
    }
    println!("{}", outcome.path.display());
    Ok(())
}

/// Connect to the database and log what it holds.
async fn connect_and_report(config: &AppConfig) -> anyhow::Result<sea_orm::DatabaseConnection> {
    let conn = db::connect(&config.database.connection_string())
        .await
        .context("Failed to connect to database")?;

    if let Ok(version) = db::get_version(&conn).await {
        tracing::info!("PostgreSQL: {}", version);
    }

    if let Ok(counts) = db::get_table_counts(&conn).await {
        tracing::info!(
            "Tables: {} productos, {} stock, {} usuarios, {} categorias",
            counts.productos,
            counts.stock,
            counts.usuarios,
            counts.categorias
        );
    }

    Ok(conn)
}
