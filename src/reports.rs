//! Filtered tabular reports.
//!
//! Each [`ReportKind`] is a filter over the product list plus a fixed column
//! layout. [`build`] is pure so the same table feeds the PDF and the
//! spreadsheet renderers.

use std::fmt;

use chrono::NaiveDate;
use clap::ValueEnum;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::calendar;
use crate::db;
use crate::error::Result;
use crate::models::{EstadoProducto, ProductoConStock};

/// The report screens offered in the reports menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ReportKind {
    /// Every stored product.
    Productos,
    /// Products in new condition.
    Nuevos,
    /// Used products.
    Usados,
    /// Products in bad condition.
    MalEstado,
    /// Products registered during one ISO week.
    Semana,
    /// Products registered during one calendar month.
    Mes,
    /// Stock snapshot, lowest quantity first.
    StockMensual,
}

/// Period a report is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodKind {
    None,
    Week,
    Month,
}

/// One table cell. Quantities stay numeric in spreadsheets.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

/// Rendered-ready report: title, headers, rows and optional footer.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub kind: ReportKind,
    pub title: String,
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub footer: Option<String>,
    pub file_prefix: String,
}

impl ReportTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

impl ReportKind {
    pub const ALL: [ReportKind; 7] = [
        Self::Productos,
        Self::Nuevos,
        Self::Usados,
        Self::MalEstado,
        Self::Semana,
        Self::Mes,
        Self::StockMensual,
    ];

    /// Menu entry.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Productos => "Productos almacenados",
            Self::Nuevos => "Productos nuevos",
            Self::Usados => "Productos usados",
            Self::MalEstado => "Productos en mal estado",
            Self::Semana => "Registros por semana",
            Self::Mes => "Registros por mes",
            Self::StockMensual => "Stock mensual",
        }
    }

    pub fn period(&self) -> PeriodKind {
        match self {
            Self::Semana => PeriodKind::Week,
            Self::Mes | Self::StockMensual => PeriodKind::Month,
            _ => PeriodKind::None,
        }
    }

    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            Self::Productos | Self::Usados | Self::StockMensual => {
                &["Código", "Nombre", "Cantidad", "Estado", "Categoría"]
            }
            Self::Nuevos => &["Código", "Nombre", "Marca", "Stock", "Fecha Ingreso"],
            Self::MalEstado => &["Código", "Nombre", "Estado", "Marca", "Cantidad"],
            Self::Semana => &["Código", "Nombre", "Marca", "Modelo", "Fecha"],
            Self::Mes => &["Código", "Nombre", "Marca", "Fecha de Registro"],
        }
    }

    fn sheet_name(&self) -> &'static str {
        match self {
            Self::Productos => "Productos",
            Self::Nuevos => "Nuevos",
            Self::Usados => "Usados",
            Self::MalEstado => "Mal Estado",
            Self::Semana => "Semana",
            Self::Mes => "Registros",
            Self::StockMensual => "Stock",
        }
    }

    fn title(&self, date: NaiveDate) -> String {
        match self {
            Self::Productos => "Reporte de Productos".to_string(),
            Self::Nuevos => "Reporte de Productos Nuevos".to_string(),
            Self::Usados => "Reporte de Productos Usados".to_string(),
            Self::MalEstado => "Reporte de Productos en Mal Estado".to_string(),
            Self::Semana => format!("Reporte de registros semanales ({})", calendar::week_label(date)),
            Self::Mes => format!("Reporte de Registros ({})", calendar::month_label(date)),
            Self::StockMensual => format!("Reporte de Stock Mensual ({})", calendar::month_label(date)),
        }
    }

    fn footer(&self, date: NaiveDate) -> Option<String> {
        match self {
            Self::Semana => {
                Some("Este reporte muestra los productos registrados durante la semana indicada.".to_string())
            }
            Self::Mes => Some(format!(
                "Este reporte corresponde a los productos registrados durante {}.",
                calendar::month_label(date)
            )),
            Self::StockMensual => Some(format!(
                "Este reporte corresponde al mes de {}.\nLos productos con menor stock aparecen arriba.",
                calendar::month_label(date)
            )),
            _ => None,
        }
    }

    fn file_prefix(&self, date: NaiveDate) -> String {
        let slug = |label: String| label.to_lowercase().replace(' ', "_");
        match self {
            Self::Productos => "reporte_productos".to_string(),
            Self::Nuevos => "reporte_nuevos".to_string(),
            Self::Usados => "reporte_productos_usados".to_string(),
            Self::MalEstado => "reporte_mal_estado".to_string(),
            Self::Semana => {
                let (year, week) = calendar::iso_week(date);
                format!("reporte_registros_semana_{year}-W{week:02}")
            }
            Self::Mes => format!("reporte_registros_{}", slug(calendar::month_label(date))),
            Self::StockMensual => format!("reporte_stock_{}", slug(calendar::month_label(date))),
        }
    }

    /// Inclusive date range the rows must have been registered in.
    pub fn created_range(&self, date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            Self::Semana => Some(calendar::week_range(date)),
            Self::Mes => Some(calendar::month_range(date)),
            _ => None,
        }
    }

    fn keeps(&self, producto: &ProductoConStock, date: NaiveDate) -> bool {
        if !producto.activo {
            return false;
        }
        let estado = producto.estado_producto();
        match self {
            Self::Productos | Self::StockMensual => true,
            Self::Nuevos => estado == Some(EstadoProducto::Nuevo),
            Self::Usados => estado == Some(EstadoProducto::Usado),
            Self::MalEstado => estado == Some(EstadoProducto::MalEstado),
            Self::Semana | Self::Mes => self
                .created_range(date)
                .is_some_and(|(start, end)| (start..=end).contains(&producto.created_at.date_naive())),
        }
    }

    fn row(&self, p: &ProductoConStock) -> Vec<Cell> {
        let text = |value: Option<&str>, fallback: &str| {
            Cell::Text(
                value
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .unwrap_or(fallback)
                    .to_string(),
            )
        };
        let codigo = text(p.codigo_barras.as_deref(), "-");
        let nombre = Cell::Text(p.nombre.clone());
        let marca = text(p.marca.as_deref(), "-");
        let cantidad = Cell::Int(i64::from(p.cantidad));
        let estado = text(p.estado.as_deref(), "Desconocido");
        let categoria = text(p.categoria.as_deref(), "General");
        let fecha = Cell::Text(calendar::format_fecha(p.created_at.date_naive()));

        match self {
            Self::Productos | Self::Usados | Self::StockMensual => {
                vec![codigo, nombre, cantidad, estado, categoria]
            }
            Self::Nuevos => vec![codigo, nombre, marca, cantidad, fecha],
            Self::MalEstado => vec![codigo, nombre, estado, marca, cantidad],
            Self::Semana => vec![codigo, nombre, marca, text(p.modelo.as_deref(), "-"), fecha],
            Self::Mes => vec![codigo, nombre, marca, fecha],
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Filter and map `productos` into the table for `kind`.
///
/// Inactive products never appear in a report. `date` picks the week or month for period reports; other kinds ignore it
/// except for labels.
pub fn build(kind: ReportKind, date: NaiveDate, productos: &[ProductoConStock]) -> ReportTable {
    let mut selected: Vec<&ProductoConStock> = productos.iter().filter(|p| kind.keeps(p, date)).collect();

    match kind {
        ReportKind::StockMensual => selected.sort_by(|a, b| a.cantidad.cmp(&b.cantidad)),
        ReportKind::Semana | ReportKind::Mes => selected.sort_by_key(|p| p.created_at),
        _ => {}
    }

    ReportTable {
        kind,
        title: kind.title(date),
        sheet_name: kind.sheet_name().to_string(),
        headers: kind.headers().iter().map(|h| h.to_string()).collect(),
        rows: selected.into_iter().map(|p| kind.row(p)).collect(),
        footer: kind.footer(date),
        file_prefix: kind.file_prefix(date),
    }
}

/// Read the rows for `kind` from the store and build the table.
pub async fn fetch(db: &DatabaseConnection, kind: ReportKind, date: NaiveDate) -> Result<ReportTable> {
    let productos = match kind.created_range(date) {
        Some((start, end)) => db::producto::list_created_between(db, start, end).await?,
        None => db::producto::list_with_stock(db).await?,
    };

    let table = build(kind, date, &productos);
    info!("Report '{}' built with {} rows", kind, table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::producto::fixtures::producto;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rows() -> Vec<ProductoConStock> {
        let mut old = producto(4, "Torre Dell", "Mal estado", 12);
        old.created_at = Utc.with_ymd_and_hms(2026, 9, 30, 10, 0, 0).unwrap();
        vec![
            producto(1, "Toner 85A", "nuevo", 20),
            producto(2, "Monitor 24", "Usado", 3),
            producto(3, "Impresora L3250", "mal estado", 0),
            old,
        ]
    }

    fn nombres(table: &ReportTable) -> Vec<String> {
        table.rows.iter().map(|r| r[1].to_string()).collect()
    }

    #[test]
    fn test_estado_filters_ignore_case() {
        let rows = rows();
        let day = date(2026, 10, 17);
        assert_eq!(nombres(&build(ReportKind::Nuevos, day, &rows)), vec!["Toner 85A"]);
        assert_eq!(nombres(&build(ReportKind::Usados, day, &rows)), vec!["Monitor 24"]);
        assert_eq!(
            nombres(&build(ReportKind::MalEstado, day, &rows)),
            vec!["Impresora L3250", "Torre Dell"]
        );
    }

    #[test]
    fn test_week_and_month_filters() {
        let rows = rows();
        let week = build(ReportKind::Semana, date(2026, 10, 17), &rows);
        assert_eq!(week.len(), 3);
        assert!(week.footer.is_some());
        assert_eq!(week.file_prefix, "reporte_registros_semana_2026-W42");

        let september = build(ReportKind::Mes, date(2026, 9, 1), &rows);
        assert_eq!(nombres(&september), vec!["Torre Dell"]);
        assert_eq!(september.rows[0][3], Cell::Text("30/09/2026".to_string()));
        assert_eq!(september.file_prefix, "reporte_registros_septiembre_2026");
    }

    #[test]
    fn test_stock_mensual_ascending() {
        let table = build(ReportKind::StockMensual, date(2026, 10, 17), &rows());
        let cantidades: Vec<Cell> = table.rows.iter().map(|r| r[2].clone()).collect();
        assert_eq!(cantidades, vec![Cell::Int(0), Cell::Int(3), Cell::Int(12), Cell::Int(20)]);
        assert_eq!(table.title, "Reporte de Stock Mensual (Octubre 2026)");
    }

    #[test]
    fn test_empty_report_keeps_headers() {
        let table = build(ReportKind::Usados, date(2026, 10, 17), &[]);
        assert!(table.is_empty());
        assert_eq!(table.headers, vec!["Código", "Nombre", "Cantidad", "Estado", "Categoría"]);
    }

    #[test]
    fn test_rows_match_header_width() {
        let rows = rows();
        for kind in ReportKind::ALL {
            let table = build(kind, date(2026, 10, 17), &rows);
            assert!(table.rows.iter().all(|r| r.len() == table.headers.len()), "{kind}");
        }
    }

    #[test]
    fn test_inactive_products_are_left_out_of_every_report() {
        let mut retired = producto(5, "Escáner retirado", "Usado", 9);
        retired.activo = false;
        let mut rows = rows();
        rows.push(retired);

        for kind in ReportKind::ALL {
            let table = build(kind, date(2026, 10, 17), &rows);
            assert!(!nombres(&table).contains(&"Escáner retirado".to_string()), "{kind}");
        }
    }
}
