//! Dashboard aggregation over the loaded product list.

use std::collections::BTreeMap;

use crate::models::{Disponibilidad, ProductoConStock};

/// Product count per availability tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisponibilidadSummary {
    pub sin_stock: usize,
    pub baja: usize,
    pub media: usize,
    pub alta: usize,
}

impl DisponibilidadSummary {
    pub fn from_productos(rows: &[ProductoConStock]) -> Self {
        rows.iter().fold(Self::default(), |mut acc, p| {
            match p.disponibilidad() {
                Disponibilidad::SinStock => acc.sin_stock += 1,
                Disponibilidad::Baja => acc.baja += 1,
                Disponibilidad::Media => acc.media += 1,
                Disponibilidad::Alta => acc.alta += 1,
            }
            acc
        })
    }

    pub fn count(&self, tier: Disponibilidad) -> usize {
        match tier {
            Disponibilidad::SinStock => self.sin_stock,
            Disponibilidad::Baja => self.baja,
            Disponibilidad::Media => self.media,
            Disponibilidad::Alta => self.alta,
        }
    }

    pub fn total(&self) -> usize {
        self.sin_stock + self.baja + self.media + self.alta
    }
}

/// One slice of the condition pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct EstadoShare {
    pub estado: String,
    pub cantidad: usize,
    pub porcentaje: f64,
}

/// Products per condition with their share of the total, largest first.
///
/// Spelling variants ("usado", "Usado") are merged; missing conditions are
/// grouped as "Sin estado".
pub fn estado_distribution(rows: &[ProductoConStock]) -> Vec<EstadoShare> {
    let mut grouped: BTreeMap<String, usize> = BTreeMap::new();
    for producto in rows {
        let key = match producto.estado_producto() {
            Some(estado) => estado.as_str().to_string(),
            None => match producto.estado.as_deref().map(str::trim) {
                Some(e) if !e.is_empty() => e.to_string(),
                _ => "Sin estado".to_string(),
            },
        };
        *grouped.entry(key).or_default() += 1;
    }

    let total = rows.len().max(1) as f64;
    let mut shares: Vec<EstadoShare> = grouped
        .into_iter()
        .map(|(estado, cantidad)| EstadoShare {
            estado,
            cantidad,
            porcentaje: cantidad as f64 * 100.0 / total,
        })
        .collect();
    shares.sort_by(|a, b| b.cantidad.cmp(&a.cantidad).then_with(|| a.estado.cmp(&b.estado)));
    shares
}

/// The `n` products with the most units, descending.
pub fn top_by_stock(rows: &[ProductoConStock], n: usize) -> Vec<&ProductoConStock> {
    let mut sorted: Vec<&ProductoConStock> = rows.iter().collect();
    sorted.sort_by(|a, b| b.cantidad.cmp(&a.cantidad).then_with(|| a.nombre.cmp(&b.nombre)));
    sorted.truncate(n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::producto::fixtures::producto;

    fn rows() -> Vec<ProductoConStock> {
        vec![
            producto(1, "Toner", "Nuevo", 20),
            producto(2, "Monitor", "usado", 3),
            producto(3, "Impresora", "Mal estado", 0),
            producto(4, "Torre", "Usado", 10),
            producto(5, "Mouse", "", 16),
        ]
    }

    #[test]
    fn test_summary_counts() {
        let summary = DisponibilidadSummary::from_productos(&rows());
        assert_eq!(summary.sin_stock, 1);
        assert_eq!(summary.baja, 1);
        assert_eq!(summary.media, 1);
        assert_eq!(summary.alta, 2);
        assert_eq!(summary.total(), 5);
        assert_eq!(summary.count(Disponibilidad::Alta), 2);
    }

    #[test]
    fn test_estado_distribution_merges_spellings() {
        let shares = estado_distribution(&rows());
        assert_eq!(shares[0].estado, "Usado");
        assert_eq!(shares[0].cantidad, 2);
        assert!((shares[0].porcentaje - 40.0).abs() < f64::EPSILON);
        assert!(shares.iter().any(|s| s.estado == "Sin estado"));

        let total: f64 = shares.iter().map(|s| s.porcentaje).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_estado_distribution_empty() {
        assert!(estado_distribution(&[]).is_empty());
    }

    #[test]
    fn test_top_by_stock() {
        let rows = rows();
        let top: Vec<i32> = top_by_stock(&rows, 3).iter().map(|p| p.id).collect();
        assert_eq!(top, vec![1, 5, 4]);
        assert_eq!(top_by_stock(&rows, 10).len(), 5);
    }
}
