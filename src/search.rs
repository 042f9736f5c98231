//! Client-side product search.

use crate::models::ProductoConStock;

/// Rows whose name, condition or availability contains `term`, ignoring case.
///
/// A blank term returns every row. Order is preserved.
pub fn filter_productos<'a>(rows: &'a [ProductoConStock], term: &str) -> Vec<&'a ProductoConStock> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return rows.iter().collect();
    }

    rows.iter().filter(|p| matches(p, &needle)).collect()
}

fn matches(producto: &ProductoConStock, needle: &str) -> bool {
    let disponibilidad = producto.disponibilidad();
    producto.nombre.to_lowercase().contains(needle)
        || producto
            .estado
            .as_deref()
            .is_some_and(|e| e.to_lowercase().contains(needle))
        || disponibilidad.label().to_lowercase().contains(needle)
        || disponibilidad.description().to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::producto::fixtures::producto;

    fn rows() -> Vec<ProductoConStock> {
        vec![
            producto(1, "Toner HP 85A", "Nuevo", 20),
            producto(2, "Monitor Samsung", "Usado", 3),
            producto(3, "Impresora Epson", "Mal estado", 0),
            producto(4, "Torre Dell", "usado", 10),
        ]
    }

    fn ids(found: Vec<&ProductoConStock>) -> Vec<i32> {
        found.into_iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_blank_term_returns_all_in_order() {
        let rows = rows();
        assert_eq!(ids(filter_productos(&rows, "   ")), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_matches_name_ignoring_case() {
        let rows = rows();
        assert_eq!(ids(filter_productos(&rows, "MONITOR")), vec![2]);
    }

    #[test]
    fn test_matches_estado() {
        let rows = rows();
        assert_eq!(ids(filter_productos(&rows, "usado")), vec![2, 4]);
    }

    #[test]
    fn test_matches_disponibilidad_label() {
        let rows = rows();
        assert_eq!(ids(filter_productos(&rows, "sin stock")), vec![3]);
        assert_eq!(ids(filter_productos(&rows, "alta")), vec![1]);
        assert_eq!(ids(filter_productos(&rows, "Baja")), vec![2]);
    }

    #[test]
    fn test_result_is_subset() {
        let rows = rows();
        let found = filter_productos(&rows, "e");
        assert!(found.iter().all(|p| rows.iter().any(|r| r.id == p.id)));
        assert!(found.len() <= rows.len());
    }
}
