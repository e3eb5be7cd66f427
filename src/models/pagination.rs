use serde::Serialize;

/// Estado de paginación de un listado
///
/// Las páginas empiezan en 1. `total_pages` es `ceil(total / limit)`, o 1 si
/// no hay resultados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn new(total: u64, page: u32, limit: u32) -> Self {
        Self {
            total,
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Paginación vacía para un tamaño de página
    pub fn empty(limit: u32) -> Self {
        Self::new(0, 1, limit)
    }

    pub fn total_pages(&self) -> u32 {
        if self.total == 0 {
            return 1;
        }
        let limit = u64::from(self.limit);
        let pages = self.total.div_ceil(limit);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn offset(&self) -> u64 {
        offset_for(self.page, self.limit)
    }

    pub fn contains_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages()
    }
}

/// Desplazamiento para una página (base 1) y un tamaño de página
pub fn offset_for(page: u32, limit: u32) -> u64 {
    u64::from(page.max(1) - 1) * u64::from(limit.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_and_has_next() {
        let first = Pagination::new(45, 1, 20);
        assert_eq!(first.total_pages(), 3);
        assert!(first.has_next());
        assert!(!first.has_prev());

        let second = Pagination::new(45, 2, 20);
        assert!(second.has_next());
        assert!(second.has_prev());

        let third = Pagination::new(45, 3, 20);
        assert!(!third.has_next());
        assert!(third.has_prev());
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let pagination = Pagination::empty(10);
        assert_eq!(pagination.total_pages(), 1);
        assert!(!pagination.has_next());
        assert!(!pagination.has_prev());
    }

    #[test]
    fn test_exact_multiple() {
        let pagination = Pagination::new(40, 2, 20);
        assert_eq!(pagination.total_pages(), 2);
        assert!(!pagination.has_next());
    }

    #[test]
    fn test_huge_total_does_not_overflow() {
        assert_eq!(Pagination::new(u64::MAX, 1, 10).total_pages(), u32::MAX);
        assert_eq!(Pagination::new(u64::MAX, 1, 1).total_pages(), u32::MAX);
    }

    #[test]
    fn test_offset() {
        assert_eq!(Pagination::new(100, 1, 10).offset(), 0);
        assert_eq!(Pagination::new(100, 3, 10).offset(), 20);
        assert_eq!(offset_for(0, 10), 0);
    }

    #[test]
    fn test_contains_page() {
        let pagination = Pagination::new(45, 1, 20);
        assert!(pagination.contains_page(3));
        assert!(!pagination.contains_page(0));
        assert!(!pagination.contains_page(4));
    }
}
