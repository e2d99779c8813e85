//! Pagination of listings
//!
//! Pages are 1-based, the size is the maximum number of records per page

use serde::Serialize;

/// Page used when none is requested
pub const DEFAULT_PAGE: u32 = 1;

/// Size used when none is requested
pub const DEFAULT_SIZE: u32 = 10;

/// Largest allowed size
pub const MAX_SIZE: u32 = 100;

/// Requested page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationParams {
    /// 1-based page number
    pub page: u32,

    /// Records per page
    pub size: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_SIZE,
        }
    }
}

impl PaginationParams {
    /// Create the params, falling back to the defaults for anything not given
    pub fn new(page: Option<u32>, size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE),
            size: size.unwrap_or(DEFAULT_SIZE),
        }
    }

    /// Check the bounds of the page and size
    ///
    /// The error is the field-level description of the first violation
    pub fn validate(&self) -> Result<(), String> {
        if self.page < 1 {
            return Err(String::from("page: must be at least 1"));
        }

        if self.size < 1 || self.size > MAX_SIZE {
            return Err(format!("size: must be between 1 and {MAX_SIZE}"));
        }

        Ok(())
    }

    /// Number of records to skip
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.size)
    }

    /// Number of records to take
    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }
}

/// Information about a served page
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PaginationMeta {
    /// Number of records over all pages
    pub total: u64,

    /// The served page
    pub page: u32,

    /// The requested size
    pub size: u32,

    /// Number of pages needed for all records
    pub total_pages: u64,
}

impl PaginationMeta {
    /// Describe the page `params` points to, out of `total` records
    pub fn new(params: &PaginationParams, total: u64) -> Self {
        let size = u64::from(params.size.max(1));

        Self {
            total,
            page: params.page,
            size: params.size,
            total_pages: total.div_ceil(size),
        }
    }
}

/// A page of records with its metadata
#[derive(Clone, Debug)]
pub struct Page<T> {
    /// Records on this page, in a stable order
    pub records: Vec<T>,

    /// Where this page sits among all records
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PaginationParams::new(None, None);
        assert_eq!(PaginationParams::default(), params);
        assert_eq!(0, params.offset());
        assert_eq!(10, params.limit());
    }

    #[test]
    fn test_offset() {
        let params = PaginationParams::new(Some(3), Some(25));
        assert_eq!(50, params.offset());
        assert_eq!(25, params.limit());
    }

    #[test]
    fn test_validate() {
        assert!(PaginationParams { page: 1, size: 1 }.validate().is_ok());
        assert!(PaginationParams { page: 9, size: 100 }.validate().is_ok());

        assert_eq!(
            Err("page: must be at least 1".to_string()),
            PaginationParams { page: 0, size: 10 }.validate()
        );
        assert_eq!(
            Err("size: must be between 1 and 100".to_string()),
            PaginationParams { page: 1, size: 0 }.validate()
        );
        assert_eq!(
            Err("size: must be between 1 and 100".to_string()),
            PaginationParams { page: 1, size: 101 }.validate()
        );
    }

    #[test]
    fn test_total_pages() {
        let params = PaginationParams { page: 1, size: 3 };

        assert_eq!(0, PaginationMeta::new(&params, 0).total_pages);
        assert_eq!(1, PaginationMeta::new(&params, 1).total_pages);
        assert_eq!(1, PaginationMeta::new(&params, 3).total_pages);
        assert_eq!(3, PaginationMeta::new(&params, 7).total_pages);
    }
}
