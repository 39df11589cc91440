//! Page slicing for board listings.

use serde::{Deserialize, Serialize};

/// Requested page. Numbers start at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_size: usize,
    pub page_number: usize,
}

impl PageRequest {
    pub fn new(page_size: usize, page_number: usize) -> Self {
        Self { page_size, page_number }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(20, 1)
    }
}

/// One page of results plus the size of the whole listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(rename = "totalItems")]
    pub total_items: usize,
}

/// Cut one page out of `items`.
///
/// A page number past the last page yields an empty page; `total_items` is always
/// the full count.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total_items = items.len();
    let page_size = request.page_size.max(1);
    let page_number = request.page_number.max(1);
    let max_pages = total_items.div_ceil(page_size);

    let data = if page_number > max_pages {
        Vec::new()
    } else {
        items
            .into_iter()
            .skip((page_number - 1) * page_size)
            .take(page_size)
            .collect()
    };

    Page { data, total_items }
}
