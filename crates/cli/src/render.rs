//! Plain-text rendering of browse views for the terminal.

use std::fmt::Write;

use storedb_core::{Category, FilterState, Item, ViewState, ViewStatus};

const TITLE_WIDTH: usize = 36;

/// Render a full browse screen: header, rows and the range footer.
pub fn view(view: &ViewState, filter: &FilterState, page_size: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(view, filter));

    match view.status {
        ViewStatus::Loading => out.push_str("Loading...\n"),
        ViewStatus::Failed => {
            let reason = view.error.as_deref().unwrap_or("unknown error");
            let _ = writeln!(out, "Failed to load products: {reason} (type /retry)");
        }
        ViewStatus::Empty => out.push_str("No items match.\n"),
        ViewStatus::Ready if view.items.is_empty() => {
            let _ = writeln!(out, "Page {} is past the end ({} pages).", filter.page, view.total_pages);
        }
        ViewStatus::Ready => {
            for item in &view.items {
                let _ = writeln!(out, "{}", row(item));
            }
        }
    }

    if let Some((first, last)) = view.shown_range(page_size) {
        let _ = writeln!(out, "Showing {first}-{last} of {} items", view.total_items);
    }
    if view.status == ViewStatus::Ready && view.error_present {
        out.push_str("(showing cached results; the last refresh failed)\n");
    }
    out
}

fn header(view: &ViewState, filter: &FilterState) -> String {
    let mut line = format!(
        "Page {}/{}  sort: {} {}",
        view.page,
        view.total_pages.max(1),
        filter.sort_field.as_str(),
        filter.sort_order.as_str()
    );
    if !filter.search_term.is_empty() {
        let _ = write!(line, "  search: {:?}", filter.search_term);
    }
    if !filter.selected_categories.is_empty() {
        let selected: Vec<&str> = filter.selected_categories.iter().map(String::as_str).collect();
        let _ = write!(line, "  categories: {}", selected.join(", "));
    }
    if view.is_refreshing {
        line.push_str("  (refreshing)");
    }
    line
}

/// One product as a fixed-width table row.
pub fn row(item: &Item) -> String {
    format!(
        "{:>4}  {:<width$}  {:<18}  {:>9.2}  {:>5}  {}",
        item.id,
        truncate(&item.title, TITLE_WIDTH),
        item.category,
        item.price,
        item.stock,
        item.stock_status().label(),
        width = TITLE_WIDTH
    )
}

pub fn categories(categories: &[Category]) -> String {
    let mut out = String::new();
    for category in categories {
        let _ = writeln!(out, "{:<24}  {}", category.slug, category.name);
    }
    let _ = writeln!(out, "{} categories", categories.len());
    out
}

/// Product detail block with optional related products.
pub fn product(item: &Item, similar: &[Item]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", item.id, item.title);
    if let Some(brand) = &item.brand {
        let _ = writeln!(out, "Brand:    {brand}");
    }
    let _ = writeln!(out, "Category: {}", item.category);
    match item.discount_percentage {
        Some(pct) if pct > 0.0 => {
            let _ = writeln!(out, "Price:    {:.2} ({:.2} after {pct}% off)", item.price, item.discounted_price());
        }
        _ => {
            let _ = writeln!(out, "Price:    {:.2}", item.price);
        }
    }
    let _ = writeln!(out, "Stock:    {} ({})", item.stock, item.stock_status().label());
    if let Some(rating) = item.rating {
        let _ = writeln!(out, "Rating:   {rating:.2}");
    }
    if !item.description.is_empty() {
        let _ = writeln!(out, "\n{}", item.description);
    }
    if !similar.is_empty() {
        out.push_str("\nSimilar products:\n");
        for other in similar {
            let _ = writeln!(out, "{}", row(other));
        }
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width - 3).collect();
    cut.push_str("...");
    cut
}
