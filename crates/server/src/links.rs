//! Order summaries and messaging deep links.

use comanda_core::{DessertCategory, MenuData, digits_only};
use thiserror::Error;

const WHATSAPP_URL: &str = "https://wa.me/55";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("no items selected")]
    EmptySelection,
}

fn selected(items: &[String]) -> Result<Vec<&str>, LinkError> {
    let chosen: Vec<&str> = items
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();
    if chosen.is_empty() {
        return Err(LinkError::EmptySelection);
    }
    Ok(chosen)
}

/// Message for an order placed from today's menu.
///
/// # Errors
///
/// Returns `LinkError::EmptySelection` if no item is left after trimming.
pub fn order_message(menu: &MenuData, items: &[String]) -> Result<String, LinkError> {
    let lines: Vec<String> = selected(items)?
        .into_iter()
        .map(|item| format!("✅ {item}"))
        .collect();

    Ok(format!(
        "*PEDIDO - {}*\n*{}*\n\n*Itens do Pedido:*\n{}\n\n*Total: {}*",
        menu.restaurant_name,
        menu.title,
        lines.join("\n"),
        menu.price.display()
    ))
}

/// Message for a dessert order.
///
/// # Errors
///
/// Returns `LinkError::EmptySelection` if no item is left after trimming.
pub fn dessert_message(items: &[String]) -> Result<String, LinkError> {
    let lines: Vec<String> = selected(items)?
        .into_iter()
        .map(|item| format!("🍰 {item}"))
        .collect();
    Ok(format!("*PEDIDO DE SOBREMESA*\n\n{}", lines.join("\n")))
}

/// Order lines for `(category, item)` index pairs, as `"Bolos: Brigadeiro"`.
/// Out-of-range pairs and blank items are skipped.
#[must_use]
pub fn dessert_selection(categories: &[DessertCategory], picks: &[(usize, usize)]) -> Vec<String> {
    picks
        .iter()
        .filter_map(|&(c, i)| {
            let category = categories.get(c)?;
            let item = category.items.get(i)?;
            (!item.trim().is_empty()).then(|| category.order_line(item))
        })
        .collect()
}

/// Shareable text of the full menu.
#[must_use]
pub fn share_text(menu: &MenuData) -> String {
    let items: Vec<String> = menu.items.iter().map(|item| format!("• {item}")).collect();
    // Phone is stored with the area code; the share text prints it separately
    let local_number = menu.phone.get(2..).unwrap_or_default();

    format!(
        "*{} - {}*\n\n{}\n\nValor: {}\nPeça agora: 62 {local_number}",
        menu.restaurant_name,
        menu.title,
        items.join("\n"),
        menu.price.display()
    )
}

/// Messaging deep link to a Brazilian number.
#[must_use]
pub fn whatsapp_link(phone: &str, message: &str) -> String {
    format!(
        "{WHATSAPP_URL}{}?text={}",
        digits_only(phone),
        urlencoding::encode(message)
    )
}
