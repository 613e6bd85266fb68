//! Menu content: today's menu, dessert categories and extraction results.

use serde::{Deserialize, Serialize};

use super::Price;

/// Today's menu. A single record overwritten as a whole on every edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuData {
    pub restaurant_name: String,
    #[serde(default)]
    pub title: String,
    pub items: Vec<String>,
    pub price: Price,
    /// Contact phone, digits only.
    #[serde(default)]
    pub phone: String,
}

impl Default for MenuData {
    fn default() -> Self {
        Self {
            restaurant_name: "Comanda Restaurante".to_owned(),
            title: "Almoço de Hoje".to_owned(),
            items: [
                "Arroz",
                "Feijão",
                "Macarrão",
                "Bife ao Molho Madeira",
                "Filé de Frango",
                "Batata Palha",
                "Purê de Batata",
                "Cenoura Cozida",
                "Salada de Repolho, Tomate e Couve",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            price: Price::from_cents(2000),
            phone: "62981025023".to_owned(),
        }
    }
}

impl MenuData {
    /// Merge an extraction result into this menu.
    ///
    /// Items and price always come from the extraction. Name, title and
    /// phone are only taken when the model actually returned them.
    #[must_use]
    pub fn apply_extraction(&self, extracted: ExtractedMenu) -> Self {
        let phone = extracted
            .phone
            .as_deref()
            .map(digits_only)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.phone.clone());
        let restaurant_name = Some(extracted.restaurant_name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.restaurant_name.clone());
        let title = extracted
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.title.clone());

        Self {
            restaurant_name,
            title,
            items: extracted.items,
            price: extracted.price,
            phone,
        }
    }

    /// Items that are not blank, in menu order.
    #[must_use]
    pub fn listed_items(&self) -> Vec<&str> {
        self.items
            .iter()
            .map(String::as_str)
            .filter(|i| !i.trim().is_empty())
            .collect()
    }
}

/// Structured menu returned by the extraction model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMenu {
    pub restaurant_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub items: Vec<String>,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A dessert group shown on the dessert screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DessertCategory {
    pub title: String,
    #[serde(default)]
    pub items: Vec<String>,
}

impl DessertCategory {
    fn new(title: &str, items: &[&str]) -> Self {
        Self {
            title: title.to_owned(),
            items: items.iter().map(|i| (*i).to_owned()).collect(),
        }
    }

    /// Order line for an item of this category: `"Bolos: Brigadeiro"`.
    #[must_use]
    pub fn order_line(&self, item: &str) -> String {
        format!("{}: {item}", self.title)
    }
}

/// The built-in dessert list. Edits to it are never persisted.
#[must_use]
pub fn default_desserts() -> Vec<DessertCategory> {
    vec![
        DessertCategory::new(
            "Geladinhos gourmet",
            &[
                "Prestígio",
                "Ninho c/ morango",
                "Ninho c/ abacaxi",
                "Ninho c/ nutella",
                "Maracujá trufado",
                "Ovomaltine",
            ],
        ),
        DessertCategory::new("Bolos", &["Ninho c/ brigadeiro", "Brigadeiro", "Maracujá"]),
        DessertCategory::new("Marido gelado", &[]),
        DessertCategory::new("Pudim", &[]),
        DessertCategory::new("Doce de festa", &["Brigadeiro", "Leite ninho"]),
    ]
}

/// Strip everything but ASCII digits.
#[must_use]
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}
