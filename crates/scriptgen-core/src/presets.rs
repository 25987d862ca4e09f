use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::templates::ScriptCategory;

/// Shop platforms with known selector layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    WooCommerce,
    Shopify,
    OpenCart,
    Magento,
    PrestaShop,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Self::WooCommerce,
        Self::Shopify,
        Self::OpenCart,
        Self::Magento,
        Self::PrestaShop,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::WooCommerce => "woocommerce",
            Self::Shopify => "shopify",
            Self::OpenCart => "opencart",
            Self::Magento => "magento",
            Self::PrestaShop => "prestashop",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::WooCommerce => "WooCommerce",
            Self::Shopify => "Shopify",
            Self::OpenCart => "OpenCart",
            Self::Magento => "Magento",
            Self::PrestaShop => "PrestaShop",
        }
    }

    /// Recommended selectors for `category`, most specific first.
    pub fn selectors(self, category: ScriptCategory) -> &'static [&'static str] {
        use ScriptCategory::*;
        match (self, category) {
            (Self::WooCommerce, Cart) => {
                &[".woocommerce-cart-form", "#order_review", ".cart-container"]
            }
            (Self::WooCommerce, Payment) => {
                &[".wc_payment_methods", "#payment", ".payment-methods"]
            }
            (Self::WooCommerce, Total) => {
                &[".order-total", ".cart-total", "tr.order-total .woocommerce-Price-amount"]
            }
            (Self::WooCommerce, Disable) => {
                &[r#"form[name="checkout"]"#, "#payment", ".woocommerce-checkout"]
            }
            (Self::WooCommerce, Autofill) => {
                &[r#"form[name="checkout"]"#, "#payment", ".payment-box"]
            }

            (Self::Shopify, Cart) => &[".cart__items", "[data-cart-items]", ".cart-form"],
            (Self::Shopify, Payment) => &[".payment-methods", "[data-payment]", ".payment-list"],
            (Self::Shopify, Total) => {
                &[".totals", "[data-cart-total]", ".order-summary__section--total"]
            }
            (Self::Shopify, Disable | Autofill) => {
                &[r#"form[action="/cart"]"#, ".payment-form", "[data-payment-form]"]
            }

            (Self::OpenCart, Cart) => {
                &["#shopping-cart-table", ".cart-table", "#content .table-responsive"]
            }
            (Self::OpenCart, Payment) => {
                &["#payment_method_list", ".payment-options", ".checkout-payment-methods"]
            }
            (Self::OpenCart, Total) => &["#totalPrice", ".grand-total", "#total-amount"],
            (Self::OpenCart, Disable) => {
                &["#payment-form", "form#checkout", ".payment-method-form"]
            }
            (Self::OpenCart, Autofill) => &["#payment-form", "form#checkout", ".card-details"],

            (Self::Magento, Cart) => {
                &[".cart.table-wrapper", "#shopping-cart-table", ".cart.items"]
            }
            (Self::Magento, Payment) => {
                &[".payment-methods", "#checkout-payment-method-load", ".payment-method"]
            }
            (Self::Magento, Total) => {
                &[".grand.totals", ".cart-totals .amount", ".grand-total .price"]
            }
            (Self::Magento, Disable) => {
                &["#payment-form", ".payment-method-content", "form.payment"]
            }
            (Self::Magento, Autofill) => {
                &["#payment-form", ".payment-method-content", ".payment-details"]
            }

            (Self::PrestaShop, Cart) => &["#cart-summary", ".cart-grid", ".cart-overview"],
            (Self::PrestaShop, Payment) => {
                &[".payment-options", "#payment-confirmation", ".payment-method"]
            }
            (Self::PrestaShop, Total) => {
                &[".cart-total", ".cart-summary-totals", ".cart-grid-right .value"]
            }
            (Self::PrestaShop, Disable) => {
                &["#payment-form", ".payment-option", r#"form[action*="order"]"#]
            }
            (Self::PrestaShop, Autofill) => &["#payment-form", ".payment-option", ".card-form"],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown platform `{0}` (expected woocommerce, shopify, opencart, magento or prestashop)")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == needle)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}
