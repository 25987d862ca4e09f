use std::{
    fmt::{self, Write},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

mod catalog;

/// The five automation purposes scripts can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptCategory {
    Cart,
    Payment,
    Disable,
    Autofill,
    Total,
}

impl ScriptCategory {
    pub const ALL: [ScriptCategory; 5] = [
        Self::Cart,
        Self::Payment,
        Self::Disable,
        Self::Autofill,
        Self::Total,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Payment => "payment",
            Self::Disable => "disable",
            Self::Autofill => "autofill",
            Self::Total => "total",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Cart => "Cart Items Script Generator",
            Self::Payment => "Payment Methods Script Generator",
            Self::Disable => "Disable Card Fields Script Generator",
            Self::Autofill => "Autofill Card Script Generator",
            Self::Total => "Total Amount Script Generator",
        }
    }
}

impl fmt::Display for ScriptCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown script category `{0}` (expected cart, payment, disable, autofill or total)")]
pub struct UnknownCategory(pub String);

impl FromStr for ScriptCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.name() == needle)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Generation tier, from the plainest lookup to the most defensive script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Optimized,
    Advanced,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Self::Basic, Self::Optimized, Self::Advanced];

    pub fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Optimized => "optimized",
            Self::Advanced => "advanced",
        }
    }

    /// Derive this tier's confidence from the candidate's base confidence.
    pub fn confidence(self, base: i64) -> u8 {
        let value = match self {
            Self::Basic => base.min(95),
            Self::Optimized => base.saturating_sub(5).min(90),
            Self::Advanced => base.saturating_add(3).min(98),
        };
        value.clamp(0, 100) as u8
    }

    fn heading(self) -> (&'static str, &'static str) {
        match self {
            Self::Basic => ("Basic Variant", "Simple and direct approach."),
            Self::Optimized => ("Optimized Variant", "Uses MutationObserver for dynamic pages."),
            Self::Advanced => ("Advanced Variant", "With fallbacks and error handling."),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// One generated script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub tier: Tier,
    pub code: String,
    pub confidence: u8,
}

/// Exactly one variant per tier for a (category, selector) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedScriptSet {
    pub basic: Variant,
    pub optimized: Variant,
    pub advanced: Variant,
}

impl GeneratedScriptSet {
    pub fn get(&self, tier: Tier) -> &Variant {
        match tier {
            Tier::Basic => &self.basic,
            Tier::Optimized => &self.optimized,
            Tier::Advanced => &self.advanced,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variant> {
        [&self.basic, &self.optimized, &self.advanced].into_iter()
    }
}

/// Fill the three template bodies for `category` with `selector`.
///
/// The selector is inserted verbatim, without any quoting or escaping.
#[instrument(name = "generate_scripts", skip(selector), fields(selector_len = selector.len()))]
pub fn generate(
    category: ScriptCategory,
    selector: &str,
    base_confidence: i64,
) -> GeneratedScriptSet {
    let variant = |tier: Tier| Variant {
        tier,
        code: catalog::body(category, tier).replacen(catalog::SELECTOR_SLOT, selector, 1),
        confidence: tier.confidence(base_confidence),
    };
    let set = GeneratedScriptSet {
        basic: variant(Tier::Basic),
        optimized: variant(Tier::Optimized),
        advanced: variant(Tier::Advanced),
    };
    debug!(
        basic = set.basic.confidence,
        optimized = set.optimized.confidence,
        advanced = set.advanced.confidence,
        "scripts generated"
    );
    set
}

/// Markdown write-up of a generated set. Pure function of its inputs.
pub fn documentation(
    category: ScriptCategory,
    selector: &str,
    score: i64,
    scripts: &GeneratedScriptSet,
) -> String {
    let mut doc = String::new();
    // writing into a String cannot fail
    let _ = write_documentation(&mut doc, category, selector, score, scripts);
    doc
}

fn write_documentation(
    doc: &mut String,
    category: ScriptCategory,
    selector: &str,
    score: i64,
    scripts: &GeneratedScriptSet,
) -> fmt::Result {
    writeln!(doc, "# {}", category.title())?;
    writeln!(doc)?;
    writeln!(doc, "**Selector:** `{selector}`")?;
    writeln!(doc, "**Confidence Score:** {score}")?;
    writeln!(doc, "**Type:** {category}")?;
    writeln!(doc)?;
    writeln!(doc, "## Usage")?;
    for variant in scripts.iter() {
        let (heading, blurb) = variant.tier.heading();
        writeln!(doc)?;
        writeln!(doc, "### {heading}")?;
        writeln!(doc, "{blurb}")?;
        writeln!(doc, "```javascript")?;
        writeln!(doc, "{}", variant.code)?;
        writeln!(doc, "```")?;
    }
    writeln!(doc)?;
    writeln!(doc, "## Notes")?;
    writeln!(doc, "- Test in development environment first")?;
    writeln!(doc, "- Monitor console for any errors")?;
    writeln!(doc, "- Adjust selectors if page structure changes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_confidences_for_high_base() {
        let set = generate(ScriptCategory::Cart, ".cart-items", 95);
        assert_eq!(set.basic.confidence, 95);
        assert_eq!(set.optimized.confidence, 90);
        assert_eq!(set.advanced.confidence, 98);
    }

    #[test]
    fn tier_confidences_for_floor_base() {
        let set = generate(ScriptCategory::Total, ".order-total", 50);
        assert_eq!(set.basic.confidence, 50);
        assert_eq!(set.optimized.confidence, 45);
        assert_eq!(set.advanced.confidence, 53);
    }

    #[test]
    fn tier_confidence_stays_in_percent_range() {
        assert_eq!(Tier::Optimized.confidence(2), 0);
        assert_eq!(Tier::Advanced.confidence(i64::MAX), 98);
        assert_eq!(Tier::Basic.confidence(i64::MIN), 0);
    }

    #[test]
    fn cart_basic_matches_template() {
        let set = generate(ScriptCategory::Cart, ".cart-items", 95);
        assert_eq!(
            set.basic.code,
            concat!(
                "function getItems() {\n",
                "    let items = document.querySelector('.cart-items');\n",
                "    if (items) {\n",
                "        return items.innerHTML;\n",
                "    }\n",
                "    return null;\n",
                "}\n",
                "\n",
                "getItems();",
            )
        );
        assert_eq!(set.basic.tier, Tier::Basic);
    }

    #[test]
    fn selector_is_inserted_verbatim() {
        let selector = r#"form[name="checkout"]"#;
        for category in ScriptCategory::ALL {
            let set = generate(category, selector, 80);
            for variant in set.iter() {
                assert!(variant.code.contains(selector));
                assert!(!variant.code.contains(catalog::SELECTOR_SLOT));
            }
        }
    }

    #[test]
    fn advanced_variants_carry_fallback_chains() {
        let set = generate(ScriptCategory::Payment, "#pm", 80);
        assert!(set
            .advanced
            .code
            .contains("const selectors = ['#pm', '.payment-methods', '#payment'];"));
        assert!(set.optimized.code.contains("MutationObserver"));
        let disable = generate(ScriptCategory::Disable, "#cc", 80);
        assert!(disable.advanced.code.contains("disabledCount++"));
    }

    #[test]
    fn generation_is_reproducible() {
        for category in ScriptCategory::ALL {
            assert_eq!(generate(category, ".x", 77), generate(category, ".x", 77));
        }
    }

    #[test]
    fn documentation_includes_all_parts() {
        let set = generate(ScriptCategory::Total, ".order-total", 95);
        let doc = documentation(ScriptCategory::Total, ".order-total", 45, &set);
        assert!(doc.starts_with("# Total Amount Script Generator\n"));
        assert!(doc.contains("**Selector:** `.order-total`"));
        assert!(doc.contains("**Confidence Score:** 45"));
        assert!(doc.contains("**Type:** total"));
        for variant in set.iter() {
            assert!(doc.contains(&variant.code));
        }
        assert_eq!(doc, documentation(ScriptCategory::Total, ".order-total", 45, &set));
    }

    #[test]
    fn categories_parse_case_insensitively() {
        assert_eq!("Cart".parse::<ScriptCategory>(), Ok(ScriptCategory::Cart));
        assert_eq!(" autofill ".parse::<ScriptCategory>(), Ok(ScriptCategory::Autofill));
        assert!("checkout".parse::<ScriptCategory>().is_err());
        for category in ScriptCategory::ALL {
            assert_eq!(category.name().parse::<ScriptCategory>(), Ok(category));
        }
    }
}
