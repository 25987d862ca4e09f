use std::fmt::Write;

use serde::Serialize;

use crate::batch::{BatchRun, BatchStatus};
use crate::diagnostic::{ranking::Selection, Candidate, ConfidenceBand};
use crate::presets::Platform;
use crate::session::GeneratedOutput;
use crate::store::{Configs, Site, Stats, StatsRecord};
use crate::templates::{ScriptCategory, Tier};

/// Format styles supported by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Ranked candidates with their confidence, marking the selected one.
pub fn render_candidates(
    category: ScriptCategory,
    candidates: &[Candidate],
    selection: Selection,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let rows: Vec<_> = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let confidence = candidate.confidence();
            CandidateRow {
                index,
                selector: &candidate.selector,
                score: candidate.score,
                confidence,
                band: ConfidenceBand::from_confidence(confidence),
                selected: selection.index() == Some(index),
                details: &candidate.details,
            }
        })
        .collect();
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&CandidateList {
            category,
            selected: selection.index(),
            candidates: rows,
        })?),
        OutputFormat::Human => {
            let mut out = String::new();
            writeln!(out, "{}", category.title())?;
            if rows.is_empty() {
                writeln!(out, "No candidates found.")?;
                return Ok(out);
            }
            for row in &rows {
                let marker = if row.selected { "*" } else { " " };
                write!(out, "{marker} [{}] {}  ", row.index, row.selector)?;
                writeln!(
                    out,
                    "score {}, confidence {}% ({})",
                    row.score, row.confidence, row.band.as_str()
                )?;
                for detail in row.details {
                    writeln!(out, "      {detail}")?;
                }
            }
            if selection == Selection::Unselected {
                writeln!(out, "\nNo candidate selected; pick one by index.")?;
            }
            Ok(out)
        }
    }
}

/// Generated variants, optionally followed by the markdown write-up.
pub fn render_scripts(
    output: &GeneratedOutput,
    with_docs: bool,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct JsonScripts<'a> {
                selector: &'a str,
                score: i64,
                scripts: &'a crate::templates::GeneratedScriptSet,
                #[serde(skip_serializing_if = "Option::is_none")]
                documentation: Option<&'a str>,
            }
            Ok(serde_json::to_string_pretty(&JsonScripts {
                selector: &output.candidate.selector,
                score: output.candidate.score,
                scripts: &output.scripts,
                documentation: with_docs.then_some(output.documentation.as_str()),
            })?)
        }
        OutputFormat::Human => {
            let mut out = String::new();
            for tier in Tier::ALL {
                let variant = output.scripts.get(tier);
                writeln!(out, "// {} ({}% confidence)", tier, variant.confidence)?;
                writeln!(out, "{}", variant.code)?;
                writeln!(out)?;
            }
            if with_docs {
                write!(out, "{}", output.documentation)?;
            }
            Ok(out)
        }
    }
}

/// Sites paired with their index in the stored list.
pub fn render_sites(sites: &[(usize, Site)], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = sites
                .iter()
                .map(|(index, site)| SiteRow { index: *index, site })
                .collect();
            Ok(serde_json::to_string_pretty(&rows)?)
        }
        OutputFormat::Human => {
            let mut out = String::new();
            if sites.is_empty() {
                writeln!(out, "No sites saved.")?;
            }
            for (index, site) in sites {
                let marker = if site.active { "*" } else { " " };
                writeln!(
                    out,
                    "{marker} [{index}] {name}  {url}  ({status}, updated {updated})",
                    name = site.name,
                    url = site.url,
                    status = site.status,
                    updated = site.last_updated.format("%Y-%m-%d %H:%M"),
                )?;
            }
            Ok(out)
        }
    }
}

pub fn render_stats(stats: &Stats, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
        OutputFormat::Human => {
            let mut out = String::new();
            for (category, StatsRecord { uses, success_rate }) in stats {
                writeln!(out, "{category:>9}: {uses} use(s), {success_rate}% success")?;
            }
            Ok(out)
        }
    }
}

pub fn render_configs(configs: &Configs, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(configs)?),
        OutputFormat::Human => {
            let mut out = String::new();
            if configs.is_empty() {
                writeln!(out, "No saved configs.")?;
            }
            for config in configs.values() {
                writeln!(
                    out,
                    "{name}  [{category}] {selector}  score {score}, created {created}",
                    name = config.name,
                    category = config.category,
                    selector = config.selector,
                    score = config.score,
                    created = config.created.format("%Y-%m-%d %H:%M"),
                )?;
            }
            Ok(out)
        }
    }
}

pub fn render_batch(run: &BatchRun, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = run
                .statuses()
                .iter()
                .map(|(category, status)| BatchRow {
                    category: *category,
                    status: *status,
                })
                .collect();
            Ok(serde_json::to_string_pretty(&rows)?)
        }
        OutputFormat::Human => {
            let mut out = String::new();
            for (category, status) in run.statuses() {
                writeln!(out, "{category:>9}: {status}")?;
            }
            if run.is_cancelled() {
                writeln!(out, "Batch cancelled.")?;
            }
            Ok(out)
        }
    }
}

pub fn render_presets(platforms: &[Platform], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = platforms
                .iter()
                .map(|platform| PresetRow {
                    platform: *platform,
                    selectors: ScriptCategory::ALL
                        .into_iter()
                        .map(|category| (category, platform.selectors(category)))
                        .collect(),
                })
                .collect();
            Ok(serde_json::to_string_pretty(&rows)?)
        }
        OutputFormat::Human => {
            let mut out = String::new();
            for platform in platforms {
                writeln!(out, "{platform}")?;
                for category in ScriptCategory::ALL {
                    writeln!(
                        out,
                        "  {category:>9}: {}",
                        platform.selectors(category).join(", ")
                    )?;
                }
            }
            Ok(out)
        }
    }
}

#[derive(Debug, Serialize)]
struct CandidateList<'a> {
    category: ScriptCategory,
    selected: Option<usize>,
    candidates: Vec<CandidateRow<'a>>,
}

#[derive(Debug, Serialize)]
struct CandidateRow<'a> {
    index: usize,
    selector: &'a str,
    score: i64,
    confidence: u8,
    band: ConfidenceBand,
    selected: bool,
    details: &'a [String],
}

#[derive(Debug, Serialize)]
struct SiteRow<'a> {
    index: usize,
    #[serde(flatten)]
    site: &'a Site,
}

#[derive(Debug, Serialize)]
struct BatchRow {
    category: ScriptCategory,
    status: BatchStatus,
}

#[derive(Debug, Serialize)]
struct PresetRow {
    platform: Platform,
    selectors: std::collections::BTreeMap<ScriptCategory, &'static [&'static str]>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::GenerationSession;
    use crate::store::default_stats;
    use chrono::Utc;

    fn sample() -> Vec<Candidate> {
        vec![
            Candidate::new(".cart-items", 42, vec!["Children: 5".into()]),
            Candidate::new("#mini-cart", 18, vec![]),
        ]
    }

    #[test]
    fn human_candidates_mark_selection() {
        let output = render_candidates(
            ScriptCategory::Cart,
            &sample(),
            Selection::Selected(0),
            OutputFormat::Human,
        )
        .unwrap();
        assert!(output.contains("Cart Items Script Generator"));
        assert!(output.contains("* [0] .cart-items  score 42, confidence 95% (high)"));
        assert!(output.contains("  [1] #mini-cart  score 18, confidence 50% (low)"));
        assert!(output.contains("Children: 5"));
    }

    #[test]
    fn json_candidates_serialize() {
        let output = render_candidates(
            ScriptCategory::Cart,
            &sample(),
            Selection::Unselected,
            OutputFormat::Json,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["category"], "cart");
        assert!(value["selected"].is_null());
        assert_eq!(value["candidates"][0]["confidence"], 95);
        assert_eq!(value["candidates"][0]["band"], "high");
    }

    #[test]
    fn scripts_render_each_tier() {
        let mut session = GenerationSession::new(ScriptCategory::Total);
        session.analyze("1. Score: 45 | .order-total", 70).unwrap();
        let generated = session.generate().unwrap().clone();

        let human = render_scripts(&generated, true, OutputFormat::Human).unwrap();
        assert!(human.contains("// basic (95% confidence)"));
        assert!(human.contains("// advanced (98% confidence)"));
        assert!(human.contains("## Notes"));

        let json = render_scripts(&generated, false, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["scripts"]["optimized"]["confidence"], 90);
        assert!(value.get("documentation").is_none());
    }

    #[test]
    fn sites_and_stats_render() {
        let site = Site {
            name: "Shop".into(),
            url: "https://shop.example.com/".into(),
            status: "active".into(),
            active: true,
            last_updated: Utc::now(),
            scripts: Default::default(),
        };
        let human = render_sites(&[(0, site.clone())], OutputFormat::Human).unwrap();
        assert!(human.starts_with("* [0] Shop  https://shop.example.com/"));
        let json = render_sites(&[(3, site)], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["index"], 3);
        assert_eq!(value[0]["name"], "Shop");

        let stats = render_stats(&default_stats(), OutputFormat::Human).unwrap();
        assert!(stats.contains("disable: 0 use(s), 100% success"));
    }

    #[test]
    fn batch_and_presets_render() {
        let mut run = BatchRun::start();
        run.advance(ScriptCategory::Cart);
        let human = render_batch(&run, OutputFormat::Human).unwrap();
        assert!(human.contains("cart: processing"));
        assert!(human.contains("total: pending"));

        let presets = render_presets(&[Platform::Shopify], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&presets).unwrap();
        assert_eq!(value[0]["platform"], "shopify");
        assert_eq!(value[0]["selectors"]["cart"][0], ".cart__items");
    }
}
