use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use runway_core::{Group, Taxonomy};
use runway_insight::{DEFAULT_PREVIEW_ROWS, DEFAULT_SYSTEM_PROMPT, DEFAULT_TTL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::state::ensure_runway_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub insight: InsightSection,
    pub budget: BudgetSection,
    /// Replaces the built-in taxonomy when present
    pub taxonomy: Option<TaxonomySection>,
}

/// OpenAI-compatible chat-completions endpoint (OpenRouter by default)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Extra attempts on 502/503/504 and transport failures
    pub max_retries: u32,
    /// Sent as HTTP-Referer / X-Title (OpenRouter attribution headers)
    pub referer: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightSection {
    pub cache_ttl_secs: u64,
    pub preview_rows: usize,
    pub top_n: usize,
    pub currency: String,
    /// Master prompt file; falls back to ./prompt.txt, then the built-in instruction
    pub prompt_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSection {
    pub savings_goal: f64,
    /// IANA zone used to decide what "today" is
    pub timezone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomySection {
    pub essential: Vec<String>,
    pub financial: Vec<String>,
    pub lifestyle: Vec<String>,
    pub other: Vec<String>,
    pub income: Vec<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api".to_string(),
            model: "meta-llama/llama-3.3-70b-instruct:free".to_string(),
            temperature: 0.7,
            timeout_secs: 120,
            max_retries: 3,
            referer: Some("https://ai-finance-studio".to_string()),
            title: Some("Finance Studio".to_string()),
        }
    }
}

impl Default for InsightSection {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            top_n: runway_core::DEFAULT_TOP_N,
            currency: "Rp".to_string(),
            prompt_file: None,
        }
    }
}

impl Default for BudgetSection {
    fn default() -> Self {
        Self {
            savings_goal: 10_000_000.0,
            timezone: "Asia/Jakarta".to_string(),
        }
    }
}

impl Config {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.insight.cache_ttl_secs)
    }

    pub fn taxonomy(&self) -> Taxonomy {
        match &self.taxonomy {
            None => Taxonomy::standard(),
            Some(t) => Taxonomy::from_groups([
                (Group::Essential, t.essential.clone()),
                (Group::Financial, t.financial.clone()),
                (Group::Lifestyle, t.lifestyle.clone()),
                (Group::Other, t.other.clone()),
                (Group::Income, t.income.clone()),
            ]),
        }
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.budget
            .timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid timezone in config: {}", self.budget.timezone))
    }

    /// Today's date in the configured zone
    pub fn today(&self) -> Result<NaiveDate> {
        Ok(Utc::now().with_timezone(&self.timezone()?).date_naive())
    }

    /// System instruction for every request
    pub fn system_prompt(&self) -> Result<String> {
        let candidate = self
            .insight
            .prompt_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("prompt.txt"));
        if candidate.exists() {
            debug!(path = %candidate.display(), "using master prompt file");
            return fs::read_to_string(&candidate)
                .with_context(|| format!("read {}", candidate.display()));
        }
        Ok(DEFAULT_SYSTEM_PROMPT.to_string())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_runway_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg.insight.top_n, 3);
        assert_eq!(cfg.insight.preview_rows, 200);
        assert_eq!(cfg.llm.max_retries, 3);
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(21600));
    }

    #[test]
    fn test_round_trip_and_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        save_config_to(&Config::default(), &p).unwrap();
        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.llm.model, LlmSection::default().model);

        fs::write(&p, "[budget]\nsavings_goal = 500.0\n").unwrap();
        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.budget.savings_goal, 500.0);
        assert_eq!(cfg.budget.timezone, "Asia/Jakarta");
        assert_eq!(cfg.insight.currency, "Rp");
    }

    #[test]
    fn test_custom_taxonomy() {
        let cfg: Config = toml::from_str(
            "[taxonomy]\nessential = [\"rent\", \"groceries\"]\nlifestyle = [\"games\"]\n",
        )
        .unwrap();
        let tax = cfg.taxonomy();
        assert_eq!(tax.normalize("GROCERIES").category, "Groceries");
        assert!(tax.is_discretionary("Games"));
        assert_eq!(tax.normalize("Food").category, "Misc");
    }

    #[test]
    fn test_llm_section_without_provider() {
        // Older files still carry `provider`; it is ignored on load and not written back.
        let cfg: Config = toml::from_str(
            "[llm]\nprovider = \"openrouter\"\nmodel = \"gpt-4o-mini\"\n",
        )
        .unwrap();
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.llm.base_url, "https://openrouter.ai/api");

        let written = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(!written.contains("provider"));
        assert!(written.contains("base_url"));
    }

    #[test]
    fn test_bad_timezone() {
        let mut cfg = Config::default();
        assert!(cfg.today().is_ok());
        cfg.budget.timezone = "Mars/Olympus".to_string();
        assert!(cfg.today().is_err());
    }

    #[test]
    fn test_system_prompt_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("master.txt");
        fs::write(&p, "Be frugal.").unwrap();
        let mut cfg = Config::default();
        cfg.insight.prompt_file = Some(p);
        assert_eq!(cfg.system_prompt().unwrap(), "Be frugal.");
    }
}
