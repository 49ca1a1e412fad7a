use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::state::ensure_runway_home;

/// Environment fallback when no key is stored
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub api_key: Option<String>,
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_runway_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    load_auth_from(&auth_path()?)
}

fn load_auth_from(p: &Path) -> Result<AuthState> {
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

fn save_auth_to(auth: &AuthState, p: &Path) -> Result<()> {
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Stored key first, then `$OPENROUTER_API_KEY`. Blank values count as missing.
pub fn resolve_api_key() -> Result<Option<String>> {
    let stored = load_auth()?.api_key;
    Ok(pick_key(stored, std::env::var(API_KEY_ENV).ok()))
}

fn pick_key(stored: Option<String>, env: Option<String>) -> Option<String> {
    stored
        .filter(|k| !k.trim().is_empty())
        .or_else(|| env.filter(|k| !k.trim().is_empty()))
        .map(|k| k.trim().to_string())
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn paste_api_key() -> Result<()> {
    let p = auth_path()?;
    let mut auth = load_auth_from(&p)?;
    let key = prompt_secret("Paste OpenRouter API key (starts with sk-)")?;
    if !key.starts_with("sk-") {
        bail!("key didn't look like an API key (expected prefix sk-)");
    }
    auth.api_key = Some(key);
    save_auth_to(&auth, &p)?;
    println!("Saved API key to {}", p.display());
    Ok(())
}

pub fn status() -> Result<()> {
    let stored = load_auth()?.api_key.is_some_and(|k| !k.trim().is_empty());
    let env = std::env::var(API_KEY_ENV).is_ok_and(|k| !k.trim().is_empty());
    match (stored, env) {
        (true, _) => println!("API key: stored in {}", auth_path()?.display()),
        (false, true) => println!("API key: from ${API_KEY_ENV}"),
        (false, false) => println!("API key: not configured (run: runway auth paste-api-key)"),
    }
    Ok(())
}
