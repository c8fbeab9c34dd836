//! Command implementations. Each returns the text printed on stdout.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, bail, Context as _, Result};
use serde_json::{Map, Value};
use tracing::{debug, info};

use stateline_core::{FileStorage, PathSelector, PersistedStore, Settings, Storage, Store};

use crate::cli::Command;


/// Everything a command needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Settings,
    pub config_dir: PathBuf,
}

impl Context {
    pub fn storage_dir(&self) -> PathBuf {
        self.settings.storage_dir_or(&self.config_dir)
    }

    fn storage(&self) -> Result<FileStorage> {
        let dir = self.storage_dir();
        FileStorage::new(&dir)
            .with_context(|| format!("cannot open storage directory {}", dir.display()))
    }
}


pub fn run(command: Command, ctx: &Context) -> Result<String> {
    match command {
        Command::Select { path, file } => {
            let input = read_input(file.as_deref())?;
            select(&PathSelector::compile(&path), &input)
        }
        Command::Named { name, file } => {
            let selector = ctx
                .settings
                .selector(&name)
                .ok_or_else(|| anyhow!("no selector named \"{}\" in settings", name))?;
            let input = read_input(file.as_deref())?;
            select(&selector, &input)
        }
        Command::Set { key, json, replace } => set(Rc::new(ctx.storage()?), &key, &json, replace),
        Command::Show { key } => show(&ctx.storage()?, &key),
        Command::Clear { key } => clear(&ctx.storage()?, &key),
        Command::List => list(&ctx.storage()?),
    }
}


// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

pub fn select(selector: &PathSelector, input: &str) -> Result<String> {
    let state: Value = serde_json::from_str(input).context("input is not valid JSON")?;
    let selected = selector.select_value(&state)?;
    debug!(path = %selector, "selected");
    Ok(serde_json::to_string_pretty(selected)?)
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("cannot read stdin")?;
            Ok(buf)
        }
    }
}


// ---------------------------------------------------------------------------
// Persisted documents
// ---------------------------------------------------------------------------

/// Apply `json` to the document stored under `key`, starting from `{}` when
/// there is none, and return the resulting document.
pub fn set(storage: Rc<dyn Storage>, key: &str, json: &str, replace: bool) -> Result<String> {
    let update: Value =
        serde_json::from_str(json).with_context(|| format!("update for \"{}\" is not valid JSON", key))?;

    let persisted = PersistedStore::open(Store::new(Value::Object(Map::new())), key, storage)?;
    persisted.store().set_state(update, replace)?;
    info!(key, replace, "state updated");

    let state = persisted.store().get_state();
    Ok(serde_json::to_string_pretty(&state)?)
}

pub fn show(storage: &dyn Storage, key: &str) -> Result<String> {
    let raw = match storage.get_item(key)? {
        Some(raw) => raw,
        None => bail!("no state stored under \"{}\"", key),
    };
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("stored state for \"{}\" is not valid JSON", key))?;
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn clear(storage: &dyn Storage, key: &str) -> Result<String> {
    storage.remove_item(key)?;
    info!(key, "state cleared");
    Ok(format!("cleared {}", key))
}

pub fn list(storage: &FileStorage) -> Result<String> {
    Ok(storage.keys()?.join("\n"))
}


#[cfg(test)]
mod tests {
    use super::*;
    use stateline_core::MemoryStorage;

    fn ctx(dir: &Path) -> Context {
        Context {
            settings: Settings::default(),
            config_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn select_prints_pretty_json() {
        let out = select(&PathSelector::compile("a.b"), r#"{"a":{"b":{"c":1}}}"#).unwrap();
        assert_eq!(out, "{\n  \"c\": 1\n}");
    }

    #[test]
    fn select_reports_selector_errors() {
        let err = select(&PathSelector::compile("a.z"), r#"{"a":{}}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "key \"z\" can not be selected from state when using selector \"a.z\""
        );
    }

    #[test]
    fn select_rejects_bad_input() {
        let err = select(&PathSelector::compile("a"), "{").unwrap_err();
        assert_eq!(err.to_string(), "input is not valid JSON");
    }

    #[test]
    fn set_merges_then_replaces() {
        let raw = MemoryStorage::new();
        let storage: Rc<dyn Storage> = Rc::new(raw.clone());

        let out = set(Rc::clone(&storage), "prefs", r#"{"a":1}"#, false).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&out).unwrap(), serde_json::json!({"a": 1}));

        set(Rc::clone(&storage), "prefs", r#"{"b":2}"#, false).unwrap();
        let shown = show(&raw, "prefs").unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&shown).unwrap(),
            serde_json::json!({"a": 1, "b": 2})
        );

        set(storage, "prefs", r#"{"c":3}"#, true).unwrap();
        let shown = show(&raw, "prefs").unwrap();
        assert_eq!(serde_json::from_str::<Value>(&shown).unwrap(), serde_json::json!({"c": 3}));
    }

    #[test]
    fn set_rejects_invalid_update() {
        let storage: Rc<dyn Storage> = Rc::new(MemoryStorage::new());
        assert!(set(storage, "k", "not json", false).is_err());
    }

    #[test]
    fn show_missing_key() {
        let err = show(&MemoryStorage::new(), "nope").unwrap_err();
        assert_eq!(err.to_string(), "no state stored under \"nope\"");
    }

    #[test]
    fn clear_removes_document() {
        let raw = MemoryStorage::new();
        raw.set_item("k", "{}").unwrap();
        assert_eq!(clear(&raw, "k").unwrap(), "cleared k");
        assert!(raw.is_empty());
    }

    #[test]
    fn run_dispatches_against_storage_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = ctx(tmp.path());

        run(
            Command::Set {
                key: "cart".into(),
                json: r#"{"items":[{"id":7}]}"#.into(),
                replace: false,
            },
            &ctx,
        )
        .unwrap();
        assert!(tmp.path().join("state").join("cart.json").is_file());
        assert_eq!(run(Command::List, &ctx).unwrap(), "cart");

        let shown = run(Command::Show { key: "cart".into() }, &ctx).unwrap();
        assert!(shown.contains("\"id\": 7"));

        run(Command::Clear { key: "cart".into() }, &ctx).unwrap();
        assert_eq!(run(Command::List, &ctx).unwrap(), "");
    }

    #[test]
    fn named_selector_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = ctx(tmp.path());
        ctx.settings
            .selectors
            .insert("first_id".into(), "items[0].id".into());
        let doc = tmp.path().join("doc.json");
        fs::write(&doc, r#"{"items":[{"id":7}]}"#).unwrap();

        let out = run(
            Command::Named {
                name: "first_id".into(),
                file: Some(doc.clone()),
            },
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "7");

        let err = run(
            Command::Named {
                name: "missing".into(),
                file: Some(doc),
            },
            &ctx,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "no selector named \"missing\" in settings");
    }
}
