//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `vaulticon_core` linkage (`ping`/version lines).
//! - Resolve appearances for a JSON fixture of rules and items, one line
//!   per item, so rule lists can be checked without a host application.
//!
//! Usage: `vaulticon_cli [fixture.json]`. Set `VAULTICON_LOG_DIR` to an
//! absolute directory to enable file logging.

use log::info;
use serde::Deserialize;
use std::process::ExitCode;
use vaulticon_core::{
    default_log_level, init_logging, AppearanceSource, Category, Item, ItemIndex, RuleStore,
    RulingResolver, SettingsDocument,
};

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    settings: SettingsDocument,
    #[serde(default)]
    items: Vec<Item>,
}

fn main() -> ExitCode {
    println!("vaulticon_core ping={}", vaulticon_core::ping());
    println!("vaulticon_core version={}", vaulticon_core::core_version());

    if let Ok(log_dir) = std::env::var("VAULTICON_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match run_fixture(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_fixture(path: &str) -> Result<(), String> {
    let raw = std::fs::read_to_string(path).map_err(|err| format!("cannot read `{path}`: {err}"))?;
    let fixture: Fixture =
        serde_json::from_str(&raw).map_err(|err| format!("invalid fixture `{path}`: {err}"))?;
    fixture
        .settings
        .check_version()
        .map_err(|err| err.to_string())?;

    let mut store = RuleStore::new();
    let loaded = fixture.settings.apply_to(&mut store);
    let items: ItemIndex = fixture.items.into_iter().collect();
    info!("event=cli_fixture module=cli status=ok rules={loaded}");

    let resolver = RulingResolver::new(&store, &items);
    for category in Category::ALL {
        for ruling in resolver.check_all(category) {
            let Some(appearance) = resolver.appearance(category, &ruling.item_id) else {
                continue;
            };
            println!(
                "{category} {} rule={} icon={} color={} source={}",
                ruling.item_id,
                ruling.rule.as_ref().map_or("-", |rule| rule.id.as_str()),
                appearance.icon,
                appearance.color.as_deref().unwrap_or("-"),
                source_label(appearance.source),
            );
        }
    }
    Ok(())
}

fn source_label(source: AppearanceSource) -> &'static str {
    match source {
        AppearanceSource::Item => "item",
        AppearanceSource::Rule => "rule",
        AppearanceSource::Default => "default",
    }
}
