//! `mma config` - inspect the resolved settings

use crate::category::Category;
use crate::config::{default_settings_path, AlertConfig, AlertEffects, PreferenceStore, Settings};
use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the per-category configuration after fallbacks
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List invalid values and questionable combinations
    Check,
}

/// One category as `config show` prints it
#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub category: Category,
    pub enabled: bool,
    pub interval_secs: u64,
    /// `None` when unlimited
    pub duration_secs: Option<u64>,
    /// Quiet-hours window, `None` when off
    pub quiet_hours: Option<String>,
    pub effects: AlertEffects,
}

impl CategoryView {
    fn new(category: Category, config: &AlertConfig) -> Self {
        Self {
            category,
            enabled: config.enabled,
            interval_secs: config.interval.as_secs(),
            duration_secs: config.duration.map(|d| d.as_secs()),
            quiet_hours: config
                .quiet_hours
                .enabled
                .then(|| config.quiet_hours.describe()),
            effects: config.effects.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub alerts_enabled: bool,
    pub low_battery_cutoff: Option<u8>,
    pub show_notification: bool,
    pub categories: Vec<CategoryView>,
}

pub fn handle_config(path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    let path = path.unwrap_or_else(default_settings_path);
    let settings = Settings::load_or_default(&path);

    match action {
        ConfigAction::Show { json } => {
            let view = config_view(&settings);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", render(&view));
            }
        }
        ConfigAction::Check => {
            let notes = settings.check();
            if notes.is_empty() {
                println!("{}: OK", path.display());
            } else {
                for note in notes {
                    println!("- {}", note);
                }
            }
        }
    }
    Ok(())
}

pub fn config_view(settings: &Settings) -> ConfigView {
    let prefs = settings.resolve();
    ConfigView {
        alerts_enabled: prefs.alerts_enabled(),
        low_battery_cutoff: prefs.low_battery_cutoff(),
        show_notification: prefs.show_notification(),
        categories: Category::ALL
            .into_iter()
            .map(|c| CategoryView::new(c, &prefs.alert_config(c)))
            .collect(),
    }
}

fn render(view: &ConfigView) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "alerts: {}\n",
        if view.alerts_enabled { "on" } else { "off" }
    ));
    match view.low_battery_cutoff {
        Some(cutoff) => out.push_str(&format!("low battery cutoff: {}%\n", cutoff)),
        None => out.push_str("low battery cutoff: off\n"),
    }

    for c in &view.categories {
        out.push_str(&format!("\n{}\n", c.category.display_name()));
        if !c.enabled {
            out.push_str("  disabled\n");
            continue;
        }
        let duration = match c.duration_secs {
            Some(secs) => format!("{}s", secs),
            None => "until acknowledged".to_string(),
        };
        out.push_str(&format!("  every {}s, {}\n", c.interval_secs, duration));
        if let Some(window) = &c.quiet_hours {
            out.push_str(&format!("  quiet hours {}\n", window));
        }
        if c.effects.is_silent() {
            out.push_str("  no effects\n");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_view() {
        let view = config_view(&Settings::default());

        assert!(view.alerts_enabled);
        assert_eq!(view.low_battery_cutoff, Some(15));
        assert_eq!(view.categories.len(), 3);
        assert_eq!(view.categories[0].interval_secs, 60);
        assert_eq!(view.categories[0].duration_secs, Some(3600));
        assert!(!view.categories[2].enabled);

        let text = render(&view);
        assert!(text.contains("every 60s, 3600s"));
        assert!(text.contains("disabled"));
    }

    #[test]
    fn test_view_serializes() {
        let json = serde_json::to_value(config_view(&Settings::default())).unwrap();
        assert_eq!(json["categories"][1]["category"], "missed_call");
        assert_eq!(json["categories"][0]["quiet_hours"], serde_json::Value::Null);
    }
}
