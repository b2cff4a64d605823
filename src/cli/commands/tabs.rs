use serde_json::json;

use crate::cli::utils::print_table;
use crate::cli::OutputFormat;
use crate::compliance::catalogue::{self, TabAccess};

fn selected(tab: Option<&str>) -> anyhow::Result<Vec<&'static TabAccess>> {
    match tab {
        Some(name) => catalogue::tab_access(name)
            .map(|entry| vec![entry])
            .ok_or_else(|| anyhow::anyhow!("Unknown tab: {}", name)),
        None => Ok(catalogue::tab_access_map(true)),
    }
}

pub fn handle(tab: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let tabs = selected(tab.as_deref())?;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "tabs": tabs }))?);
        }
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = tabs
                .iter()
                .flat_map(|entry| {
                    entry.access.iter().map(move |access| {
                        vec![
                            entry.tab.to_string(),
                            access.service_name().to_string(),
                            access.component.to_string(),
                            access.verb_mask.0.to_string(),
                        ]
                    })
                })
                .collect();
            print_table(&["TAB", "SERVICE", "COMPONENT", "VERBS"], &[12, 12, 28], &rows);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_one_tab_or_the_whole_catalogue() {
        assert_eq!(selected(Some("users")).unwrap()[0].tab, "users");
        assert!(selected(None).unwrap().iter().any(|t| t.tab == catalogue::DEFAULT_TAB));
        assert!(selected(Some("billing")).is_err());
    }
}
