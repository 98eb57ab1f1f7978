use clap::Subcommand;
use passage_core::catalog::Catalog;
use serde_json::json;

use crate::util::{exit_error, print_json};

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List every zone with its activities
    List,
    /// Show one activity with its achievement options
    Show {
        /// Activity name as shown in the selection menu (e.g. "Tengu")
        #[arg(long)]
        activity: String,
    },
}

pub fn run(command: CatalogCommands) -> i32 {
    let catalog = Catalog::builtin();
    match command {
        CatalogCommands::List => print_json(&catalog.zones()),
        CatalogCommands::Show { activity } => show(&catalog, &activity),
    }
}

fn show(catalog: &Catalog, name: &str) -> i32 {
    let Some(activity) = catalog.activity(name) else {
        exit_error(
            &format!("Unknown activity '{name}'"),
            Some("Run `passage catalog list` for the available activities."),
        );
    };
    let options: Vec<_> = activity
        .options
        .iter()
        .map(|o| {
            json!({
                "label": o.label,
                "code": o.code,
                "selectable": catalog.is_selectable(activity.name, o.code),
            })
        })
        .collect();
    print_json(&json!({
        "zone": catalog.zone_of(activity.name).map(|z| z.name),
        "activity": activity.name,
        "options": options,
    }))
}
