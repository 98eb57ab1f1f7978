use std::path::Path;

use clap::Subcommand;
use passage_core::MemberId;
use passage_core::assignment::AssignmentResolver;
use passage_core::catalog::Catalog;
use serde_json::json;

use crate::util::{print_json, report_error};

#[derive(Subcommand)]
pub enum MappingCommands {
    /// Validate the assignee mapping against the catalog
    Check,
    /// Show who a ticket for an activity would be assigned to
    Resolve {
        /// Activity name (e.g. "Tanu")
        activity: String,
    },
}

pub fn run(map: &Path, owner: MemberId, command: MappingCommands) -> i32 {
    let resolver = AssignmentResolver::new(map, owner);
    match command {
        MappingCommands::Check => check(&resolver),
        MappingCommands::Resolve { activity } => resolve(&resolver, &activity),
    }
}

fn check(resolver: &AssignmentResolver) -> i32 {
    let mapping = match resolver.load_mapping() {
        Ok(mapping) => mapping,
        Err(e) => return report_error(e.code(), &e.to_string()),
    };
    let catalog = Catalog::builtin();
    let unknown: Vec<&str> = mapping
        .keys()
        .map(String::as_str)
        .filter(|name| !catalog.contains(name))
        .collect();
    let unmapped: Vec<&str> = catalog
        .zones()
        .iter()
        .flat_map(|z| z.activities.iter())
        .map(|a| a.name)
        .filter(|name| !mapping.contains_key(*name))
        .collect();
    print_json(&json!({
        "path": resolver.path().display().to_string(),
        "entries": mapping,
        "unknown_activities": unknown,
        "unmapped_activities": unmapped,
        "fallback": resolver.fallback(),
    }))
}

fn resolve(resolver: &AssignmentResolver, activity: &str) -> i32 {
    let assignee = resolver.provider_for(activity);
    print_json(&json!({
        "activity": activity,
        "assignee": assignee,
        "mention": assignee.mention(),
        "fallback": assignee == resolver.fallback(),
    }))
}
