use anyhow::Result;
use console::style;
use dialoguer::Select;

use super::{FieldMapping, active_mappings};
use crate::api::TableColumn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    StartImport,
    Abort,
}

/// Terminal prompt loop letting the operator adjust the suggested mapping
/// before the import starts.
#[inline]
pub fn edit_mappings(
    mappings: &mut [FieldMapping],
    columns: &[TableColumn],
) -> Result<EditOutcome> {
    loop {
        let mut items: Vec<String> = mappings.iter().map(format_mapping_line).collect();
        items.push(format!(
            "Start import ({} fields active)",
            active_mappings(mappings).len()
        ));
        items.push("Abort".to_string());

        let selection = Select::new()
            .with_prompt("Field mappings")
            .items(&items)
            .default(items.len() - 2)
            .interact()?;

        if selection == items.len() - 2 {
            return Ok(EditOutcome::StartImport);
        }
        if selection == items.len() - 1 {
            return Ok(EditOutcome::Abort);
        }

        edit_single_mapping(&mut mappings[selection], columns)?;
    }
}

fn edit_single_mapping(mapping: &mut FieldMapping, columns: &[TableColumn]) -> Result<()> {
    let toggle_label = if mapping.enabled { "Disable" } else { "Enable" };
    let actions = &[toggle_label, "Change destination", "Back"];

    let action = Select::new()
        .with_prompt(format!("Edit mapping for '{}'", mapping.source_field))
        .items(actions)
        .default(0)
        .interact()?;

    match action {
        0 => mapping.set_enabled(!mapping.enabled),
        1 => {
            let mut choices: Vec<String> = vec!["(unmapped)".to_string()];
            choices.extend(columns.iter().map(|c| format!("{} ({})", c.field, c.column_type)));

            let choice = Select::new()
                .with_prompt("Destination column")
                .items(&choices)
                .default(0)
                .interact()?;

            if choice == 0 {
                mapping.set_destination("");
            } else {
                mapping.set_destination(columns[choice - 1].field.clone());
            }
        }
        _ => {}
    }

    Ok(())
}

fn format_mapping_line(mapping: &FieldMapping) -> String {
    let state = if mapping.is_active() {
        style("on").green()
    } else {
        style("off").dim()
    };

    if mapping.destination.is_empty() {
        format!("{} (unmapped) [{}]", mapping.source_field, state)
    } else {
        format!(
            "{} -> {} [{}]",
            mapping.source_field, mapping.destination, state
        )
    }
}
