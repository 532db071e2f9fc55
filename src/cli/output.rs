//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use std::collections::HashMap;

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::password::{Strength, StrengthReport};
use crate::vault::{Category, PasswordEntry};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Colored strength label with the percentage.
pub fn strength_label(report: &StrengthReport) -> String {
    let text = format!("{} ({}%)", report.strength, report.percent());
    match report.strength {
        Strength::Weak => style(text).red().to_string(),
        Strength::Medium => style(text).yellow().to_string(),
        Strength::Strong => style(text).green().to_string(),
    }
}

fn category_names(categories: &[Category]) -> HashMap<i64, &str> {
    categories.iter().map(|c| (c.id, c.name.as_str())).collect()
}

/// Print a table of entries (Id, Name, Username, Category, Website, Updated).
///
/// Secret columns are never shown here.
pub fn print_entries_table(entries: &[PasswordEntry], categories: &[Category]) {
    if entries.is_empty() {
        info("No entries found.");
        tip("Run `securepass add <NAME>` to add your first entry.");
        return;
    }

    let names = category_names(categories);
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Name", "Username", "Category", "Website", "Updated"]);

    for e in entries {
        let category = e
            .category_id
            .and_then(|id| names.get(&id).copied())
            .unwrap_or("-");
        table.add_row(vec![
            e.id.to_string(),
            e.name.clone(),
            e.username.clone().unwrap_or_default(),
            category.to_string(),
            e.website_url.clone().unwrap_or_default(),
            e.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print a table of categories with the number of entries in each.
pub fn print_categories_table(categories: &[Category], counts: &HashMap<i64, usize>) {
    if categories.is_empty() {
        info("No categories.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Name", "Color", "Entries"]);

    for c in categories {
        table.add_row(vec![
            c.id.to_string(),
            c.name.clone(),
            c.color.clone(),
            counts.get(&c.id).copied().unwrap_or(0).to_string(),
        ]);
    }

    println!("{table}");
}

/// Print one entry as aligned `label: value` lines.
///
/// `password` and `notes` are the caller's decrypted (or masked) values.
pub fn print_entry(
    entry: &PasswordEntry,
    category: Option<&Category>,
    password: &str,
    notes: Option<&str>,
) {
    let row = |label: &str, value: &str| {
        println!("{:>10}  {}", style(label).bold(), value);
    };

    row("Id", &entry.id.to_string());
    row("Name", &entry.name);
    if let Some(username) = &entry.username {
        row("Username", username);
    }
    row("Password", password);
    if let Some(url) = &entry.website_url {
        row("Website", url);
    }
    row("Category", category.map_or("-", |c| c.name.as_str()));
    if let Some(notes) = notes {
        row("Notes", notes);
    }
    row("TOTP", if entry.has_totp() { "yes" } else { "no" });
    row("Created", &entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string());
    row("Updated", &entry.updated_at.format("%Y-%m-%d %H:%M:%S").to_string());
}
