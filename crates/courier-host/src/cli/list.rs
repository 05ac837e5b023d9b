//! `courier list` -- show what the registry holds.

use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use courier_core::registry::{Registration, RegistrationKind};

use crate::state::AppState;

pub fn list_registrations(state: &AppState, json: bool) -> anyhow::Result<()> {
    let registrations = state.registry.registrations();

    if json {
        println!("{}", serde_json::to_string_pretty(registrations)?);
        return Ok(());
    }

    if registrations.is_empty() {
        println!();
        println!("  {}", style("No handlers registered.").dim());
        println!();
        return Ok(());
    }

    let naming = if state.options.ignore_namespace {
        "short names"
    } else {
        "full names"
    };
    println!();
    println!(
        "  {} {}",
        style("Registered Handlers").bold(),
        style(format!("({naming})")).dim()
    );
    println!();
    println!("{}", registrations_table(registrations));
    println!();
    println!(
        "  {} registration{}",
        style(registrations.len()).bold(),
        if registrations.len() == 1 { "" } else { "s" }
    );
    println!(
        "  {}",
        style("Dynamic requests are reachable with `courier send`.").dim()
    );
    println!();
    Ok(())
}

fn registrations_table(registrations: &[Registration]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Kind").fg(Color::White),
        Cell::new("Identity").fg(Color::White),
        Cell::new("Handler").fg(Color::White),
        Cell::new("Dynamic").fg(Color::White),
    ]);

    for registration in registrations {
        let kind = match registration.kind {
            RegistrationKind::Request => Cell::new("request").fg(Color::Cyan),
            RegistrationKind::Notification => Cell::new("notification").fg(Color::Yellow),
        };
        let dynamic = if registration.dynamic {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("-").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            kind,
            Cell::new(&registration.identity).fg(Color::White),
            Cell::new(registration.handler).fg(Color::DarkGrey),
            dynamic,
        ]);
    }
    table
}
