//! Special service commands.

use super::common::{print_success, prompt_string, CliContext};
use super::SpecialCommand;
use crate::services::SpecialServiceService;
use crate::utils::form::coerce_number;
use anyhow::{Context, Result};
use tracing::info;

pub(super) fn cmd_special(command: SpecialCommand) -> Result<()> {
    match command {
        SpecialCommand::List => cmd_list(),
        SpecialCommand::Configure { id, factor } => cmd_configure(&id, factor),
    }
}

fn cmd_list() -> Result<()> {
    let ctx = CliContext::load()?;
    let specials = SpecialServiceService::list(&ctx.db);
    println!("Special services ({}):", specials.len());
    for special in &specials {
        let marker = if special.onboarding_completed { "✓" } else { " " };
        println!(
            "  {} {:<40} ×{:<6} ({})",
            marker, special.title, special.factor, special.id
        );
        if !special.affects_area.is_empty() {
            println!("      areas: {}", special.affects_area.join(", "));
        }
        if let Some(required) = &special.required_service {
            println!("      requires: {}", required);
        }
    }

    let factors = ctx.db.surcharge_factors().find_all();
    println!("\nSurcharge factors ({}):", factors.len());
    for factor in &factors {
        println!("    {:<40} ×{:<6} ({})", factor.title, factor.factor, factor.id);
    }
    Ok(())
}

fn cmd_configure(id: &str, factor: Option<f64>) -> Result<()> {
    info!("CLI: special configure {}", id);
    let mut ctx = CliContext::load()?;

    let factor = match factor {
        Some(factor) => factor,
        None => {
            let current = ctx
                .db
                .special_services()
                .find_by_id(id)
                .with_context(|| format!("Special service '{}' not found", id))?
                .factor
                .to_string();
            coerce_number(&prompt_string("Factor", Some(&current))?)
        }
    };

    let updated = SpecialServiceService::configure(&mut ctx.db, id, factor)?;
    print_success(&format!(
        "'{}' now applies factor {}",
        updated.title, updated.factor
    ));
    Ok(())
}
