//! Catalog commands: seed, services, show, status.

use super::common::{print_info, print_success, print_warning, prompt_confirm, CliContext};
use super::ServiceFilter;
use crate::catalog::Service;
use crate::services::{CatalogService, SeedService, SpecialServiceService, SubServiceResolver};
use crate::utils::form::{ServiceForm, FIELDS};
use crate::utils::path::expand_path;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::info;

pub(super) fn cmd_seed(file: Option<PathBuf>, reset: bool, yes: bool) -> Result<()> {
    info!("CLI: seed command executed (reset: {})", reset);
    let mut ctx = CliContext::load()?;

    let payload = match &file {
        Some(path) => SeedService::load_payload(&expand_path(&path.to_string_lossy()))?,
        None => SeedService::reference_catalog()?,
    };

    if reset {
        let stored = ctx.db.services().count()
            + ctx.db.special_services().count()
            + ctx.db.surcharge_factors().count();
        if stored > 0
            && !yes
            && !prompt_confirm(&format!("Remove all {} stored documents first?", stored))?
        {
            print_info("Seeding aborted, nothing was changed");
            return Ok(());
        }
        let removed = SeedService::reset(&mut ctx.db)?;
        print_info(&format!("Removed {} documents", removed));
    }

    let report = SeedService::seed(&mut ctx.db, &payload)?;
    let source = file
        .as_ref()
        .map_or_else(|| "reference catalog".to_string(), |p| p.display().to_string());
    print_success(&format!(
        "Seeded from {}: {} inserted, {} already present",
        source,
        report.inserted(),
        report.skipped()
    ));
    println!(
        "   services: {}/{}  special services: {}/{}  surcharge factors: {}/{}",
        report.services.inserted,
        payload.services.len(),
        report.special_services.inserted,
        payload.special_services.len(),
        report.surcharge_factors.inserted,
        payload.surcharge_factors.len()
    );
    Ok(())
}

pub(super) fn cmd_services(filter: ServiceFilter) -> Result<()> {
    let ctx = CliContext::load()?;
    let classification =
        CatalogService::classify(ctx.db.services().find_all(), &ctx.classify_options());

    for warning in &classification.warnings {
        print_warning(&warning.to_string());
    }

    if filter.dual {
        let dual: Vec<&Service> = classification
            .main_services
            .iter()
            .filter(|s| CatalogService::is_dual_role(s))
            .collect();
        print_list("Dual-role services", &dual);
        return Ok(());
    }
    if !filter.sub {
        let main: Vec<&Service> = classification.main_services.iter().collect();
        print_list("Main services", &main);
    }
    if !filter.main {
        if !filter.sub {
            println!();
        }
        let subs: Vec<&Service> = classification.sub_services.iter().collect();
        print_list("Sub-services", &subs);
    }
    Ok(())
}

fn print_list(heading: &str, services: &[&Service]) {
    println!("{} ({}):", heading, services.len());
    if services.is_empty() {
        println!("  (none)");
    }
    for service in services {
        let marker = if service.config_onboarding_completed { "✓" } else { " " };
        let dual = if service.is_dual_role() { "  [+sub]" } else { "" };
        println!("  {} {}  ({}){}", marker, service.title, service.id, dual);
    }
}

pub(super) fn cmd_show(id: &str) -> Result<()> {
    let ctx = CliContext::load()?;
    let Some(service) = ctx.db.services().find_by_id(id) else {
        bail!("Service '{}' not found", id);
    };

    println!("{}  ({})", service.title, service.id);
    let tags = service
        .service_type
        .as_ref()
        .map_or_else(|| "(missing)".to_string(), |tags| tags.composite_label());
    println!("  Type:        {}", tags);
    if let Some(parent) = &service.parent_service_id {
        let title = ctx
            .db
            .services()
            .find_by_id(parent)
            .map_or("unknown", |p| p.title.as_str());
        println!("  Category:    {} ({})", title, parent);
    }
    if !service.included_in.is_empty() {
        println!("  Included in: {}", service.included_in.join(", "));
    }
    if let Some(updated) = service.updated_at {
        println!("  Updated:     {}", updated.format("%Y-%m-%d %H:%M"));
    }

    println!("\n  Configuration:");
    let form = ServiceForm::from_config(&service.config);
    for spec in FIELDS {
        println!("    {:<32} {}", spec.label, form.display_value(spec.field));
    }

    if service.is_main_service() {
        let subs = CatalogService::sub_services(&ctx.db.services().find_all());
        let selected = SubServiceResolver::resolve_selected(service, &subs);
        println!("\n  Sub-services ({}):", selected.len());
        for sub_id in SubServiceResolver::ordered_selection(&selected, &subs) {
            let title = subs
                .iter()
                .find(|s| s.id == sub_id)
                .map_or("unknown", |s| s.title.as_str());
            println!("    - {} ({})", title, sub_id);
        }
    }

    println!("\n  Onboarding:");
    println!("    configuration   {}", yes_no(service.config_onboarding_completed));
    println!("    material        {}", yes_no(service.material_onboarding_completed));
    println!(
        "    as sub-service  {}",
        yes_no(service.sub_service_config_onboarding_completed)
    );
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "done"
    } else {
        "open"
    }
}

pub(super) fn cmd_status() -> Result<()> {
    let ctx = CliContext::load()?;
    let classification =
        CatalogService::classify(ctx.db.services().find_all(), &ctx.classify_options());

    let total = classification.main_services.len();
    let configured = classification
        .main_services
        .iter()
        .filter(|s| s.config_onboarding_completed)
        .count();
    let percent = if total == 0 {
        100.0
    } else {
        configured as f64 * 100.0 / total as f64
    };

    println!("Catalog: {} records", classification.catalog_size);
    println!(
        "  Main services:     {}/{} configured ({:.0}%)",
        configured, total, percent
    );
    println!("  Dual-role:         {}", classification.dual_role_count());
    println!("  Sub-services:      {}", classification.sub_services.len());
    println!(
        "  Special services:  {} pending of {}",
        SpecialServiceService::pending_count(&ctx.db),
        ctx.db.special_services().count()
    );
    println!(
        "  Surcharge factors: {}",
        ctx.db.surcharge_factors().count()
    );

    for warning in &classification.warnings {
        print_warning(&warning.to_string());
    }

    if total > 0 && configured < total {
        let next = classification
            .main_services
            .iter()
            .position(|s| !s.config_onboarding_completed)
            .context("no open service")?;
        print_info(&format!(
            "Continue with: paintquote onboard --start {}",
            next + 1
        ));
    }
    Ok(())
}
