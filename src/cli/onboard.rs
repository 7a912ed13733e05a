//! Interactive, line-oriented onboarding.
//!
//! Reads one command per line and drives an [`OnboardingSession`]. The loop
//! is generic over its input and output so it can run against a script.

use super::common::{print_info, print_warning, CliContext};
use crate::services::{OnboardingError, OnboardingSession, SessionState};
use crate::store::CatalogRepository;
use crate::utils::form::{FieldKind, FormField, FIELDS};
use anyhow::{Context, Result};
use indoc::indoc;
use std::io::{self, BufRead, Write};
use tracing::info;

const HELP: &str = indoc! {"
    Commands:
      s, save               save this service and continue
      k, skip               continue without saving
      b, back               previous service (reloads its stored values)
      j, jump <n>           go to service number n
      set <field> <value>   change a field, e.g. 'set minTime 30'
      t, toggle <field>     flip a checkbox field (createsDust)
      sub <id>              add or remove a sub-service
      subs                  list selectable sub-services
      p, show               show the current service again
      l, list               list all main services with their status
      ?, help               this help
      q, quit               leave (unsaved edits are lost)
"};

/// Parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Save,
    Skip,
    Back,
    Jump(usize),
    Set { field: FormField, value: String },
    Toggle(FormField),
    Sub(String),
    Subs,
    Show,
    List,
    Help,
    Quit,
}

impl Command {
    /// Parse a line. `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));

        let command = match verb.to_lowercase().as_str() {
            "s" | "save" => Self::Save,
            "k" | "skip" => Self::Skip,
            "b" | "back" => Self::Back,
            "j" | "jump" => {
                let position: usize = rest
                    .parse()
                    .map_err(|_| format!("'{}' is not a position", rest))?;
                if position == 0 {
                    return Err("positions start at 1".to_string());
                }
                Self::Jump(position - 1)
            }
            "set" => {
                let (key, value) = rest
                    .split_once(char::is_whitespace)
                    .map_or((rest, ""), |(key, value)| (key, value.trim()));
                Self::Set {
                    field: parse_field(key)?,
                    value: value.to_string(),
                }
            }
            "t" | "toggle" => Self::Toggle(parse_field(rest)?),
            "sub" if !rest.is_empty() => Self::Sub(rest.to_string()),
            "subs" => Self::Subs,
            "p" | "show" => Self::Show,
            "l" | "list" => Self::List,
            "?" | "h" | "help" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            _ => return Err(format!("unknown command '{}' (? for help)", line)),
        };
        Ok(Some(command))
    }
}

fn parse_field(key: &str) -> Result<FormField, String> {
    FormField::from_key(key).ok_or_else(|| {
        let keys: Vec<&str> = FIELDS.iter().map(|spec| spec.key).collect();
        format!("unknown field '{}' (fields: {})", key, keys.join(", "))
    })
}

pub(super) fn cmd_onboard(start: Option<usize>) -> Result<()> {
    info!("CLI: onboard command executed");
    let ctx = CliContext::load()?;
    let options = ctx.classify_options();

    let mut session = OnboardingSession::start(ctx.db, options)
        .context("Failed to start onboarding")?;
    for warning in session.warnings() {
        print_warning(&warning.to_string());
    }
    if session.state() == SessionState::Empty {
        print_info("No main services to configure. Run 'paintquote seed' first.");
        return Ok(());
    }
    if let Some(position) = start {
        session
            .jump_to(position.saturating_sub(1))
            .context("Invalid start position")?;
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    run(&mut session, stdin.lock(), stdout.lock())
}

/// Run the prompt loop until the session finishes, the user quits, or the
/// input ends.
pub fn run<R, I, W>(session: &mut OnboardingSession<R>, input: I, mut out: W) -> Result<()>
where
    R: CatalogRepository,
    I: BufRead,
    W: Write,
{
    render(session, &mut out)?;
    let mut lines = input.lines();

    while !session.is_finished() {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line.context("Failed to read input")?;

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "✗ {}", message)?;
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => write!(out, "{}", HELP)?,
            Command::Show => render(session, &mut out)?,
            Command::List => list(session, &mut out)?,
            Command::Subs => list_subs(session, &mut out)?,
            Command::Set { field, value } => {
                let result = session.set_field(field, &value).map(|()| {
                    format!("{} = {}", field.label(), session.form().display_value(field))
                });
                report(&mut out, result)?;
            }
            Command::Toggle(field) => {
                let result = session
                    .toggle_field(field)
                    .map(|on| format!("{} = {}", field.label(), if on { "ja" } else { "nein" }));
                report(&mut out, result)?;
            }
            Command::Sub(id) => {
                let result = session.toggle_sub_service(&id).map(|selected| {
                    if selected {
                        format!("+ {}", id)
                    } else {
                        format!("- {}", id)
                    }
                });
                report(&mut out, result)?;
            }
            Command::Save => {
                let result = session.save_and_next();
                navigated(session, &mut out, result)?;
            }
            Command::Skip => {
                let result = session.skip();
                navigated(session, &mut out, result)?;
            }
            Command::Back => {
                let previous = session.state();
                let result = session.back();
                if matches!(result, Ok(state) if state == previous) {
                    writeln!(out, "ℹ already at the first service")?;
                } else {
                    navigated(session, &mut out, result)?;
                }
            }
            Command::Jump(index) => {
                let result = session.jump_to(index);
                navigated(session, &mut out, result)?;
            }
        }
    }

    if session.state() == SessionState::Completed {
        writeln!(
            out,
            "✓ Onboarding completed: {}/{} main services configured",
            session.configured_count(),
            session.count()
        )?;
    }
    Ok(())
}

fn navigated<R: CatalogRepository, W: Write>(
    session: &OnboardingSession<R>,
    out: &mut W,
    result: Result<SessionState, OnboardingError>,
) -> Result<()> {
    match result {
        Ok(_) => render(session, out),
        Err(err) => {
            writeln!(out, "✗ {}", err)?;
            Ok(())
        }
    }
}

fn report<W: Write>(out: &mut W, result: Result<String, OnboardingError>) -> Result<()> {
    match result {
        Ok(message) => writeln!(out, "  {}", message)?,
        Err(err) => writeln!(out, "✗ {}", err)?,
    }
    Ok(())
}

fn render<R: CatalogRepository, W: Write>(
    session: &OnboardingSession<R>,
    out: &mut W,
) -> Result<()> {
    let Some(service) = session.current_service() else {
        return Ok(());
    };
    let SessionState::Editing { index } = session.state() else {
        return Ok(());
    };

    writeln!(out)?;
    writeln!(
        out,
        "[{}/{}] {}  ({})  {:.0}%",
        index + 1,
        session.count(),
        service.title,
        service.id,
        session.progress() * 100.0
    )?;
    if service.is_dual_role() {
        writeln!(out, "      also used as a sub-service")?;
    }
    if service.config_onboarding_completed {
        writeln!(out, "      already configured")?;
    }

    let form = session.form();
    for spec in FIELDS {
        let hint = match spec.kind {
            FieldKind::Checkbox => " (toggle)",
            _ => "",
        };
        writeln!(
            out,
            "  {:<24} {:<32} {}{}",
            spec.key,
            spec.label,
            form.display_value(spec.field),
            hint
        )?;
    }

    let selection = session.ordered_selection();
    if selection.is_empty() {
        writeln!(out, "  Sub-services: (none)")?;
    } else {
        let titles: Vec<String> = selection
            .iter()
            .map(|id| {
                session
                    .sub_services()
                    .iter()
                    .find(|sub| sub.id == *id)
                    .map_or_else(|| id.clone(), |sub| sub.title.clone())
            })
            .collect();
        writeln!(out, "  Sub-services: {}", titles.join(", "))?;
    }
    if let Some(error) = session.last_error() {
        writeln!(out, "  Last save failed: {}", error)?;
    }
    Ok(())
}

fn list<R: CatalogRepository, W: Write>(session: &OnboardingSession<R>, out: &mut W) -> Result<()> {
    let current = match session.state() {
        SessionState::Editing { index } => Some(index),
        _ => None,
    };
    for (i, service) in session.main_services().iter().enumerate() {
        let pointer = if current == Some(i) { ">" } else { " " };
        let marker = if service.config_onboarding_completed { "✓" } else { " " };
        writeln!(out, "{} {:>3}. {} {}", pointer, i + 1, marker, service.title)?;
    }
    Ok(())
}

fn list_subs<R: CatalogRepository, W: Write>(
    session: &OnboardingSession<R>,
    out: &mut W,
) -> Result<()> {
    let current_id = session.current_service().map(|s| s.id.as_str());
    for sub in session.sub_services() {
        if Some(sub.id.as_str()) == current_id {
            continue;
        }
        let marker = if session.selected_sub_services().contains(&sub.id) {
            "[x]"
        } else {
            "[ ]"
        };
        writeln!(out, "  {} {:<28} {}", marker, sub.id, sub.title)?;
    }
    Ok(())
}
