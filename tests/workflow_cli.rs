//! Integration tests for the interactive onboarding prompt, driven by a
//! scripted input.

mod common;

use anyhow::Result;
use common::{main_service, sub_service, TestEnv};
use paintquote::catalog::MaterialType;
use paintquote::cli::onboard;
use paintquote::services::SessionState;
use std::io::Cursor;

fn run_script(env: &TestEnv, script: &str) -> Result<(SessionState, String)> {
    let mut session = env.session()?;
    let mut out = Vec::new();
    onboard::run(&mut session, Cursor::new(script.to_string()), &mut out)?;
    Ok((session.state(), String::from_utf8(out)?))
}

#[test]
fn scripted_walkthrough_saves_and_completes() -> Result<()> {
    let env = TestEnv::new()?
        .with_service(main_service("m1", "Decke streichen"))
        .with_service(main_service("m2", "Wand streichen"))
        .with_service(sub_service("s1", "Abkleben", &[]))
        .build()?;

    let script = "set minTime 40\nset materialType fixed\nsub s1\ntoggle createsDust\ns\nk\n";
    let (state, output) = run_script(&env, script)?;

    assert_eq!(state, SessionState::Completed);
    assert!(output.contains("[1/2] Decke streichen"));
    assert!(output.contains("[2/2] Wand streichen"));
    assert!(output.contains("Onboarding completed: 1/2"));

    let stored = env.stored_service("m1")?;
    assert_eq!(stored.config.min_time, Some(40.0));
    assert_eq!(stored.config.material_type, Some(MaterialType::Fixed));
    assert_eq!(stored.config.creates_dust, Some(true));
    assert_eq!(stored.included_sub_services, vec!["s1".to_string()]);
    assert!(!env.stored_service("m2")?.config_onboarding_completed);
    Ok(())
}

#[test]
fn bad_input_is_reported_and_loop_continues() -> Result<()> {
    let env = TestEnv::new()?
        .with_service(main_service("m1", "A"))
        .build()?;

    let script = "paint\nset workflowPhase tapezieren\nj 9\nb\nq\n";
    let (state, output) = run_script(&env, script)?;

    assert_eq!(state, SessionState::Editing { index: 0 });
    assert!(output.contains("unknown command 'paint'"));
    assert!(output.contains("'tapezieren' is not a valid value"));
    assert!(output.contains("out of range"));
    assert!(output.contains("already at the first service"));
    assert!(env.stored_service("m1")?.updated_at.is_none());
    Ok(())
}

#[test]
fn end_of_input_leaves_without_saving() -> Result<()> {
    let env = TestEnv::new()?
        .with_service(main_service("m1", "A"))
        .build()?;

    let (state, _) = run_script(&env, "set minTime 5\n")?;

    assert_eq!(state, SessionState::Editing { index: 0 });
    assert_eq!(env.stored_service("m1")?.config.min_time, None);
    Ok(())
}
