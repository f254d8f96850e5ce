//! Confirmation before anything is deleted

use std::time::Duration;

use colored::Colorize;
use dialoguer::{Input, theme::ColorfulTheme};

use crate::error::{Error, Result};
use crate::nuke::{Parameters, Prompt};

/// Prompt requiring the tenant id to be typed, or a countdown when forced.
pub fn for_tenant(tenant_id: &str, params: &Parameters) -> Prompt {
    let tenant_id = tenant_id.to_string();
    let force = params.force;
    let force_sleep = params.force_sleep;

    Box::new(move || {
        if force {
            countdown(&tenant_id, force_sleep);
            Ok(())
        } else {
            ask(&tenant_id)
        }
    })
}

fn ask(tenant_id: &str) -> Result<()> {
    println!(
        "{} Do you really want to nuke the tenant with the ID {}?",
        "⚠".yellow(),
        tenant_id.bold()
    );
    let answer: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter the tenant id to continue")
        .allow_empty(true)
        .interact_text()?;

    check_answer(tenant_id, &answer)
}

fn countdown(tenant_id: &str, seconds: u64) {
    println!(
        "{} Nuking tenant {} without confirmation in {} seconds. Press Ctrl-C to abort.",
        "⚠".yellow(),
        tenant_id.bold(),
        seconds
    );
    std::thread::sleep(Duration::from_secs(seconds));
}

fn check_answer(tenant_id: &str, answer: &str) -> Result<()> {
    if answer.trim() == tenant_id {
        Ok(())
    } else {
        Err(Error::Aborted(
            "the entered tenant id does not match".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_must_match_tenant() {
        assert!(check_answer("t1", " t1\n").is_ok());
        assert!(matches!(check_answer("t1", "t2"), Err(Error::Aborted(_))));
        assert!(matches!(check_answer("t1", ""), Err(Error::Aborted(_))));
    }
}
