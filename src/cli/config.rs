use anyhow::Result;

use crate::core::config::Settings;

/// Validate a settings file and show the effective values.
pub fn run(path: &str) -> Result<()> {
    let settings = Settings::from_file(path)?;

    println!("Configuration is valid");
    println!("  Overdue recipients: {:?}", settings.email_recipients_overdue);
    println!(
        "  Emergency recipients: {:?}",
        settings.email_recipients_emergency
    );
    println!(
        "  Check: grace {} min, ignore after {} min",
        settings.check.grace_min, settings.check.ignore_after_min
    );
    println!(
        "  Connect: check-in grace {} min, check-out grace {} min, ignore after {} min",
        settings.connect.checkin_grace_min,
        settings.connect.checkout_grace_min,
        settings.connect.ignore_after_min
    );
    Ok(())
}
