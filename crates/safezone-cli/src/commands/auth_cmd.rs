use safezone_core::auth::{login_with_google, login_with_password, logout};
use safezone_core::UserAlert;

use crate::auth::{clear_stored_session, current_session, CliAuthClient};
use crate::backend::CliStore;
use crate::commands::common::CliContext;
use crate::error::CliError;

pub async fn run_login(context: &CliContext, email: &str, password: &str) -> Result<(), CliError> {
    let auth = require_auth(context)?;
    // The profile lookup runs with the new session's token.
    let directory = CliStore::open(&context.config, None)?;

    let outcome = login_with_password(&auth, &directory, email, password).await;
    report_outcome(outcome.alert(), outcome.is_signed_in())
}

pub async fn run_login_google(context: &CliContext, id_token: &str) -> Result<(), CliError> {
    let auth = require_auth(context)?;
    let outcome = login_with_google(&auth, id_token).await;
    if outcome.is_signed_in() {
        let email = current_session(Some(&auth))
            .await
            .and_then(|session| session.user.email);
        println!(
            "Signed in with Google as {}",
            email.as_deref().unwrap_or("(no email)")
        );
    }
    report_outcome(outcome.alert(), outcome.is_signed_in())
}

pub async fn run_logout(context: &CliContext) -> Result<(), CliError> {
    match context.auth()? {
        Some(auth) => logout(&auth).await?,
        None => clear_stored_session()?,
    }
    println!("Signed out");
    Ok(())
}

pub async fn run_status(context: &CliContext) -> Result<(), CliError> {
    let auth = context.auth()?;
    if auth.is_none() {
        println!("Firebase is not configured; running in offline demo mode.");
        return Ok(());
    }

    match current_session(auth.as_ref()).await {
        Some(session) => {
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!(
                "Signed in as {} (expires_at={})",
                email_label, session.expires_at
            );
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

fn require_auth(context: &CliContext) -> Result<CliAuthClient, CliError> {
    context.auth()?.ok_or(CliError::FirebaseNotConfigured)
}

fn report_outcome(alert: Option<UserAlert>, signed_in: bool) -> Result<(), CliError> {
    match alert {
        Some(alert) if !signed_in => Err(CliError::Alert(alert)),
        Some(alert) => {
            println!("{alert}");
            Ok(())
        }
        None => Ok(()),
    }
}
