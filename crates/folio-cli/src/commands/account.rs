//! Sign-in, sign-up and sign-out

use anyhow::{Context, Result};

use folio_core::{AuthError, Folio, SessionProvider, SignUpOutcome};

use super::password_or_prompt;
use crate::output::Output;

pub async fn login(
    app: &Folio,
    email: String,
    password: Option<String>,
    output: &Output,
) -> Result<()> {
    let password = password_or_prompt(password)?;
    match app.auth.sign_in(&email, &password).await {
        Ok(session) => {
            output.success(&format!("Signed in as {}", session.email()));
            Ok(())
        }
        Err(AuthError::InvalidCredentials(_)) => anyhow::bail!("Invalid email or password"),
        Err(e) => Err(e).context("Sign-in failed"),
    }
}

pub async fn signup(
    app: &Folio,
    email: String,
    password: Option<String>,
    output: &Output,
) -> Result<()> {
    let password = password_or_prompt(password)?;
    let outcome = app
        .auth
        .sign_up(&email, &password)
        .await
        .context("Sign-up failed")?;

    match outcome {
        SignUpOutcome::SignedIn(session) => {
            output.success(&format!("Account created, signed in as {}", session.email()))
        }
        SignUpOutcome::ConfirmationRequired => {
            output.success("Account created. Check your email to confirm it, then run `folio login`.")
        }
    }
    Ok(())
}

pub async fn logout(app: &Folio, output: &Output) -> Result<()> {
    app.auth.sign_out().await.context("Sign-out failed")?;
    output.success("Signed out");
    Ok(())
}
