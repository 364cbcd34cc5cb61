//! Authentication commands.

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use credential_storage::CredentialKind;
use session_client::RegisterInput;
use std::io::{self, Write};

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

fn email_or_prompt(email: Option<String>) -> Result<String> {
    let email = match email {
        Some(email) => email.trim().to_string(),
        None => prompt("Email")?,
    };
    if email.is_empty() {
        anyhow::bail!("Email is required");
    }
    Ok(email)
}

fn ensure_persisted(ctx: &Context) -> Result<()> {
    if !ctx.client.session().is_authenticated {
        anyhow::bail!(
            "Credentials could not be saved to {}",
            ctx.paths.credentials_file().display()
        );
    }
    Ok(())
}

fn password_prompt() -> Result<String> {
    // Read password without echo
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}

/// Login with email and password.
pub async fn login(ctx: &Context, email: Option<String>, format: &OutputFormat) -> Result<()> {
    let email = email_or_prompt(email)?;
    let password = password_prompt()?;

    let user = ctx
        .client
        .login(&email, &password)
        .await
        .map_err(|e| anyhow::anyhow!("Login failed: {}", e))?;
    ensure_persisted(ctx)?;

    output::print_success(&format!("Logged in as {}", user.email), format);
    Ok(())
}

/// Create an account and log in.
pub async fn register(
    ctx: &Context,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let email = email_or_prompt(email)?;
    let password = password_prompt()?;
    let input = RegisterInput::new(email, password).with_name(first_name, last_name);

    let user = ctx
        .client
        .register(&input)
        .await
        .map_err(|e| anyhow::anyhow!("Registration failed: {}", e))?;
    ensure_persisted(ctx)?;

    output::print_success(
        &format!("Registered and logged in as {}", user.display_name()),
        format,
    );
    Ok(())
}

/// Logout and clear stored credentials.
pub fn logout(ctx: &Context, format: &OutputFormat) {
    ctx.client.logout();
    output::print_success("Logged out successfully", format);
}

/// Confirm the session with the server.
pub async fn whoami(ctx: &Context, format: &OutputFormat) -> Result<()> {
    if !ctx.client.check_auth().await {
        anyhow::bail!("Not logged in");
    }

    let session = ctx.client.session();
    match format {
        OutputFormat::Json => output::print_json(&session),
        OutputFormat::Text => {
            if let Some(user) = &session.user {
                output::print_row("User", &user.display_name());
                output::print_row("Email", &user.email);
                output::print_row("ID", &user.id);
            }
        }
    }
    Ok(())
}

/// Show what is stored locally.
pub fn status(ctx: &Context, format: &OutputFormat) {
    let session = ctx.client.session();
    let store = ctx.client.pipeline().store();
    let has_refresh = store.has(CredentialKind::Refresh);
    let credentials = ctx.paths.credentials_file();

    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "authenticated": session.is_authenticated,
            "refreshTokenStored": has_refresh,
            "graphqlUrl": ctx.graphql_url,
            "credentialsFile": credentials.display().to_string(),
        })),
        OutputFormat::Text => {
            let auth = if session.is_authenticated {
                "credentials stored (run `authctl whoami` to verify)"
            } else {
                "not logged in"
            };
            output::print_row("Auth", auth);
            output::print_row("Refresh token", if has_refresh { "yes" } else { "no" });
            output::print_row("Endpoint", &ctx.graphql_url);
            output::print_row("Credentials", &credentials.display().to_string());
        }
    }
}
