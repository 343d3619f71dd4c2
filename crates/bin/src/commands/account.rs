//! Account commands: signup, login, logout, whoami.

use movy::{AuthManager, Session};

use crate::cli::{LoginArgs, OutputFormat, SignupArgs};

pub async fn signup(
    manager: &AuthManager,
    args: &SignupArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = manager.sign_up(&args.name, &args.email, &args.password).await?;
    print_session(Some(&session), format)
}

pub async fn login(
    manager: &AuthManager,
    args: &LoginArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = manager.log_in(&args.email, &args.password).await?;
    print_session(Some(&session), format)
}

pub fn logout(manager: &AuthManager) -> Result<(), Box<dyn std::error::Error>> {
    manager.log_out()?;
    Ok(())
}

pub fn whoami(manager: &AuthManager, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    print_session(manager.current_session().as_ref(), format)
}

fn print_session(
    session: Option<&Session>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => match session {
            Some(session) => {
                println!("User ID:  {}", session.user_id);
                println!("Name:     {}", session.name);
                println!("Email:    {}", session.email);
                println!(
                    "Mode:     {}",
                    if session.is_offline() { "offline" } else { "online" }
                );
            }
            None => println!("Not logged in"),
        },
        OutputFormat::Json => {
            let value = match session {
                Some(session) => serde_json::json!({
                    "logged_in": true,
                    "user_id": session.user_id,
                    "name": session.name,
                    "email": session.email,
                    "offline": session.is_offline(),
                }),
                None => serde_json::json!({ "logged_in": false }),
            };
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}
