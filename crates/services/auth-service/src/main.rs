//! Auth Service - operator command line.
//!
//! Runs each authentication operation against the configured Postgres
//! store and Redis cache and prints the result as JSON.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth_service_lib::config::AuthServiceConfig;
use auth_service_lib::service::AuthService;
use common::{AppError, AppResult};
use domain::{UserResponse, BEARER_TOKEN_PREFIX};

#[derive(Parser, Debug)]
#[command(name = "auth-service")]
#[command(author, version, about = "Authentication service for the contacts backend", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a new account and print its confirmation token
    Register(CredentialArgs),
    /// Issue a fresh email confirmation token
    RequestVerification(EmailArgs),
    /// Confirm an email address
    VerifyEmail(TokenArgs),
    /// Log in and print an access/refresh token pair
    Login(CredentialArgs),
    /// Exchange a refresh token for a new pair
    Refresh(TokenArgs),
    /// Show the user behind an access token
    Whoami(TokenArgs),
    /// Revoke the session behind an access token
    Logout(TokenArgs),
    /// Issue a password reset token
    ForgotPassword(EmailArgs),
    /// Set a new password with a reset token
    ResetPassword(ResetArgs),
    /// Check database and cache connectivity
    Health,
}

#[derive(Args, Debug)]
struct CredentialArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "AUTH_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct EmailArgs {
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct TokenArgs {
    /// Token, with or without the "Bearer " prefix
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    token: String,
}

impl TokenArgs {
    fn raw(&self) -> &str {
        self.token
            .strip_prefix(BEARER_TOKEN_PREFIX)
            .unwrap_or(&self.token)
            .trim()
    }
}

#[derive(Args, Debug)]
struct ResetArgs {
    #[command(flatten)]
    token: TokenArgs,
    #[arg(long, env = "AUTH_PASSWORD", hide_env_values = true)]
    password: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command).await {
        if e.is_auth_rejection() {
            tracing::warn!(code = e.code(), "Command rejected: {}", e);
        } else {
            tracing::error!(code = e.code(), "Command failed: {}", e);
        }
        eprintln!(
            "{}",
            json!({ "error": { "code": e.code(), "message": e.user_message() } })
        );
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> AppResult<()> {
    let config = AuthServiceConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    if let Commands::Health = command {
        auth_service_lib::check_health(&config).await?;
        return print(&json!({ "status": "ok" }));
    }

    let service = auth_service_lib::connect(&config).await?;

    match command {
        Commands::Register(args) => {
            let user = service.register(args.email, args.password).await?;
            let verification = service.request_verification(&user.email).await?;
            print(&json!({
                "user": UserResponse::from(user),
                "verification": verification,
            }))
        }
        Commands::RequestVerification(args) => {
            print(&service.request_verification(&args.email).await?)
        }
        Commands::VerifyEmail(args) => {
            service.verify_email(args.raw()).await?;
            print(&json!({ "message": "Email confirmed" }))
        }
        Commands::Login(args) => print(&service.authenticate(&args.email, &args.password).await?),
        Commands::Refresh(args) => print(&service.refresh(args.raw()).await?),
        Commands::Whoami(args) => {
            let user = service.current_user(args.raw()).await?;
            print(&UserResponse::from(user))
        }
        Commands::Logout(args) => {
            service.logout(args.raw()).await?;
            print(&json!({ "message": "Logged out" }))
        }
        Commands::ForgotPassword(args) => {
            let token = service.request_password_reset(&args.email).await?;
            print(&json!({ "reset_token": token }))
        }
        Commands::ResetPassword(args) => {
            service.reset_password(args.token.raw(), &args.password).await?;
            print(&json!({ "message": "Password updated" }))
        }
        Commands::Health => Ok(()),
    }
}

fn print<T: Serialize>(value: &T) -> AppResult<()> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::internal(format!("Output serialization failed: {}", e)))?;
    println!("{}", out);
    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_password_strips_bearer_prefix() {
        let cli = Cli::try_parse_from([
            "auth-service",
            "reset-password",
            "--token",
            "Bearer abc.def.ghi",
            "--password",
            "new-pw",
        ])
        .unwrap();

        match cli.command {
            Commands::ResetPassword(args) => {
                assert_eq!(args.token.raw(), "abc.def.ghi");
                assert_eq!(args.password, "new-pw");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_token_without_prefix_is_unchanged() {
        let cli = Cli::try_parse_from(["auth-service", "whoami", "--token", "abc.def.ghi"]).unwrap();

        match cli.command {
            Commands::Whoami(args) => assert_eq!(args.raw(), "abc.def.ghi"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
