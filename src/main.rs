// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use dashboard_session::config::AppConfig;
use dashboard_session::logging::init_logging;
use dashboard_session::models::{
    BusinessDetails, ForgotPassword, ResetPassword, Session, SignInCredential, SignUpCredential,
    User,
};
use dashboard_session::onboarding::LogoUpload;
use dashboard_session::{AuthController, AuthResult, RouteGate, RouteMeta, RouteTable, SessionContext};

/// Drive the dashboard's session state from the command line.
///
/// Only the access token outlives a run. Identity comes from the sign-in
/// response and is not persisted.
#[derive(Debug, Parser)]
#[command(name = "dashboard-session", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in with email and password.
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DASHBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in.
    SignUp {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "DASHBOARD_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        phone: String,
    },
    /// Sign out and forget the stored token.
    SignOut,
    /// Request a password reset link.
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    /// Set a new password.
    ResetPassword {
        #[arg(long, env = "DASHBOARD_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Submit business details for the signed-in user.
    Onboard {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: String,
        /// PNG or JPEG, under 500kb.
        #[arg(long)]
        logo: PathBuf,
    },
    /// Show the stored token state.
    Status,
    /// Evaluate the route gate for a path.
    Route {
        path: String,
        /// Authorities to assume for the signed-in user.
        #[arg(long = "authority")]
        authority: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let context = SessionContext::from_config(&config);
    let gate = RouteGate::from_config(&config);
    let controller = match AuthController::new(config, context.clone()) {
        Ok(controller) => controller,
        Err(e) => {
            error!(error = %e, "failed to build backend client");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::SignIn { email, password } => {
            report(&controller.sign_in(&SignInCredential { email, password }).await)
        }
        Command::SignUp {
            name,
            email,
            password,
            phone,
        } => report(
            &controller
                .sign_up(&SignUpCredential {
                    name,
                    email,
                    password,
                    phone,
                })
                .await,
        ),
        Command::SignOut => {
            controller.sign_out().await;
            print_json(&json!({ "signedOut": true, "hasToken": context.tokens.has_token() }));
            ExitCode::SUCCESS
        }
        Command::ForgotPassword { email } => {
            report(&controller.forgot_password(&ForgotPassword { email }).await)
        }
        Command::ResetPassword { password } => {
            report(&controller.reset_password(&ResetPassword { password }).await)
        }
        Command::Onboard {
            name,
            email,
            phone,
            address,
            logo,
        } => {
            let logo = match LogoUpload::from_path(&logo) {
                Ok(logo) => logo,
                Err(e) => return report(&AuthResult::failed(e.message)),
            };
            let details = BusinessDetails {
                name,
                email,
                phone,
                address,
                logo: logo.data_url,
                logo_file_name: logo.file_name,
            };
            report(&controller.save_business_details(&details).await)
        }
        Command::Status => {
            print_json(&json!({
                "hasToken": context.tokens.has_token(),
                "storage": context.tokens.storage_name(),
                "session": context.snapshot(),
            }));
            ExitCode::SUCCESS
        }
        Command::Route { path, authority } => {
            let table = RouteTable::default();
            let route = table
                .find(&path)
                .cloned()
                .unwrap_or_else(|| RouteMeta::new("unknown", &path));
            let session = assumed_session(context.tokens.has_token(), authority);
            let decision = gate.check(&session, &route);
            print_json(&json!({ "route": route, "decision": decision }));
            ExitCode::SUCCESS
        }
    }
}

/// A held token counts as signed in for gate evaluation.
fn assumed_session(has_token: bool, authority: Vec<String>) -> Session {
    if !has_token {
        return Session::default();
    }
    Session {
        authenticated: true,
        user: User {
            authority: authority.into_iter().collect(),
            ..User::default()
        },
    }
}

fn report(result: &AuthResult) -> ExitCode {
    print_json(result);
    if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(out) => println!("{out}"),
        Err(e) => error!(error = %e, "failed to render output"),
    }
}
