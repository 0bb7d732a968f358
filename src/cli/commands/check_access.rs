use clap::ValueEnum;
use serde_json::json;

use crate::access::{AccessPolicy, Decision, SessionState};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::types::Role;

/// Session to evaluate the path against
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SessionArg {
    Owner,
    Admin,
    Member,
    /// Signed in, but with no usable role
    Unknown,
    /// Not signed in
    None,
}

impl SessionArg {
    pub fn state(self) -> SessionState {
        match self {
            SessionArg::Owner => SessionState::with_role(Role::Owner),
            SessionArg::Admin => SessionState::with_role(Role::Admin),
            SessionArg::Member => SessionState::with_role(Role::Member),
            SessionArg::Unknown => SessionState::unknown_role(),
            SessionArg::None => SessionState::NoSession,
        }
    }
}

pub fn handle(path: &str, session: SessionArg, output_format: OutputFormat) -> anyhow::Result<()> {
    let access = &config::config().access;
    let policy = AccessPolicy::new(access.route_table()?, access.unknown_role);
    report(&policy, path, session, output_format)
}

fn report(policy: &AccessPolicy, path: &str, session: SessionArg, output_format: OutputFormat) -> anyhow::Result<()> {
    let class = policy.classify(path);
    let step = policy.decide(path, session.state());
    let outcome = policy.evaluate(path, session.state());

    let message = format!(
        "{} is {:?}: {} (final: {})",
        path,
        class,
        describe(policy, step),
        describe(policy, outcome)
    );
    output_success(
        output_format,
        &message,
        Some(json!({
            "path": path,
            "class": format!("{:?}", class),
            "decision": step,
            "outcome": outcome,
            "location": location(policy, outcome),
        })),
    )
}

fn describe(policy: &AccessPolicy, decision: Decision) -> String {
    match location(policy, decision) {
        Some(url) => format!("redirect to {}", url),
        None => "allow".to_string(),
    }
}

fn location(policy: &AccessPolicy, decision: Decision) -> Option<&str> {
    match decision {
        Decision::Allow => None,
        Decision::Redirect(target) => Some(policy.routes().url(target)),
    }
}
