//! Route access policy.
//!
//! [`AccessPolicy::decide`] is the single-step decision table. It takes a
//! request path and the session state resolved for that request and says
//! whether the request passes or where it should be sent instead:
//!
//! | # | Condition                                              | Result                               |
//! |---|--------------------------------------------------------|--------------------------------------|
//! | 1 | bypass path                                            | allow                                |
//! | 2 | protected area, no session                             | team area → team login, else login   |
//! | 3 | owner on a team member path                            | owner home                           |
//! | 4 | non-owner on an owner path                             | team home                            |
//! | 5 | non-owner on the owner login page                      | team login                           |
//! | 6 | owner on the team login page                           | owner login                          |
//! | 7 | owner login page with a session                        | owner → owner home, else team home   |
//! | 8 | team login page with a session                         | owner → owner home, else team home   |
//! | 9 | anything else                                          | allow                                |
//!
//! [`AccessPolicy::evaluate`] follows redirects through the same table until
//! it reaches a destination the caller may stay on, so a team member hitting
//! `/login` lands on the team dashboard instead of bouncing through
//! `/team-login` first.

use serde::{Deserialize, Serialize};

use super::routes::{RedirectTarget, RouteClass, RouteTable};
use crate::types::Role;

/// What to do when a session exists but no active membership could be found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownRolePolicy {
    /// Protected areas redirect to the matching login page.
    #[default]
    FailClosed,
    /// Role-specific rules are skipped and the request is allowed.
    FailOpen,
}

impl std::str::FromStr for UnknownRolePolicy {
    type Err = crate::types::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_closed" | "closed" => Ok(UnknownRolePolicy::FailClosed),
            "fail_open" | "open" => Ok(UnknownRolePolicy::FailOpen),
            other => Err(crate::types::ParseEnumError {
                kind: "unknown role policy",
                value: other.to_string(),
            }),
        }
    }
}

/// Session state as the policy sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoSession,
    /// `role` is `None` when the membership lookup failed or found nothing active.
    Session { role: Option<Role> },
}

impl SessionState {
    pub fn with_role(role: Role) -> Self {
        SessionState::Session { role: Some(role) }
    }

    pub fn unknown_role() -> Self {
        SessionState::Session { role: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "target")]
pub enum Decision {
    Allow,
    Redirect(RedirectTarget),
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    routes: RouteTable,
    unknown_role: UnknownRolePolicy,
}

impl AccessPolicy {
    pub fn new(routes: RouteTable, unknown_role: UnknownRolePolicy) -> Self {
        Self { routes, unknown_role }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn unknown_role_policy(&self) -> UnknownRolePolicy {
        self.unknown_role
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        self.routes.classify(path)
    }

    /// One pass over the decision table.
    pub fn decide(&self, path: &str, session: SessionState) -> Decision {
        self.decide_class(self.routes.classify(path), session)
    }

    fn decide_class(&self, class: RouteClass, session: SessionState) -> Decision {
        use RedirectTarget::*;

        if class == RouteClass::Bypass {
            return Decision::Allow;
        }

        let role = match session {
            SessionState::NoSession => return login_for(class).map_or(Decision::Allow, Decision::Redirect),
            SessionState::Session { role: Some(role) } => role,
            SessionState::Session { role: None } => {
                return match self.unknown_role {
                    UnknownRolePolicy::FailClosed => {
                        login_for(class).map_or(Decision::Allow, Decision::Redirect)
                    }
                    UnknownRolePolicy::FailOpen => Decision::Allow,
                };
            }
        };

        let home = if role.is_owner() { OwnerHome } else { TeamHome };

        match class {
            RouteClass::TeamMemberArea if role.is_owner() => Decision::Redirect(OwnerHome),
            RouteClass::OwnerArea if !role.is_owner() => Decision::Redirect(TeamHome),
            RouteClass::AuthPage if !role.is_owner() => Decision::Redirect(TeamLogin),
            RouteClass::TeamAuthPage if role.is_owner() => Decision::Redirect(OwnerLogin),
            RouteClass::AuthPage | RouteClass::TeamAuthPage => Decision::Redirect(home),
            _ => Decision::Allow,
        }
    }

    /// Decide, then follow any redirect through the table with the same
    /// session state and return the final destination.
    pub fn evaluate(&self, path: &str, session: SessionState) -> Decision {
        let first = self.decide(path, session);
        let mut current = first;
        let mut seen: Vec<RedirectTarget> = Vec::with_capacity(RedirectTarget::ALL.len());

        while let Decision::Redirect(target) = current {
            if seen.contains(&target) {
                return first;
            }
            seen.push(target);

            match self.decide(self.routes.url(target), session) {
                Decision::Allow => return Decision::Redirect(target),
                next => current = next,
            }
        }

        current
    }
}

fn login_for(class: RouteClass) -> Option<RedirectTarget> {
    match class {
        RouteClass::TeamMemberArea => Some(RedirectTarget::TeamLogin),
        RouteClass::OwnerArea => Some(RedirectTarget::OwnerLogin),
        _ => None,
    }
}
