use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a request path falls in the route table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    Bypass,
    OwnerArea,
    TeamMemberArea,
    AuthPage,
    TeamAuthPage,
    Other,
}

impl RouteClass {
    pub fn is_protected(&self) -> bool {
        matches!(self, RouteClass::OwnerArea | RouteClass::TeamMemberArea)
    }
}

/// Named redirect destinations; the route table maps them to URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectTarget {
    OwnerLogin,
    TeamLogin,
    OwnerHome,
    TeamHome,
}

impl RedirectTarget {
    pub const ALL: [RedirectTarget; 4] = [
        RedirectTarget::OwnerLogin,
        RedirectTarget::TeamLogin,
        RedirectTarget::OwnerHome,
        RedirectTarget::TeamHome,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destinations {
    pub owner_login: String,
    pub team_login: String,
    pub owner_home: String,
    pub team_home: String,
}

impl Destinations {
    pub fn url(&self, target: RedirectTarget) -> &str {
        match target {
            RedirectTarget::OwnerLogin => &self.owner_login,
            RedirectTarget::TeamLogin => &self.team_login,
            RedirectTarget::OwnerHome => &self.owner_home,
            RedirectTarget::TeamHome => &self.team_home,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("route '{0}' must start with '/'")]
    NotAbsolute(String),

    #[error("route prefix '{prefix}' in {set} overlaps '{other}' in {other_set}")]
    Overlap {
        prefix: String,
        set: &'static str,
        other: String,
        other_set: &'static str,
    },

    #[error("auth page '{page}' is covered by {set} prefix '{prefix}'")]
    AuthPageCovered {
        page: String,
        set: &'static str,
        prefix: String,
    },

    #[error("owner and team auth pages must differ (both '{0}')")]
    AuthPagesEqual(String),

    #[error("destination {target:?} is '{url}' but must {expected}")]
    InconsistentDestination {
        target: RedirectTarget,
        url: String,
        expected: &'static str,
    },
}

/// Static route classification table. Construct through [`RouteTable::new`]
/// so the set invariants are checked once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteTable {
    owner_paths: Vec<String>,
    team_member_paths: Vec<String>,
    bypass: Vec<String>,
    auth_page: String,
    team_auth_page: String,
    destinations: Destinations,
}

impl RouteTable {
    pub fn new(
        owner_paths: Vec<String>,
        team_member_paths: Vec<String>,
        bypass: Vec<String>,
        auth_page: impl Into<String>,
        team_auth_page: impl Into<String>,
        destinations: Destinations,
    ) -> Result<Self, RouteTableError> {
        let table = Self {
            owner_paths: owner_paths.iter().map(|p| normalize(p).to_string()).collect(),
            team_member_paths: team_member_paths.iter().map(|p| normalize(p).to_string()).collect(),
            bypass: bypass.iter().map(|p| normalize(p).to_string()).collect(),
            auth_page: normalize(&auth_page.into()).to_string(),
            team_auth_page: normalize(&team_auth_page.into()).to_string(),
            destinations,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn auth_page(&self) -> &str {
        &self.auth_page
    }

    pub fn team_auth_page(&self) -> &str {
        &self.team_auth_page
    }

    pub fn destinations(&self) -> &Destinations {
        &self.destinations
    }

    pub fn url(&self, target: RedirectTarget) -> &str {
        self.destinations.url(target)
    }

    /// Classify a request path. Bypass is checked first.
    pub fn classify(&self, path: &str) -> RouteClass {
        let path = normalize(path);

        if any_prefix(&self.bypass, path) {
            return RouteClass::Bypass;
        }
        if path == self.auth_page {
            return RouteClass::AuthPage;
        }
        if path == self.team_auth_page {
            return RouteClass::TeamAuthPage;
        }
        if any_prefix(&self.owner_paths, path) {
            return RouteClass::OwnerArea;
        }
        if any_prefix(&self.team_member_paths, path) {
            return RouteClass::TeamMemberArea;
        }
        RouteClass::Other
    }

    fn sets(&self) -> [(&'static str, &[String]); 3] {
        [
            ("owner paths", self.owner_paths.as_slice()),
            ("team member paths", self.team_member_paths.as_slice()),
            ("bypass paths", self.bypass.as_slice()),
        ]
    }

    fn validate(&self) -> Result<(), RouteTableError> {
        let sets = self.sets();

        for (_, prefixes) in &sets {
            for prefix in prefixes.iter() {
                if !prefix.starts_with('/') {
                    return Err(RouteTableError::NotAbsolute(prefix.clone()));
                }
            }
        }
        for page in [&self.auth_page, &self.team_auth_page] {
            if !page.starts_with('/') {
                return Err(RouteTableError::NotAbsolute(page.clone()));
            }
        }

        for (i, &(set, prefixes)) in sets.iter().enumerate() {
            for &(other_set, others) in sets.iter().skip(i + 1) {
                for prefix in prefixes.iter() {
                    for other in others.iter() {
                        if prefix_matches(prefix, other) || prefix_matches(other, prefix) {
                            return Err(RouteTableError::Overlap {
                                prefix: prefix.clone(),
                                set,
                                other: other.clone(),
                                other_set,
                            });
                        }
                    }
                }
            }
        }

        if self.auth_page == self.team_auth_page {
            return Err(RouteTableError::AuthPagesEqual(self.auth_page.clone()));
        }
        for page in [&self.auth_page, &self.team_auth_page] {
            for &(set, prefixes) in &sets {
                if let Some(prefix) = prefixes.iter().find(|p| prefix_matches(p.as_str(), page)) {
                    return Err(RouteTableError::AuthPageCovered {
                        page: page.clone(),
                        set,
                        prefix: prefix.clone(),
                    });
                }
            }
        }

        // Each destination must land where the policy lets its audience stay,
        // otherwise redirects could chain forever.
        for target in RedirectTarget::ALL {
            let url = self.url(target);
            let (ok, expected) = match target {
                RedirectTarget::OwnerLogin => (normalize(url) == self.auth_page, "equal the auth page"),
                RedirectTarget::TeamLogin => {
                    (normalize(url) == self.team_auth_page, "equal the team auth page")
                }
                RedirectTarget::OwnerHome => {
                    (self.classify(url) == RouteClass::OwnerArea, "lie in the owner area")
                }
                RedirectTarget::TeamHome => {
                    (self.classify(url) == RouteClass::TeamMemberArea, "lie in the team member area")
                }
            };
            if !ok {
                return Err(RouteTableError::InconsistentDestination {
                    target,
                    url: url.to_string(),
                    expected,
                });
            }
        }

        Ok(())
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            owner_paths: to_strings(&["/dashboard", "/clients", "/team", "/payments", "/settings"]),
            team_member_paths: to_strings(&["/team-dashboard", "/projects", "/tasks"]),
            bypass: to_strings(&[
                "/api",
                "/auth/callback",
                "/health",
                "/_next",
                "/static",
                "/favicon.ico",
            ]),
            auth_page: "/login".to_string(),
            team_auth_page: "/team-login".to_string(),
            destinations: Destinations {
                owner_login: "/login".to_string(),
                team_login: "/team-login".to_string(),
                owner_home: "/dashboard".to_string(),
                team_home: "/team-dashboard".to_string(),
            },
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Drop a trailing slash (except on the root) and any query string.
fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

fn any_prefix(prefixes: &[String], path: &str) -> bool {
    prefixes.iter().any(|prefix| prefix_matches(prefix, path))
}

/// Segment-aware prefix match: `/team` matches `/team` and `/team/x`, never `/team-dashboard`.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        let defaults = RouteTable::default();
        RouteTable::new(
            defaults.owner_paths.clone(),
            defaults.team_member_paths.clone(),
            defaults.bypass.clone(),
            "/login",
            "/team-login",
            defaults.destinations.clone(),
        )
        .unwrap()
    }

    #[test]
    fn default_table_is_valid() {
        assert!(RouteTable::default().validate().is_ok());
    }

    #[test]
    fn classifies_default_routes() {
        let t = table();
        assert_eq!(t.classify("/dashboard"), RouteClass::OwnerArea);
        assert_eq!(t.classify("/clients/42/edit"), RouteClass::OwnerArea);
        assert_eq!(t.classify("/team"), RouteClass::OwnerArea);
        assert_eq!(t.classify("/team-dashboard"), RouteClass::TeamMemberArea);
        assert_eq!(t.classify("/projects"), RouteClass::TeamMemberArea);
        assert_eq!(t.classify("/tasks/7"), RouteClass::TeamMemberArea);
        assert_eq!(t.classify("/login"), RouteClass::AuthPage);
        assert_eq!(t.classify("/login/"), RouteClass::AuthPage);
        assert_eq!(t.classify("/team-login"), RouteClass::TeamAuthPage);
        assert_eq!(t.classify("/api/whatever"), RouteClass::Bypass);
        assert_eq!(t.classify("/favicon.ico"), RouteClass::Bypass);
        assert_eq!(t.classify("/"), RouteClass::Other);
        assert_eq!(t.classify("/about"), RouteClass::Other);
    }

    #[test]
    fn prefix_matching_respects_segments() {
        assert!(prefix_matches("/team", "/team"));
        assert!(prefix_matches("/team", "/team/members"));
        assert!(!prefix_matches("/team", "/team-dashboard"));
        assert!(!prefix_matches("/projects", "/projectsx"));
    }

    #[test]
    fn ignores_query_strings() {
        assert_eq!(table().classify("/dashboard?tab=clients"), RouteClass::OwnerArea);
        assert_eq!(table().classify("/login?next=/tasks"), RouteClass::AuthPage);
    }

    #[test]
    fn rejects_overlapping_sets() {
        let d = RouteTable::default().destinations;
        let err = RouteTable::new(
            to_strings(&["/dashboard", "/projects"]),
            to_strings(&["/team-dashboard", "/projects/mine"]),
            to_strings(&["/api"]),
            "/login",
            "/team-login",
            d,
        )
        .unwrap_err();
        assert!(matches!(err, RouteTableError::Overlap { .. }));
    }

    #[test]
    fn rejects_auth_page_inside_prefix_set() {
        let d = Destinations {
            owner_login: "/dashboard/login".to_string(),
            ..RouteTable::default().destinations
        };
        let err = RouteTable::new(
            to_strings(&["/dashboard"]),
            to_strings(&["/team-dashboard"]),
            vec![],
            "/dashboard/login",
            "/team-login",
            d,
        )
        .unwrap_err();
        assert!(matches!(err, RouteTableError::AuthPageCovered { .. }));
    }

    #[test]
    fn rejects_equal_auth_pages() {
        let d = Destinations {
            team_login: "/login".to_string(),
            ..RouteTable::default().destinations
        };
        let err = RouteTable::new(
            to_strings(&["/dashboard"]),
            to_strings(&["/team-dashboard"]),
            vec![],
            "/login",
            "/login",
            d,
        )
        .unwrap_err();
        assert_eq!(err, RouteTableError::AuthPagesEqual("/login".to_string()));
    }

    #[test]
    fn rejects_home_outside_its_area() {
        let d = Destinations {
            team_home: "/welcome".to_string(),
            ..RouteTable::default().destinations
        };
        let err = RouteTable::new(
            to_strings(&["/dashboard"]),
            to_strings(&["/team-dashboard"]),
            vec![],
            "/login",
            "/team-login",
            d,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RouteTableError::InconsistentDestination { target: RedirectTarget::TeamHome, .. }
        ));
    }

    #[test]
    fn rejects_relative_prefixes() {
        let err = RouteTable::new(
            to_strings(&["dashboard"]),
            vec![],
            vec![],
            "/login",
            "/team-login",
            RouteTable::default().destinations,
        )
        .unwrap_err();
        assert_eq!(err, RouteTableError::NotAbsolute("dashboard".to_string()));
    }
}
