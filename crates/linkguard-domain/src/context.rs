//! Request context: the project and site a caller is working in
//!
//! Store reads are evaluated against whatever project and site root the
//! context carries at call time. Validators that need to look at another
//! snapshot switch the context through a [`ContextGuard`], which restores
//! the previous values when it goes out of scope.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::{SystemTime, UNIX_EPOCH};

/// Snapshot of the resource tree a request reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Project {
    /// The working (draft) tree
    Offline,

    /// The published tree
    Online,
}

impl Project {
    /// Get the project name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Project::Offline => "offline",
            Project::Online => "online",
        }
    }

    /// Parse a project from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "offline" => Some(Project::Offline),
            "online" => Some(Project::Online),
            _ => None,
        }
    }

    /// Whether this is the published tree
    pub fn is_online(&self) -> bool {
        matches!(self, Project::Online)
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current timestamp in seconds since Unix epoch
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Ambient state of one request
///
/// The site root is stored without a trailing slash; the empty string is the
/// root site, in which site paths and root paths coincide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    project: Project,
    site_root: String,
    user: String,
    request_time: u64,
}

impl RequestContext {
    /// Site root of the root site
    pub const ROOT_SITE: &'static str = "";

    /// Create a context for `user` working in `project` under `site_root`
    pub fn new(user: impl Into<String>, project: Project, site_root: &str) -> Self {
        Self {
            project,
            site_root: normalize_site_root(site_root),
            user: user.into(),
            request_time: current_timestamp(),
        }
    }

    /// Replace the request time (seconds since Unix epoch)
    pub fn with_request_time(mut self, request_time: u64) -> Self {
        self.request_time = request_time;
        self
    }

    /// Current project
    pub fn project(&self) -> Project {
        self.project
    }

    /// Current site root
    pub fn site_root(&self) -> &str {
        &self.site_root
    }

    /// Acting user
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Time the request is evaluated at, used for release/expiration checks
    pub fn request_time(&self) -> u64 {
        self.request_time
    }

    /// Set the current project
    pub fn set_project(&mut self, project: Project) {
        self.project = project;
    }

    /// Set the current site root
    pub fn set_site_root(&mut self, site_root: &str) {
        self.site_root = normalize_site_root(site_root);
    }

    /// Turn a site path into a root path
    ///
    /// # Examples
    ///
    /// ```
    /// use linkguard_domain::{Project, RequestContext};
    ///
    /// let ctx = RequestContext::new("editor", Project::Offline, "/sites/default/");
    /// assert_eq!(ctx.add_site_root("/index.html"), "/sites/default/index.html");
    /// ```
    pub fn add_site_root(&self, path: &str) -> String {
        join_root(&self.site_root, path)
    }

    /// Turn a root path into a site path if it lies inside the current site
    ///
    /// Root paths outside the current site are returned unchanged.
    pub fn remove_site_root(&self, root_path: &str) -> String {
        if self.site_root.is_empty() {
            return root_path.to_string();
        }
        match root_path.strip_prefix(self.site_root.as_str()) {
            Some("") => "/".to_string(),
            Some(rest) if rest.starts_with('/') => rest.to_string(),
            _ => root_path.to_string(),
        }
    }

    /// Switch to another project until the guard is dropped
    pub fn switch_project(&mut self, project: Project) -> ContextGuard<'_> {
        let mut guard = ContextGuard::capture(self);
        guard.ctx.project = project;
        guard
    }

    /// Switch to another site root until the guard is dropped
    pub fn switch_site_root(&mut self, site_root: &str) -> ContextGuard<'_> {
        let mut guard = ContextGuard::capture(self);
        guard.ctx.site_root = normalize_site_root(site_root);
        guard
    }
}

fn normalize_site_root(site_root: &str) -> String {
    site_root.trim_end_matches('/').to_string()
}

/// Join a site root and a site path into a root path
pub(crate) fn join_root(site_root: &str, path: &str) -> String {
    let mut joined = String::with_capacity(site_root.len() + path.len() + 1);
    joined.push_str(site_root);
    if !path.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(path);
    joined
}

/// Scope guard over a temporarily switched [`RequestContext`]
///
/// Dereferences to the switched context. Dropping the guard restores the
/// project and site root that were active when it was created, on every exit
/// path including early returns and unwinding.
pub struct ContextGuard<'a> {
    ctx: &'a mut RequestContext,
    saved_project: Project,
    saved_site_root: String,
}

impl<'a> ContextGuard<'a> {
    fn capture(ctx: &'a mut RequestContext) -> Self {
        let saved_project = ctx.project;
        let saved_site_root = ctx.site_root.clone();
        Self {
            ctx,
            saved_project,
            saved_site_root,
        }
    }
}

impl Deref for ContextGuard<'_> {
    type Target = RequestContext;

    fn deref(&self) -> &RequestContext {
        &*self.ctx
    }
}

impl DerefMut for ContextGuard<'_> {
    fn deref_mut(&mut self) -> &mut RequestContext {
        &mut *self.ctx
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        tracing::trace!(
            "Restoring context to project {} and site root '{}'",
            self.saved_project,
            self.saved_site_root
        );
        self.ctx.project = self.saved_project;
        self.ctx.site_root = std::mem::take(&mut self.saved_site_root);
    }
}
