//! Sites: named subtrees of the resource tree

/// A site, rooted at a folder of the resource tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// Root folder, without trailing slash
    pub root: String,

    /// Display title
    pub title: String,
}

/// The configured sites
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Vec<Site>,
}

impl SiteRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a site
    pub fn add(&mut self, root: &str, title: impl Into<String>) {
        self.sites.push(Site {
            root: root.trim_end_matches('/').to_string(),
            title: title.into(),
        });
    }

    /// All sites
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// The site containing `root_path`
    ///
    /// When sites are nested the innermost one wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkguard_domain::SiteRegistry;
    ///
    /// let mut sites = SiteRegistry::new();
    /// sites.add("/sites/default", "Default");
    /// assert_eq!(sites.site_for_root_path("/sites/default/a.html").unwrap().title, "Default");
    /// assert!(sites.site_for_root_path("/system/a.html").is_none());
    /// ```
    pub fn site_for_root_path(&self, root_path: &str) -> Option<&Site> {
        self.sites
            .iter()
            .filter(|site| is_under(root_path, &site.root))
            .max_by_key(|site| site.root.len())
    }

    /// The site with exactly this root
    pub fn site_for_site_root(&self, site_root: &str) -> Option<&Site> {
        let site_root = site_root.trim_end_matches('/');
        self.sites.iter().find(|site| site.root == site_root)
    }
}

fn is_under(root_path: &str, site_root: &str) -> bool {
    match root_path.strip_prefix(site_root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
