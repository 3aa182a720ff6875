use std::fmt;
use std::sync::Arc;

/// Routing collaborator consulted by the anchor rewrite.
pub trait Router: Send + Sync {
    fn is_same_site(&self, url: &str) -> bool;
    fn navigate(&self, url: &str);
}

/// Treats every url as same-site, so anchors are never rewritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRouter;

impl Router for NullRouter {
    fn is_same_site(&self, _url: &str) -> bool {
        true
    }

    fn navigate(&self, _url: &str) {}
}

pub type NavigateFn = Arc<dyn Fn(&str) + Send + Sync>;

/// A url is same-site when it starts with the configured host.
#[derive(Clone)]
pub struct HostRouter {
    host: String,
    navigate: NavigateFn,
}

impl HostRouter {
    pub fn new(host: impl Into<String>, navigate: impl Fn(&str) + Send + Sync + 'static) -> Self {
        HostRouter {
            host: host.into(),
            navigate: Arc::new(navigate),
        }
    }

    pub fn with_navigate(host: impl Into<String>, navigate: NavigateFn) -> Self {
        HostRouter {
            host: host.into(),
            navigate,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Debug for HostRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRouter").field("host", &self.host).finish()
    }
}

impl Router for HostRouter {
    fn is_same_site(&self, url: &str) -> bool {
        url.starts_with(&self.host)
    }

    fn navigate(&self, url: &str) {
        log::debug!("navigating to {}", url);
        (self.navigate)(url)
    }
}
