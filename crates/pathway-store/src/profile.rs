//! User profile provider

/// Supplies the signed-in user's display name
pub trait ProfileProvider: Send + Sync {
    /// Name shown in the board header, if known
    fn display_name(&self) -> Option<String>;
}

/// Fixed profile, for local runs and tests
#[derive(Debug, Clone, Default)]
pub struct StaticProfile {
    name: Option<String>,
}

impl StaticProfile {
    /// Profile with a display name
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Profile with no display name
    #[inline]
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl ProfileProvider for StaticProfile {
    fn display_name(&self) -> Option<String> {
        self.name.clone().filter(|n| !n.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_absent() {
        assert_eq!(StaticProfile::named("  ").display_name(), None);
        assert_eq!(StaticProfile::anonymous().display_name(), None);
        assert_eq!(
            StaticProfile::named("Avery").display_name().as_deref(),
            Some("Avery")
        );
    }
}
