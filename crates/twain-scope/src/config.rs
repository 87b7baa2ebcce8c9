use std::borrow::Cow;

/// Per-invocation scope settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeConfig {
    /// Name attached to log events and diagnostics of the scope.
    pub label: Cow<'static, str>,
    /// Record every step into the returned [`Traced`](crate::Traced).
    pub trace: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            label: Cow::Borrowed("scope"),
            trace: false,
        }
    }
}

impl ScopeConfig {
    pub fn labeled(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn traced(mut self) -> Self {
        self.trace = true;
        self
    }
}
