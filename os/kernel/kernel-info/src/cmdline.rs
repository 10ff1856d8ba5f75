//! # Boot Command Line
//!
//! Whitespace separated `key=value` (or bare `key`) tokens handed over by the
//! bootloader. Only early parameters are consumed here; everything else is
//! passed through untouched.

/// Name of the early parameter selecting the normal-memory cache policy.
pub const CACHE_POLICY_PARAM: &str = "cachepolicy";

/// A borrowed view of the kernel command line.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct BootParams<'a> {
    raw: &'a str,
}

/// One token of the command line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BootParam<'a> {
    pub key: &'a str,
    pub value: Option<&'a str>,
}

impl<'a> BootParams<'a> {
    #[must_use]
    pub const fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        self.raw
    }

    /// Iterates the tokens in command-line order.
    pub fn iter(&self) -> impl Iterator<Item = BootParam<'a>> + 'a {
        self.raw.split_ascii_whitespace().map(|token| {
            match token.split_once('=') {
                Some((key, value)) => BootParam {
                    key,
                    value: Some(value),
                },
                None => BootParam {
                    key: token,
                    value: None,
                },
            }
        })
    }

    /// The value of the last occurrence of `key`, if any.
    ///
    /// ```rust
    /// # use kernel_info::cmdline::BootParams;
    /// let params = BootParams::new("console=ttyAMA0 cachepolicy=writethrough");
    /// assert_eq!(params.early_param("cachepolicy"), Some("writethrough"));
    /// assert_eq!(params.early_param("quiet"), None);
    /// ```
    #[must_use]
    pub fn early_param(&self, key: &str) -> Option<&'a str> {
        self.iter()
            .filter(|p| p.key == key)
            .filter_map(|p| p.value)
            .last()
    }

    /// Whether a bare flag (or a key with any value) is present.
    #[must_use]
    pub fn has_flag(&self, key: &str) -> bool {
        self.iter().any(|p| p.key == key)
    }

    #[must_use]
    pub fn cache_policy(&self) -> Option<&'a str> {
        self.early_param(CACHE_POLICY_PARAM)
    }
}
