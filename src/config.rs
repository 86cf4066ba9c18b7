//! Converter configuration
//!
//! Names of the reserved attributes and whether export emits behavior glue.

/// Default attribute carrying a node's JSON behavior list.
pub const DEFAULT_BEHAVIOR_ATTR: &str = "data-behaviors";

/// Default marker attribute on the generated glue script.
pub const DEFAULT_GLUE_ATTR: &str = "data-behavior-glue";

/// Default name of the host object the glue calls into.
pub const DEFAULT_GLUE_HOST: &str = "cardHost";

/// Configuration shared by import and export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterConfig {
    /// Whether export appends the behavior glue script.
    pub emit_glue: bool,
    /// Attribute name for the behavior list (default: "data-behaviors").
    pub behavior_attr: String,
    /// Marker attribute of the glue script (default: "data-behavior-glue").
    ///
    /// Elements carrying it are derived output and are dropped on import.
    pub glue_attr: String,
    /// Host object name used by the glue (default: "cardHost").
    pub glue_host: String,
}

impl ConverterConfig {
    /// The persisted template form: behaviors plus their glue.
    pub const TEMPLATE: Self = Self {
        emit_glue: true,
        behavior_attr: String::new(), // Will use DEFAULT_BEHAVIOR_ATTR
        glue_attr: String::new(),
        glue_host: String::new(),
    };

    /// The tree form for live preview: behaviors only, no glue.
    pub const TREE: Self = Self {
        emit_glue: false,
        behavior_attr: String::new(),
        glue_attr: String::new(),
        glue_host: String::new(),
    };

    pub fn new(emit_glue: bool) -> Self {
        Self {
            emit_glue,
            behavior_attr: DEFAULT_BEHAVIOR_ATTR.to_string(),
            glue_attr: DEFAULT_GLUE_ATTR.to_string(),
            glue_host: DEFAULT_GLUE_HOST.to_string(),
        }
    }

    /// Use a custom behavior attribute, e.g. to avoid clashing with a host's own `data-*`.
    pub fn with_behavior_attr(mut self, name: impl Into<String>) -> Self {
        self.behavior_attr = name.into().to_ascii_lowercase();
        self
    }

    pub fn with_glue_attr(mut self, name: impl Into<String>) -> Self {
        self.glue_attr = name.into().to_ascii_lowercase();
        self
    }

    pub fn with_glue_host(mut self, host: impl Into<String>) -> Self {
        self.glue_host = host.into();
        self
    }

    pub fn behavior_attr(&self) -> &str {
        if self.behavior_attr.is_empty() {
            DEFAULT_BEHAVIOR_ATTR
        } else {
            &self.behavior_attr
        }
    }

    pub fn glue_attr(&self) -> &str {
        if self.glue_attr.is_empty() {
            DEFAULT_GLUE_ATTR
        } else {
            &self.glue_attr
        }
    }

    /// Names that never belong in a node's plain attributes.
    ///
    /// `class` and `id` have dedicated fields; the behavior and glue
    /// attributes are written by export itself.
    pub fn is_reserved_attr(&self, name: &str) -> bool {
        ["class", "id", self.behavior_attr(), self.glue_attr()]
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(name))
    }

    pub fn glue_host(&self) -> &str {
        if self.glue_host.is_empty() {
            DEFAULT_GLUE_HOST
        } else {
            &self.glue_host
        }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self::new(true)
    }
}
