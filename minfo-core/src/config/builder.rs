// ============================================================================
// minfo-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for AnalyzeConfig
//
// This module implements the builder pattern for the AnalyzeConfig structure,
// providing a fluent API for the CLI and library callers. Values are not
// checked here; `AnalyzeConfig::validate` runs before anything reaches the
// engine.

// ---- Internal crate imports ----
use super::{AnalyzeConfig, EngineOption};

/// Builder for creating AnalyzeConfig instances.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeConfigBuilder {
    config: AnalyzeConfig,
}

impl AnalyzeConfigBuilder {
    /// Creates a new builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the report format (`Inform` option), e.g. "MIXML", "JSON", "Text".
    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.config.output_format = format.into();
        self
    }

    /// Requests complete reports.
    pub fn complete(mut self, complete: bool) -> Self {
        self.config.complete = complete;
        self
    }

    /// Sets the report language.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = Some(language.into());
        self
    }

    /// Appends one engine option.
    pub fn option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.extra_options.push(EngineOption::new(name, value));
        self
    }

    /// Appends several already parsed options.
    pub fn options(mut self, options: impl IntoIterator<Item = EngineOption>) -> Self {
        self.config.extra_options.extend(options);
        self
    }

    /// Turns open failures into errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Sets how many bytes are fed to the engine per call when streaming.
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.config.read_chunk_size = size;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> AnalyzeConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_every_field() {
        let config = AnalyzeConfigBuilder::new()
            .output_format("Text")
            .complete(true)
            .language("raw")
            .option("ParseSpeed", "1")
            .options(vec![EngineOption::new("ReadByHuman", "0")])
            .strict(true)
            .read_chunk_size(4096)
            .build();

        assert_eq!(config.output_format, "Text");
        assert!(config.complete);
        assert_eq!(config.language.as_deref(), Some("raw"));
        assert_eq!(config.extra_options.len(), 2);
        assert!(config.strict);
        assert_eq!(config.read_chunk_size, 4096);

        let names: Vec<_> = config.engine_options().into_iter().map(|o| o.name).collect();
        assert_eq!(
            names,
            ["Inform", "Complete", "Language", "ParseSpeed", "ReadByHuman"]
        );
    }
}
