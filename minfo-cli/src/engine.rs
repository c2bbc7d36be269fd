// ============================================================================
// minfo-cli/src/engine.rs
// ============================================================================
//
// ENGINE SELECTION: Which Engine implementation the commands run on
//
// The native library is loaded lazily, on the first command that needs it,
// so `minfo --help` works on machines without libmediainfo.

use anyhow::Context;
use minfo_core::Engine;
use minfo_core::engine::{MediaInfoLib, MockEngine};

use crate::cli::EngineKind;
use crate::error::CliResult;

/// The engine a command runs on.
#[derive(Debug)]
pub enum SelectedEngine {
    Native(&'static MediaInfoLib),
    Mock(MockEngine),
}

impl SelectedEngine {
    /// Loads (or creates) the engine for `kind`. `library` overrides the
    /// native library search; it is ignored by the mock.
    pub fn select(kind: EngineKind, library: Option<&str>) -> CliResult<Self> {
        match kind {
            EngineKind::Mock => {
                log::debug!("Using the mock engine");
                Ok(Self::Mock(MockEngine::new()))
            }
            EngineKind::Native => {
                let lib = match library {
                    Some(path) => MediaInfoLib::shared_from(path),
                    None => MediaInfoLib::shared(),
                }
                .context("MediaInfo library is not available")?;
                log::debug!("Using MediaInfo library '{}'", lib.name());
                Ok(Self::Native(lib))
            }
        }
    }

    pub fn as_engine(&self) -> &dyn Engine {
        match self {
            Self::Native(lib) => *lib,
            Self::Mock(mock) => mock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_selection_ignores_library() {
        let selected = SelectedEngine::select(EngineKind::Mock, Some("/nowhere/lib.so")).unwrap();
        assert!(matches!(selected, SelectedEngine::Mock(_)));
        assert!(minfo_core::Session::create(selected.as_engine()).is_ok());
    }
}
