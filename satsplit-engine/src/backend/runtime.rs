//! Process-wide native runtime environment
//!
//! Native inference libraries are loaded once per process and never unloaded.
//! The first backend that needs the runtime brings it up; the outcome
//! (including failure) is cached for every later caller.

use super::{ScorerFactory, Session};
use crate::error::{EngineError, Result};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Environment variable naming the shared runtime library
pub const LIBRARY_ENV_VAR: &str = "SATSPLIT_RUNTIME_LIBRARY";

static ENVIRONMENT: OnceLock<std::result::Result<RuntimeEnvironment, String>> = OnceLock::new();

/// Handle to the initialized native runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnvironment {
    library_path: Option<PathBuf>,
}

impl RuntimeEnvironment {
    /// Bring up a runtime from an explicit library path
    ///
    /// With no path the platform default library is used. A given path must
    /// exist.
    pub fn initialize(library_path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = &library_path {
            if !path.exists() {
                return Err(EngineError::Runtime(format!(
                    "runtime library not found: {}",
                    path.display()
                )));
            }
            log::info!("using runtime library {}", path.display());
        } else {
            log::debug!("{LIBRARY_ENV_VAR} not set, using the default runtime library");
        }
        Ok(Self { library_path })
    }

    /// The shared process-wide environment, initialized on first use
    pub fn global() -> Result<&'static RuntimeEnvironment> {
        ENVIRONMENT
            .get_or_init(|| {
                let path = std::env::var_os(LIBRARY_ENV_VAR).map(PathBuf::from);
                Self::initialize(path).map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|message| EngineError::Runtime(message.clone()))
    }

    /// Library the runtime was loaded from, if one was configured
    pub fn library_path(&self) -> Option<&Path> {
        self.library_path.as_deref()
    }
}

/// Factory for backends that need the native runtime
///
/// The runtime is brought up before the first session is built.
pub struct RuntimeScorerFactory<F> {
    build: F,
}

impl<F> RuntimeScorerFactory<F>
where
    F: Fn(&'static RuntimeEnvironment) -> Result<Session> + Send + Sync,
{
    /// Wrap a session constructor
    pub fn new(build: F) -> Self {
        Self { build }
    }
}

impl<F> ScorerFactory for RuntimeScorerFactory<F>
where
    F: Fn(&'static RuntimeEnvironment) -> Result<Session> + Send + Sync,
{
    fn create(&self) -> Result<Session> {
        let env = RuntimeEnvironment::global()?;
        (self.build)(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{backend::Scorer, cancel::CancelToken};

    #[test]
    fn test_missing_library_is_an_error() {
        let err = RuntimeEnvironment::initialize(Some(PathBuf::from(
            "/nonexistent/libruntime.so",
        )))
        .unwrap_err();
        assert!(matches!(err, EngineError::Runtime(_)));
    }

    #[test]
    fn test_existing_library_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let env = RuntimeEnvironment::initialize(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(env.library_path(), Some(file.path()));
    }

    struct Zero;

    impl Scorer for Zero {
        fn score(
            &mut self,
            ids: &[i64],
            _mask: &[i64],
            _cancel: &CancelToken,
        ) -> Result<Vec<f32>> {
            Ok(vec![0.0; ids.len()])
        }

        fn name(&self) -> &'static str {
            "zero"
        }
    }

    #[test]
    fn test_factory_shares_global_environment() {
        if std::env::var_os(LIBRARY_ENV_VAR).is_some() {
            return;
        }
        let factory = RuntimeScorerFactory::new(|env: &'static RuntimeEnvironment| {
            assert!(std::ptr::eq(env, RuntimeEnvironment::global()?));
            Ok(Box::new(Zero) as Session)
        });
        let first = factory.create().unwrap();
        let second = factory.create().unwrap();
        assert_eq!(first.name(), second.name());
    }

    #[test]
    fn test_default_library() {
        let env = RuntimeEnvironment::initialize(None).unwrap();
        assert_eq!(env.library_path(), None);
    }
}
