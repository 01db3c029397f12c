//! Worker configuration.

use std::str::FromStr;

use prisma_core::PipelineConfig;

/// Default worker thread name.
const DEFAULT_NAME: &str = "prisma-worker";

/// Runtime configuration for a processing worker.
///
/// `Default` reads overrides from the environment:
/// `PRISMA_WORKER_NAME`, `PRISMA_SHARPEN_RADIUS`, `PRISMA_SHARPEN_THRESHOLD`.
/// Unparsable values are ignored with a warning.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// OS thread name, also used in log lines.
    pub name: String,
    /// Defaults for settings a request leaves out.
    pub pipeline: PipelineConfig,
}

impl WorkerConfig {
    /// Configuration with built-in defaults, ignoring the environment.
    pub fn builtin() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            pipeline: PipelineConfig::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let builtin = Self::builtin();
        Self {
            name: std::env::var("PRISMA_WORKER_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(builtin.name),
            pipeline: PipelineConfig {
                sharpen_radius: env_or("PRISMA_SHARPEN_RADIUS", builtin.pipeline.sharpen_radius),
                sharpen_threshold: env_or(
                    "PRISMA_SHARPEN_THRESHOLD",
                    builtin.pipeline.sharpen_threshold,
                ),
            },
        }
    }
}

fn env_or<T: FromStr + Copy>(key: &str, fallback: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("ignoring {key}={raw:?}: not a valid value");
            fallback
        }),
        Err(_) => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let config = WorkerConfig::builtin();
        assert_eq!(config.name, "prisma-worker");
        assert_eq!(config.pipeline.sharpen_radius, 1);
        assert_eq!(config.pipeline.sharpen_threshold, 3);
    }

    #[test]
    fn test_env_or_falls_back_when_unset() {
        assert_eq!(env_or("PRISMA_TEST_SURELY_UNSET_VAR", 7u32), 7);
    }

    #[test]
    fn test_builders() {
        let pipeline = PipelineConfig {
            sharpen_radius: 4,
            sharpen_threshold: 0,
        };
        let config = WorkerConfig::builtin()
            .with_name("grader")
            .with_pipeline(pipeline);
        assert_eq!(config.name, "grader");
        assert_eq!(config.pipeline.sharpen_radius, 4);
    }
}
