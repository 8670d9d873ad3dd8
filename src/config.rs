//! Activator configuration.
//!
//! Holds the execution mode, the task pool capacity and the hook fault
//! policy. Values come from code (`Default` plus setters) or from the
//! environment via [`ActivatorConfig::from_env`].

use std::env;

/// Default number of activation tasks kept for reuse.
pub const DEFAULT_TASK_POOL_CAPACITY: usize = 4;

/// Environment variable selecting the execution mode.
pub const MODE_ENV: &str = "SPARK_ACTIVATOR_MODE";

/// Environment variable overriding the task pool capacity.
pub const TASK_POOL_ENV: &str = "SPARK_ACTIVATOR_TASK_POOL";

// =============================================================================
// Execution Mode
// =============================================================================

/// Where the scene is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Normal game runtime.
    #[default]
    Runtime,
    /// Inside the editor. `playing` is true while previewing the game.
    Editor { playing: bool },
}

impl ExecutionMode {
    pub fn is_editor(self) -> bool {
        matches!(self, ExecutionMode::Editor { .. })
    }

    /// Runtime, or editor preview.
    pub fn is_playing(self) -> bool {
        match self {
            ExecutionMode::Runtime => true,
            ExecutionMode::Editor { playing } => playing,
        }
    }

    /// Parse `runtime`, `editor` or `editor-playing`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "runtime" => Some(ExecutionMode::Runtime),
            "editor" => Some(ExecutionMode::Editor { playing: false }),
            "editor-playing" => Some(ExecutionMode::Editor { playing: true }),
            _ => None,
        }
    }
}

// =============================================================================
// Fault Policy
// =============================================================================

/// What happens when a lifecycle hook returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Log the fault, record it as an incident, continue the walk.
    Contain,
    /// Abort the top-level activation call and return the fault.
    Propagate,
}

impl FaultPolicy {
    /// Editors contain faults; runtimes fail fast.
    pub fn for_mode(mode: ExecutionMode) -> Self {
        if mode.is_editor() {
            FaultPolicy::Contain
        } else {
            FaultPolicy::Propagate
        }
    }
}

// =============================================================================
// Config
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatorConfig {
    pub mode: ExecutionMode,
    /// Upper bound on pooled activation tasks. Extra tasks are dropped.
    pub task_pool_capacity: usize,
    pub fault_policy: FaultPolicy,
}

impl Default for ActivatorConfig {
    fn default() -> Self {
        Self::for_mode(ExecutionMode::Runtime)
    }
}

impl ActivatorConfig {
    /// Config with the fault policy that matches `mode`.
    pub fn for_mode(mode: ExecutionMode) -> Self {
        Self {
            mode,
            task_pool_capacity: DEFAULT_TASK_POOL_CAPACITY,
            fault_policy: FaultPolicy::for_mode(mode),
        }
    }

    /// Read [`MODE_ENV`] and [`TASK_POOL_ENV`], falling back to defaults.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mode = match env::var(MODE_ENV) {
            Ok(value) => ExecutionMode::parse(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "unknown {MODE_ENV}, using runtime");
                ExecutionMode::Runtime
            }),
            Err(_) => ExecutionMode::Runtime,
        };

        let mut config = Self::for_mode(mode);
        if let Ok(value) = env::var(TASK_POOL_ENV) {
            match value.trim().parse::<usize>() {
                Ok(capacity) => config.task_pool_capacity = capacity,
                Err(err) => {
                    tracing::warn!(
                        value = %value,
                        error = %err,
                        "invalid {TASK_POOL_ENV}, using default"
                    );
                }
            }
        }
        config
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_task_pool_capacity(mut self, capacity: usize) -> Self {
        self.task_pool_capacity = capacity;
        self
    }

    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }
}
