//! Core types for spark-activator.
//!
//! Flag sets shared by nodes, components and the activator walk.

// =============================================================================
// Object Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Transient lifecycle flags carried by nodes and components.
    ///
    /// Nodes only ever use `DEACTIVATING`. Components use the load and enable
    /// markers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ObjFlags: u8 {
        const NONE = 0;
        /// Component load has begun (pre-load/on-load queued or called).
        const ON_LOAD_STARTED = 1 << 0;
        /// Component on-load has been issued. Gates on-destroy.
        const ON_LOAD_CALLED = 1 << 1;
        /// Component on-enable fired and has not been matched by on-disable.
        const ON_ENABLE_CALLED = 1 << 2;
        /// Node is inside its own deactivation walk.
        const DEACTIVATING = 1 << 3;
    }
}

// =============================================================================
// Hook Capabilities (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Optional lifecycle hooks a behavior exposes.
    ///
    /// The activator checks presence through this set instead of calling
    /// every hook unconditionally.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Hooks: u8 {
        const NONE = 0;
        const PRELOAD = 1 << 0;
        const ON_LOAD = 1 << 1;
        const ON_ENABLE = 1 << 2;
        const ON_DISABLE = 1 << 3;
        const ON_DESTROY = 1 << 4;
        const RESET_IN_EDITOR = 1 << 5;
        const ON_FOCUS_IN_EDITOR = 1 << 6;
        const ON_LOST_FOCUS_IN_EDITOR = 1 << 7;
    }
}

// =============================================================================
// Lifecycle Hooks
// =============================================================================

/// A single lifecycle callback the activator can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    Preload,
    OnLoad,
    OnEnable,
    OnDisable,
    OnDestroy,
    ResetInEditor,
    OnFocusInEditor,
    OnLostFocusInEditor,
}

impl LifecycleHook {
    /// Capability bit a behavior must expose for this hook to run.
    pub fn capability(self) -> Hooks {
        match self {
            LifecycleHook::Preload => Hooks::PRELOAD,
            LifecycleHook::OnLoad => Hooks::ON_LOAD,
            LifecycleHook::OnEnable => Hooks::ON_ENABLE,
            LifecycleHook::OnDisable => Hooks::ON_DISABLE,
            LifecycleHook::OnDestroy => Hooks::ON_DESTROY,
            LifecycleHook::ResetInEditor => Hooks::RESET_IN_EDITOR,
            LifecycleHook::OnFocusInEditor => Hooks::ON_FOCUS_IN_EDITOR,
            LifecycleHook::OnLostFocusInEditor => Hooks::ON_LOST_FOCUS_IN_EDITOR,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LifecycleHook::Preload => "preload",
            LifecycleHook::OnLoad => "on_load",
            LifecycleHook::OnEnable => "on_enable",
            LifecycleHook::OnDisable => "on_disable",
            LifecycleHook::OnDestroy => "on_destroy",
            LifecycleHook::ResetInEditor => "reset_in_editor",
            LifecycleHook::OnFocusInEditor => "on_focus_in_editor",
            LifecycleHook::OnLostFocusInEditor => "on_lost_focus_in_editor",
        }
    }
}
