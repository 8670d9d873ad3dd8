//! Component Scheduler - The enable/disable seam.
//!
//! The activator never calls on-enable or on-disable itself. It hands the
//! component to the scheduler, which owns the steady-state enabled
//! bookkeeping and may batch on-enable into the task's invoker.

use std::cell::RefCell;

use crate::engine::{ComponentId, Scene};
use crate::error::Result;
use crate::types::{Hooks, LifecycleHook, ObjFlags};

use super::invoker::InvokerRef;
use super::node_activator::call_hook;

pub trait ComponentScheduler {
    /// Enable a component, batching on-enable into `invoker` when given.
    fn enable_comp(
        &self,
        scene: &mut Scene,
        comp: ComponentId,
        invoker: Option<InvokerRef>,
    ) -> Result<()>;

    /// Disable a component. Fires on-disable only if it is currently
    /// enabled; idempotent otherwise.
    fn disable_comp(&self, scene: &mut Scene, comp: ComponentId) -> Result<()>;

    /// Dispatch step of the on-enable invoker.
    fn invoke_on_enable(&self, scene: &mut Scene, comp: ComponentId) -> Result<()>;
}

// =============================================================================
// Default Scheduler
// =============================================================================

/// Tracks enabled components with `ON_ENABLE_CALLED` and keeps them in
/// enable order.
#[derive(Default)]
pub struct DefaultScheduler {
    enabled: RefCell<Vec<ComponentId>>,
}

impl DefaultScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Components whose on-enable has fired and not yet been disabled.
    pub fn enabled_components(&self) -> Vec<ComponentId> {
        self.enabled.borrow().clone()
    }

    fn on_enabled(&self, scene: &mut Scene, comp: ComponentId) {
        scene.set_component_flag(comp, ObjFlags::ON_ENABLE_CALLED, true);
        self.enabled.borrow_mut().push(comp);
    }

    fn on_disabled(&self, scene: &mut Scene, comp: ComponentId) {
        scene.set_component_flag(comp, ObjFlags::ON_ENABLE_CALLED, false);
        self.enabled.borrow_mut().retain(|&c| c != comp);
    }
}

fn still_active(scene: &Scene, comp: ComponentId) -> bool {
    scene
        .node_of(comp)
        .is_some_and(|node| scene.is_active_in_hierarchy(node))
}

impl ComponentScheduler for DefaultScheduler {
    fn enable_comp(
        &self,
        scene: &mut Scene,
        comp: ComponentId,
        invoker: Option<InvokerRef>,
    ) -> Result<()> {
        if scene.component_flags(comp).contains(ObjFlags::ON_ENABLE_CALLED) {
            return Ok(());
        }

        let hooks = scene.component(comp).map(|c| c.hooks()).unwrap_or_default();
        if hooks.contains(Hooks::ON_ENABLE) {
            if let Some(invoker) = invoker {
                invoker.add(scene, comp);
                return Ok(());
            }
            call_hook(scene, comp, LifecycleHook::OnEnable)?;
            if !still_active(scene, comp) {
                return Ok(());
            }
        }
        self.on_enabled(scene, comp);
        Ok(())
    }

    fn disable_comp(&self, scene: &mut Scene, comp: ComponentId) -> Result<()> {
        if !scene.component_flags(comp).contains(ObjFlags::ON_ENABLE_CALLED) {
            return Ok(());
        }

        // Cleared first so a reentrant disable is a no-op
        self.on_disabled(scene, comp);
        call_hook(scene, comp, LifecycleHook::OnDisable)
    }

    fn invoke_on_enable(&self, scene: &mut Scene, comp: ComponentId) -> Result<()> {
        let flags = scene.component_flags(comp);
        if !scene.is_enabled(comp) || flags.contains(ObjFlags::ON_ENABLE_CALLED) {
            return Ok(());
        }

        call_hook(scene, comp, LifecycleHook::OnEnable)?;
        let flags = scene.component_flags(comp);
        if still_active(scene, comp) && !flags.contains(ObjFlags::ON_ENABLE_CALLED) {
            self.on_enabled(scene, comp);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::ActivatorConfig;
    use crate::engine::Behavior;
    use crate::error::HookResult;

    struct Toggle {
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Behavior for Toggle {
        fn hooks(&self) -> Hooks {
            Hooks::ON_ENABLE | Hooks::ON_DISABLE
        }

        fn on_enable(&self, _scene: &mut Scene, _comp: ComponentId) -> HookResult {
            self.log.borrow_mut().push("enable");
            Ok(())
        }

        fn on_disable(&self, _scene: &mut Scene, _comp: ComponentId) -> HookResult {
            self.log.borrow_mut().push("disable");
            Ok(())
        }
    }

    fn setup() -> (Scene, Rc<DefaultScheduler>, ComponentId, Rc<RefCell<Vec<&'static str>>>) {
        let scheduler = Rc::new(DefaultScheduler::new());
        let mut scene = Scene::with_scheduler(ActivatorConfig::default(), scheduler.clone());
        let log = Rc::new(RefCell::new(Vec::new()));

        let root = scene.add_node(None, "root", true).unwrap();
        let comp = scene
            .add_component(root, Rc::new(Toggle { log: log.clone() }))
            .unwrap();
        (scene, scheduler, comp, log)
    }

    #[test]
    fn test_enable_then_disable() {
        let (mut scene, scheduler, comp, log) = setup();
        let root = scene.node_of(comp).unwrap();
        scene.activate_node(root, true).unwrap();

        assert_eq!(*log.borrow(), vec!["enable"]);
        assert_eq!(scheduler.enabled_components(), vec![comp]);
        assert!(scene.component_flags(comp).contains(ObjFlags::ON_ENABLE_CALLED));

        scene.set_enabled(comp, false).unwrap();
        assert_eq!(*log.borrow(), vec!["enable", "disable"]);
        assert!(scheduler.enabled_components().is_empty());
    }

    #[test]
    fn test_disable_is_idempotent() {
        let (mut scene, scheduler, comp, log) = setup();
        let root = scene.node_of(comp).unwrap();
        scene.activate_node(root, true).unwrap();

        scheduler.disable_comp(&mut scene, comp).unwrap();
        scheduler.disable_comp(&mut scene, comp).unwrap();
        assert_eq!(*log.borrow(), vec!["enable", "disable"]);
    }

    #[test]
    fn test_enable_is_idempotent() {
        let (mut scene, scheduler, comp, log) = setup();
        let root = scene.node_of(comp).unwrap();
        scene.activate_node(root, true).unwrap();

        scheduler.enable_comp(&mut scene, comp, None).unwrap();
        assert_eq!(*log.borrow(), vec!["enable"]);
        assert_eq!(scheduler.enabled_components(), vec![comp]);
    }

    #[test]
    fn test_disabled_component_not_dispatched() {
        let (mut scene, scheduler, comp, log) = setup();
        scene.set_enabled(comp, false).unwrap();

        scheduler.invoke_on_enable(&mut scene, comp).unwrap();
        assert!(log.borrow().is_empty());
    }
}
