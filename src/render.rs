//! The renderer boundary.
//!
//! The core never interprets renderable or light contents; it only tells the
//! host engine when instances enter or leave the visible set as nodes
//! activate and deactivate. The binding is an explicitly constructed,
//! passed-down object owned by the scene — there is no global resource
//! manager.

/// Opaque handle to a renderable instance minted by the host renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderableInstance(pub u64);

/// Opaque handle to a light instance minted by the host renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightInstance(pub u64);

/// Consumed interface to the native rendering engine.
pub trait RenderBinding {
    /// Called when a node with a renderable becomes active.
    fn attach_instance(&mut self, instance: RenderableInstance);

    /// Called when a node with a renderable stops being active.
    fn detach_instance(&mut self, instance: RenderableInstance);

    /// Called when a node with a light becomes active.
    fn attach_light(&mut self, light: LightInstance);

    /// Called when a node with a light stops being active.
    fn detach_light(&mut self, light: LightInstance);
}

/// A binding that discards everything; used for headless scenes and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBinding;

impl RenderBinding for NullBinding {
    fn attach_instance(&mut self, _instance: RenderableInstance) {}
    fn detach_instance(&mut self, _instance: RenderableInstance) {}
    fn attach_light(&mut self, _light: LightInstance) {}
    fn detach_light(&mut self, _light: LightInstance) {}
}
