// ============================================================================
// PLUGIN HOST — command registry and dispatch
// ============================================================================
//
// Plugins register a metadata block plus an entry point, exactly mirroring
// the menu-command contract of the original host: identifier, blurb, help,
// author/license/date, menu path, an image-type filter, and (here always
// empty) parameter and return schemas. Dispatch is synchronous; the host
// blocks until the entry point returns.

use crate::canvas::{CanvasState, ColorMode};
use crate::processor::ImageProcessor;

/// One parameter (or return value) in a plugin's schema. Both normalizers
/// register empty schemas — the image and drawable are implicit — but the
/// registry carries the field so the contract is complete.
#[derive(Clone, Copy, Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: &'static str,
    pub description: &'static str,
}

/// Registration metadata for one menu command.
#[derive(Clone, Copy, Debug)]
pub struct PluginSpec {
    /// Unique identifier, e.g. `"blurry-texture-process"`.
    pub name: &'static str,
    pub blurb: &'static str,
    pub help: &'static str,
    pub author: &'static str,
    pub license: &'static str,
    pub date: &'static str,
    /// Menu path the host exposes the command under.
    pub menu_path: &'static str,
    /// Image-type filter, e.g. `"RGB*, GRAY*"`.
    pub image_types: &'static str,
    pub params: &'static [ParamSpec],
    pub returns: &'static [ParamSpec],
}

/// Entry-point signature: the host hands the plugin a canvas and a processor
/// and blocks until it returns.
pub type PluginEntry =
    fn(&mut CanvasState, &mut dyn ImageProcessor) -> Result<(), String>;

pub struct Plugin {
    pub spec: PluginSpec,
    pub entry: PluginEntry,
}

/// The host's procedure registry.
#[derive(Default)]
pub struct Registry {
    plugins: Vec<Plugin>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in normalizers — the equivalent of
    /// each plugin script calling the host's main-loop entry at startup.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        crate::pipelines::register_builtins(&mut reg);
        reg
    }

    /// Register a command. A duplicate identifier replaces the previous
    /// registration, with a warning in the session log.
    pub fn register(&mut self, spec: PluginSpec, entry: PluginEntry) {
        if let Some(existing) = self.plugins.iter_mut().find(|p| p.spec.name == spec.name) {
            crate::log_warn!("plugin '{}' re-registered", spec.name);
            *existing = Plugin { spec, entry };
        } else {
            self.plugins.push(Plugin { spec, entry });
        }
    }

    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.spec.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.iter()
    }

    /// Look up `name`, check its image-type filter against the canvas, and
    /// run it. Any failure inside the plugin aborts the remaining steps and
    /// surfaces here.
    pub fn dispatch(
        &self,
        name: &str,
        canvas: &mut CanvasState,
        processor: &mut dyn ImageProcessor,
    ) -> Result<(), String> {
        let plugin = self
            .get(name)
            .ok_or_else(|| format!("unknown command '{}'", name))?;

        if !image_type_matches(plugin.spec.image_types, &canvas.mode) {
            return Err(format!(
                "'{}' does not accept {} images (accepts: {})",
                name,
                canvas.mode.base_name(),
                plugin.spec.image_types
            ));
        }

        crate::log_info!("dispatching '{}' on {}x{} canvas", name, canvas.width, canvas.height);
        (plugin.entry)(canvas, processor)
    }
}

/// Match a comma-separated image-type filter against a canvas mode.
///
/// Tokens follow the host's grammar: a base type (`RGB`, `GRAY`, `INDEXED`),
/// optionally suffixed `A` (with alpha) or `*` (any precision, with or
/// without alpha). Internally every canvas carries alpha, so the suffix only
/// matters for base-type matching.
pub fn image_type_matches(filter: &str, mode: &ColorMode) -> bool {
    let base = mode.base_name();
    filter.split(',').map(str::trim).any(|token| {
        let token = token
            .strip_suffix('*')
            .or_else(|| token.strip_suffix('A'))
            .unwrap_or(token);
        token == base
    })
}
