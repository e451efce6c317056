use hookcls_host::Node;

use crate::bridge::RenderCx;
use crate::fields::FieldSet;
use crate::props::Props;
use crate::scheduler::UpdatePolicy;

/// A stateful renderable class.
///
/// The struct itself carries plain instance state and is built with
/// `Default` exactly once per mount. Values whose changes must re-render
/// live in `Fields` and are read and written through the [`RenderCx`] (or an
/// [`Instance`](crate::Instance) handle).
pub trait Component: Default + 'static {
    type Props: Props;
    type Fields: FieldSet;

    /// Name of the inner unit in diagnostics. Defaults to the type name.
    const DISPLAY_NAME: Option<&'static str> = None;

    const UPDATE_POLICY: UpdatePolicy = UpdatePolicy::Immediate;

    fn default_props() -> <Self::Props as Props>::Defaults {
        Default::default()
    }

    fn render(&mut self, cx: &RenderCx<'_, Self>, props: &Self::Props) -> Option<Node>;
}

pub fn display_name<C: Component>() -> &'static str {
    C::DISPLAY_NAME.unwrap_or_else(|| {
        let full = std::any::type_name::<C>();
        let path = full.split('<').next().unwrap_or(full);
        path.rsplit("::").next().unwrap_or(path)
    })
}
