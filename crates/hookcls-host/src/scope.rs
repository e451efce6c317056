use std::cell::RefCell;
use std::rc::Rc;

type Disposer = Box<dyn FnOnce()>;

/// Teardown callbacks of one mount: `on_unmount` registrations and the
/// last cleanup of every effect. The host disposes it when the mount goes.
#[derive(Clone, Default)]
pub struct Scope(Rc<RefCell<Vec<Disposer>>>);

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_disposer(&self, disposer: impl FnOnce() + 'static) {
        self.0.borrow_mut().push(Box::new(disposer));
    }

    /// Callbacks waiting for disposal.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Runs every disposer once, oldest first. A disposer registered while
    /// disposing runs in the same call.
    pub fn dispose(&self) {
        loop {
            let batch = std::mem::take(&mut *self.0.borrow_mut());
            if batch.is_empty() {
                return;
            }
            batch.into_iter().for_each(|disposer| disposer());
        }
    }
}
