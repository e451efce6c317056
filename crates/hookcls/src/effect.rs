//! Two-phase effects keyed by a dependency value.
//!
//! A [`Routine`] is a hand-driven coroutine with up to three stops:
//!
//! 1. first resume: yield the dependency value (`Step::Yield(Some(deps))`);
//! 2. second resume, at commit: run setup, then either
//!    - return, optionally with a cleanup callback (`Step::Return(..)`), or
//!    - yield nothing (`Step::Yield(None)`) to mark the in-routine cleanup;
//! 3. third resume (two-yield form only), at teardown: run cleanup and
//!    return nothing.
//!
//! Anything else is a programming error. [`EffectRunner`] enforces the
//! order and reports breaches as [`ContractViolation`]s; [`use_gen_effect`]
//! panics on them.

use std::cell::RefCell;
use std::rc::Rc;

use hookcls_host::{Cleanup, Event, EventTarget, Handler, ListenerId, use_effect, use_ref};

use crate::error::ContractViolation;
use crate::store::violation;

pub enum Step<D> {
    Yield(Option<D>),
    Return(Option<Cleanup>),
}

pub trait Routine: 'static {
    type Deps: PartialEq + 'static;

    fn resume(&mut self) -> Step<Self::Deps>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    AwaitingSetup,
    SetupDone,
    CleanedUp,
}

enum Teardown {
    Callback(Option<Cleanup>),
    InRoutine,
}

enum State {
    NotStarted,
    AwaitingSetup,
    SetupDone(Teardown),
    CleanedUp,
}

/// Drives one routine through start, setup and cleanup.
pub struct EffectRunner<R: Routine> {
    routine: R,
    state: State,
}

impl<R: Routine> EffectRunner<R> {
    pub fn new(routine: R) -> Self {
        Self {
            routine,
            state: State::NotStarted,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::NotStarted => Phase::NotStarted,
            State::AwaitingSetup => Phase::AwaitingSetup,
            State::SetupDone(_) => Phase::SetupDone,
            State::CleanedUp => Phase::CleanedUp,
        }
    }

    /// First resume. The routine must hand over its dependency value.
    pub fn start(&mut self) -> Result<R::Deps, ContractViolation> {
        match self.state {
            State::NotStarted => {}
            State::CleanedUp => return Err(ContractViolation::ResumedAfterTeardown),
            _ => return Err(ContractViolation::OutOfOrder("start after start")),
        }
        match self.routine.resume() {
            Step::Yield(Some(deps)) => {
                self.state = State::AwaitingSetup;
                Ok(deps)
            }
            Step::Yield(None) => Err(ContractViolation::InvalidDependencies),
            Step::Return(_) => Err(ContractViolation::MissingDependencies),
        }
    }

    /// Second resume: the side effect itself.
    pub fn setup(&mut self) -> Result<(), ContractViolation> {
        match self.state {
            State::AwaitingSetup => {}
            State::CleanedUp => return Err(ContractViolation::ResumedAfterTeardown),
            State::NotStarted => return Err(ContractViolation::OutOfOrder("setup before start")),
            State::SetupDone(_) => return Err(ContractViolation::OutOfOrder("setup twice")),
        }
        let teardown = match self.routine.resume() {
            Step::Yield(None) => Teardown::InRoutine,
            Step::Yield(Some(_)) => return Err(ContractViolation::DataOnCleanupYield),
            Step::Return(cleanup) => Teardown::Callback(cleanup),
        };
        self.state = State::SetupDone(teardown);
        Ok(())
    }

    /// Undoes setup. A runner that never got to setup has nothing to undo.
    /// Terminal: any later call is an error.
    pub fn cleanup(&mut self) -> Result<(), ContractViolation> {
        match std::mem::replace(&mut self.state, State::CleanedUp) {
            State::CleanedUp => Err(ContractViolation::ResumedAfterTeardown),
            State::NotStarted | State::AwaitingSetup => Ok(()),
            State::SetupDone(Teardown::Callback(cleanup)) => {
                if let Some(cleanup) = cleanup {
                    cleanup.run();
                }
                Ok(())
            }
            State::SetupDone(Teardown::InRoutine) => match self.routine.resume() {
                Step::Return(None) => Ok(()),
                Step::Return(Some(_)) => Err(ContractViolation::CleanupReturnedValue),
                Step::Yield(_) => Err(ContractViolation::ExtraYield),
            },
        }
    }
}

/// Runs `routine` as an effect of the rendering mount.
///
/// A new routine is built every render; it is started right away to get its
/// dependency value. When that value differs from the previous render's, the
/// old routine is cleaned up and the new one set up after commit. Otherwise
/// the new routine is dropped unstarted past its first stop. The last routine
/// is cleaned up on unmount.
#[track_caller]
pub fn use_gen_effect<R: Routine>(routine: R) {
    let mut runner = EffectRunner::new(routine);
    let deps = match runner.start() {
        Ok(deps) => deps,
        Err(e) => violation(e),
    };
    use_effect(deps, move || {
        if let Err(e) = runner.setup() {
            violation(e);
        }
        Some(Cleanup::new(move || {
            if let Err(e) = runner.cleanup() {
                violation(e);
            }
        }))
    });
}

/// Routine from a closure called once per resume.
pub struct FromFn<D, F> {
    f: F,
    _deps: std::marker::PhantomData<fn() -> D>,
}

pub fn from_fn<D, F>(f: F) -> FromFn<D, F>
where
    D: PartialEq + 'static,
    F: FnMut() -> Step<D> + 'static,
{
    FromFn {
        f,
        _deps: std::marker::PhantomData,
    }
}

impl<D, F> Routine for FromFn<D, F>
where
    D: PartialEq + 'static,
    F: FnMut() -> Step<D> + 'static,
{
    type Deps = D;

    fn resume(&mut self) -> Step<D> {
        (self.f)()
    }
}

/// Two-yield form: `setup` runs at commit, `cleanup` at teardown.
pub struct TwoPhase<D> {
    deps: Option<D>,
    setup: Option<Box<dyn FnOnce()>>,
    cleanup: Option<Box<dyn FnOnce()>>,
}

pub fn two_phase<D: PartialEq + 'static>(
    deps: D,
    setup: impl FnOnce() + 'static,
    cleanup: impl FnOnce() + 'static,
) -> TwoPhase<D> {
    TwoPhase {
        deps: Some(deps),
        setup: Some(Box::new(setup)),
        cleanup: Some(Box::new(cleanup)),
    }
}

impl<D: PartialEq + 'static> Routine for TwoPhase<D> {
    type Deps = D;

    fn resume(&mut self) -> Step<D> {
        if let Some(deps) = self.deps.take() {
            return Step::Yield(Some(deps));
        }
        if let Some(setup) = self.setup.take() {
            setup();
            return Step::Yield(None);
        }
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
        Step::Return(None)
    }
}

/// Return form: `setup` runs at commit and may hand back a cleanup.
pub struct WithCleanup<D> {
    deps: Option<D>,
    setup: Option<Box<dyn FnOnce() -> Option<Cleanup>>>,
}

pub fn with_cleanup<D: PartialEq + 'static>(
    deps: D,
    setup: impl FnOnce() -> Option<Cleanup> + 'static,
) -> WithCleanup<D> {
    WithCleanup {
        deps: Some(deps),
        setup: Some(Box::new(setup)),
    }
}

impl<D: PartialEq + 'static> Routine for WithCleanup<D> {
    type Deps = D;

    fn resume(&mut self) -> Step<D> {
        if let Some(deps) = self.deps.take() {
            return Step::Yield(Some(deps));
        }
        Step::Return(self.setup.take().and_then(|setup| setup()))
    }
}

/// Paired add/remove calls keyed on `args`. `add` returns a token that
/// `remove` gets back, such as a listener id.
pub struct Registration<A, T> {
    args: A,
    started: bool,
    add: Option<Box<dyn FnOnce(&A) -> T>>,
    remove: Option<Box<dyn FnOnce(&A, T)>>,
    token: Option<T>,
}

pub fn registration<A, T>(
    args: A,
    add: impl FnOnce(&A) -> T + 'static,
    remove: impl FnOnce(&A, T) + 'static,
) -> Registration<A, T>
where
    A: Clone + PartialEq + 'static,
    T: 'static,
{
    Registration {
        args,
        started: false,
        add: Some(Box::new(add)),
        remove: Some(Box::new(remove)),
        token: None,
    }
}

impl<A, T> Routine for Registration<A, T>
where
    A: Clone + PartialEq + 'static,
    T: 'static,
{
    type Deps = A;

    fn resume(&mut self) -> Step<A> {
        if !self.started {
            self.started = true;
            return Step::Yield(Some(self.args.clone()));
        }
        if let Some(add) = self.add.take() {
            self.token = Some(add(&self.args));
            return Step::Yield(None);
        }
        if let (Some(remove), Some(token)) = (self.remove.take(), self.token.take()) {
            remove(&self.args, token);
        }
        Step::Return(None)
    }
}

/// Compares a handler by the allocation it points at.
#[derive(Clone)]
pub struct SameHandler(pub Handler);

impl PartialEq for SameHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

pub type ListenerArgs = (EventTarget, String, SameHandler);

/// Adds `handler` for `event` on `target` at setup and removes it at
/// cleanup. Re-registers when the target, the event or the handler `Rc`
/// changes.
pub fn listener_effect(
    target: &EventTarget,
    event: &str,
    handler: Handler,
) -> Registration<ListenerArgs, ListenerId> {
    registration(
        (target.clone(), event.to_string(), SameHandler(handler)),
        |(target, event, handler): &ListenerArgs| target.add_listener(event.as_str(), handler.0.clone()),
        |(target, _, _): &ListenerArgs, id| {
            target.remove_listener(id);
        },
    )
}

/// Listens for `event` on `target` while the mount lives. The latest
/// `handler` is always the one called, without re-registering each render.
pub fn use_listener(target: &EventTarget, event: &str, handler: impl Fn(&Event) + 'static) {
    let latest = use_ref(|| RefCell::new(Rc::new(|_: &Event| {}) as Handler));
    *latest.borrow_mut() = Rc::new(handler);
    let dispatcher = use_ref(|| {
        let latest = latest.clone();
        Rc::new(move |event: &Event| {
            let handler = latest.borrow().clone();
            handler(event)
        }) as Handler
    });
    use_gen_effect(listener_effect(target, event, (*dispatcher).clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn logging_two_phase(log: &Log) -> TwoPhase<u32> {
        let (a, b) = (log.clone(), log.clone());
        two_phase(1, move || a.borrow_mut().push("setup"), move || b.borrow_mut().push("cleanup"))
    }

    #[test]
    fn test_two_phase_runs_in_order() {
        let log: Log = Rc::default();
        let mut runner = EffectRunner::new(logging_two_phase(&log));
        assert_eq!(runner.phase(), Phase::NotStarted);

        assert_eq!(runner.start(), Ok(1));
        assert!(log.borrow().is_empty());
        runner.setup().unwrap();
        assert_eq!(runner.phase(), Phase::SetupDone);
        runner.cleanup().unwrap();

        assert_eq!(*log.borrow(), vec!["setup", "cleanup"]);
        assert_eq!(runner.phase(), Phase::CleanedUp);
    }

    #[test]
    fn test_return_form_runs_callback() {
        let log: Log = Rc::default();
        let l = log.clone();
        let mut runner = EffectRunner::new(with_cleanup((), move || {
            l.borrow_mut().push("setup");
            Some(Cleanup::new(move || l.borrow_mut().push("cleanup")))
        }));
        runner.start().unwrap();
        runner.setup().unwrap();
        runner.cleanup().unwrap();
        assert_eq!(*log.borrow(), vec!["setup", "cleanup"]);
    }

    #[test]
    fn test_resume_after_teardown_is_violation() {
        let log: Log = Rc::default();
        let mut runner = EffectRunner::new(logging_two_phase(&log));
        runner.start().unwrap();
        runner.setup().unwrap();
        runner.cleanup().unwrap();

        assert_eq!(runner.cleanup(), Err(ContractViolation::ResumedAfterTeardown));
        assert_eq!(runner.setup(), Err(ContractViolation::ResumedAfterTeardown));
        assert_eq!(*log.borrow(), vec!["setup", "cleanup"]);
    }

    #[test]
    fn test_missing_dependencies() {
        let mut runner = EffectRunner::new(from_fn(|| Step::<u8>::Return(None)));
        assert_eq!(runner.start(), Err(ContractViolation::MissingDependencies));

        let mut runner = EffectRunner::new(from_fn(|| Step::<u8>::Yield(None)));
        assert_eq!(runner.start(), Err(ContractViolation::InvalidDependencies));
    }

    #[test]
    fn test_data_on_cleanup_yield() {
        let mut runner = EffectRunner::new(from_fn(|| Step::Yield(Some(1u8))));
        runner.start().unwrap();
        assert_eq!(runner.setup(), Err(ContractViolation::DataOnCleanupYield));
    }

    #[test]
    fn test_extra_yield_and_returned_value() {
        let mut stage = 0;
        let mut runner = EffectRunner::new(from_fn(move || {
            stage += 1;
            match stage {
                1 => Step::Yield(Some(())),
                _ => Step::Yield(None),
            }
        }));
        runner.start().unwrap();
        runner.setup().unwrap();
        assert_eq!(runner.cleanup(), Err(ContractViolation::ExtraYield));

        let mut stage = 0;
        let mut runner = EffectRunner::new(from_fn(move || {
            stage += 1;
            match stage {
                1 => Step::Yield(Some(())),
                2 => Step::Yield(None),
                _ => Step::Return(Some(Cleanup::new(|| {}))),
            }
        }));
        runner.start().unwrap();
        runner.setup().unwrap();
        assert_eq!(runner.cleanup(), Err(ContractViolation::CleanupReturnedValue));
    }

    #[test]
    fn test_cleanup_without_setup_is_noop() {
        let log: Log = Rc::default();
        let mut runner = EffectRunner::new(logging_two_phase(&log));
        runner.start().unwrap();
        runner.cleanup().unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_out_of_order() {
        let log: Log = Rc::default();
        let mut runner = EffectRunner::new(logging_two_phase(&log));
        assert!(matches!(runner.setup(), Err(ContractViolation::OutOfOrder(_))));
        runner.start().unwrap();
        assert!(matches!(runner.start(), Err(ContractViolation::OutOfOrder(_))));
    }

    #[test]
    fn test_registration_passes_token_back() {
        let target = EventTarget::new();
        let mut runner = EffectRunner::new(listener_effect(&target, "resize", Rc::new(|_: &Event| {})));
        runner.start().unwrap();
        runner.setup().unwrap();
        assert_eq!(target.listener_count(), 1);
        runner.cleanup().unwrap();
        assert_eq!(target.listener_count(), 0);
    }
}
