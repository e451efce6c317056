#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::sync::Arc;

    use crate::*;

    type Sink<T> = Rc<RefCell<Option<T>>>;

    fn trigger_probe(name: &str, sink: Sink<Trigger>) -> FnComponent<()> {
        component(name, move |_: &()| {
            let (generation, trigger) = use_trigger();
            *sink.borrow_mut() = Some(trigger);
            Some(Node::text(format!("gen {generation}")))
        })
    }

    #[test]
    fn test_use_ref_persists_across_renders() {
        let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
        let sink: Sink<Trigger> = Rc::default();
        let unit = component("Keeper", {
            let seen = seen.clone();
            let sink = sink.clone();
            move |_: &()| {
                let value = use_ref(|| 7u32);
                seen.borrow_mut().push(Rc::as_ptr(&value) as usize);
                *sink.borrow_mut() = Some(use_trigger().1);
                None
            }
        });

        let mut host = Host::new();
        host.render(unit.element(())).unwrap();
        for _ in 0..4 {
            sink.borrow().as_ref().unwrap().fire();
            host.flush().unwrap();
        }

        let seen = seen.borrow();
        assert_eq!(seen.len(), 5);
        assert!(seen.iter().all(|p| *p == seen[0]));
    }

    #[test]
    fn test_trigger_fires_coalesce() {
        let sink: Sink<Trigger> = Rc::default();
        let unit = trigger_probe("Probe", sink.clone());
        let mut host = Host::new();
        host.render(unit.element(())).unwrap();
        assert_eq!(host.output(), "gen 1");

        let trigger = sink.borrow().clone().unwrap();
        trigger.fire();
        trigger.fire();
        trigger.fire();
        let report = host.flush().unwrap();

        assert_eq!(report.rendered, 1);
        assert_eq!(host.output(), "gen 2");
    }

    #[test]
    fn test_trigger_after_unmount_is_noop() {
        let sink: Sink<Trigger> = Rc::default();
        let unit = trigger_probe("Probe", sink.clone());
        let mut host = Host::new();
        host.render(unit.element(())).unwrap();
        let trigger = sink.borrow().clone().unwrap();

        host.unmount();
        let renders = host.stats().renders;

        assert!(!trigger.fire());
        assert!(!trigger.is_live());
        let report = host.flush().unwrap();
        assert_eq!(report.rendered, 0);
        assert_eq!(host.stats().renders, renders);
    }

    #[test]
    fn test_trigger_is_send() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Trigger>();
        assert_send_sync::<Arc<UpdateQueue>>();
    }

    #[test]
    fn test_effect_reruns_only_on_dep_change() {
        let log: Rc<RefCell<Vec<String>>> = Rc::default();
        let unit = component("Fx", {
            let log = log.clone();
            move |dep: &u32| {
                let dep = *dep;
                let log = log.clone();
                use_effect(dep, move || {
                    log.borrow_mut().push(format!("setup {dep}"));
                    Some(Cleanup::new(move || {
                        log.borrow_mut().push(format!("cleanup {dep}"))
                    }))
                });
                None
            }
        });

        let mut host = Host::new();
        host.render(unit.element(1)).unwrap();
        host.render(unit.element(1)).unwrap();
        assert_eq!(*log.borrow(), vec!["setup 1"]);

        host.render(unit.element(2)).unwrap();
        assert_eq!(*log.borrow(), vec!["setup 1", "cleanup 1", "setup 2"]);

        host.unmount();
        assert_eq!(
            *log.borrow(),
            vec!["setup 1", "cleanup 1", "setup 2", "cleanup 2"]
        );
    }

    #[test]
    fn test_effects_run_children_first() {
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let child = component("Child", {
            let log = log.clone();
            move |_: &()| {
                let log = log.clone();
                use_effect((), move || {
                    log.borrow_mut().push("child");
                    None
                });
                None
            }
        });
        let parent = component("Parent", {
            let log = log.clone();
            move |_: &()| {
                let log = log.clone();
                use_effect((), move || {
                    log.borrow_mut().push("parent");
                    None
                });
                Some(Node::from(child.element(())))
            }
        });

        let mut host = Host::new();
        host.render(parent.element(())).unwrap();
        assert_eq!(*log.borrow(), vec!["child", "parent"]);
    }

    #[test]
    fn test_listener_cleanup_does_not_leak() {
        let window = EventTarget::new();
        let hits = Rc::new(Cell::new(0));
        let unit = component("Listens", {
            let window = window.clone();
            let hits = hits.clone();
            move |_: &()| {
                let window = window.clone();
                let hits = hits.clone();
                use_effect((), move || {
                    let id = window.add_listener(
                        "keypress",
                        Rc::new(move |_: &Event| hits.set(hits.get() + 1)),
                    );
                    Some(Cleanup::new(move || {
                        window.remove_listener(id);
                    }))
                });
                None
            }
        });

        let mut host = Host::new();
        host.render(unit.element(())).unwrap();
        assert_eq!(window.listener_count(), 1);
        window.emit(&Event::new("keypress"));
        assert_eq!(hits.get(), 1);

        host.unmount();
        assert_eq!(window.listener_count(), 0);
        window.emit(&Event::new("keypress"));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_child_mount_survives_parent_render() {
        let sink: Sink<Trigger> = Rc::default();
        let child = trigger_probe("Child", sink.clone());
        let parent = component("Parent", move |label: &String| {
            Some(
                Node::element("div")
                    .child(Node::text(label.clone()))
                    .child(child.element(())),
            )
        });

        let mut host = Host::new();
        host.render(parent.element("a".to_string())).unwrap();
        let first = sink.borrow().clone().unwrap().mount();
        host.render(parent.element("b".to_string())).unwrap();
        let second = sink.borrow().clone().unwrap().mount();

        assert_eq!(first, second);
        assert_eq!(host.render_count(first), Some(2));
        assert_eq!(host.output(), "<div>bgen 2</div>");
        assert_eq!(host.debug_tree(), "Parent\n  Child\n");
    }

    #[test]
    fn test_child_removed_is_unmounted() {
        let cleaned = Rc::new(Cell::new(false));
        let child = component("Child", {
            let cleaned = cleaned.clone();
            move |_: &()| {
                let cleaned = cleaned.clone();
                on_unmount(move || cleaned.set(true));
                Some(Node::text("child"))
            }
        });
        let parent = component("Parent", move |show: &bool| {
            Some(Node::fragment(show.then(|| Node::from(child.element(())))))
        });

        let mut host = Host::new();
        host.render(parent.element(true)).unwrap();
        assert_eq!(host.mount_count(), 2);
        host.render(parent.element(false)).unwrap();

        assert!(cleaned.get());
        assert_eq!(host.mount_count(), 1);
        assert_eq!(host.output(), "");
    }

    #[test]
    fn test_keyed_children_follow_their_key() {
        let renders: Rc<RefCell<Vec<String>>> = Rc::default();
        let item = component("Item", {
            let renders = renders.clone();
            move |name: &String| {
                let born = use_ref(|| name.clone());
                renders.borrow_mut().push(format!("{name}:{born}"));
                None
            }
        });
        let list = component("List", move |names: &Vec<&'static str>| {
            Some(Node::fragment(
                names
                    .iter()
                    .map(|n| Node::from(item.element(n.to_string()).with_key(*n))),
            ))
        });

        let mut host = Host::new();
        host.render(list.element(vec!["a", "b"])).unwrap();
        host.render(list.element(vec!["b", "a"])).unwrap();

        assert_eq!(*renders.borrow(), vec!["a:a", "b:b", "b:b", "a:a"]);
    }

    #[test]
    fn test_parent_and_child_fired_render_once_each() {
        let parent_sink: Sink<Trigger> = Rc::default();
        let child_sink: Sink<Trigger> = Rc::default();
        let child = trigger_probe("Child", child_sink.clone());
        let parent = component("Parent", {
            let parent_sink = parent_sink.clone();
            move |_: &()| {
                *parent_sink.borrow_mut() = Some(use_trigger().1);
                Some(Node::from(child.element(())))
            }
        });

        let mut host = Host::new();
        host.render(parent.element(())).unwrap();
        child_sink.borrow().as_ref().unwrap().fire();
        parent_sink.borrow().as_ref().unwrap().fire();

        let report = host.flush().unwrap();
        assert_eq!(report.rendered, 2);
    }

    #[test]
    fn test_imperative_handle_set_and_cleared() {
        let unit = forward_ref("Exposed", |value: &u32, handle: Option<&HandleRef<u32>>| {
            use_imperative_handle(handle, *value);
            None
        });
        let handle = HandleRef::new();

        let mut host = Host::new();
        host.render(unit.element_with_handle(3, &handle)).unwrap();
        assert_eq!(handle.get(), Some(3));

        host.render(unit.element_with_handle(4, &handle)).unwrap();
        assert_eq!(handle.get(), Some(4));

        host.unmount();
        assert!(!handle.is_set());
    }

    #[test]
    fn test_error_boundary_shows_fallback() {
        let bomb = component("Bomb", |armed: &bool| {
            if *armed {
                panic!("boom");
            }
            Some(Node::text("ok"))
        });
        let boundary = ErrorBoundary::new(|info: &ErrorInfo| {
            Some(Node::text(format!("{} failed: {}", info.component, info.message)))
        });

        let mut host = Host::new();
        host.render(boundary.wrap(bomb.element(true))).unwrap();
        assert_eq!(host.output(), "Bomb failed: boom");
        assert_eq!(host.mount_count(), 1);

        host.render(boundary.wrap(bomb.element(false))).unwrap();
        assert_eq!(host.output(), "ok");
    }

    #[test]
    fn test_timer_fires_when_due() {
        let clock = Arc::new(ManualClock::new());
        let sink: Sink<Trigger> = Rc::default();
        let unit = trigger_probe("Timed", sink.clone());
        let mut host = Host::with_options(HostOptions {
            clock: clock.clone(),
            ..Default::default()
        });
        host.render(unit.element(())).unwrap();

        let trigger = sink.borrow().clone().unwrap();
        trigger.fire_after(Duration::from_millis(10));
        assert!(host.next_deadline().is_some());
        assert_eq!(host.flush().unwrap().rendered, 0);

        clock.advance(Duration::from_millis(10));
        assert_eq!(host.flush().unwrap().rendered, 1);
        assert!(host.next_deadline().is_none());
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let clock = Arc::new(ManualClock::new());
        let sink: Sink<Trigger> = Rc::default();
        let unit = trigger_probe("Timed", sink.clone());
        let mut host = Host::with_options(HostOptions {
            clock: clock.clone(),
            ..Default::default()
        });
        host.render(unit.element(())).unwrap();

        let trigger = sink.borrow().clone().unwrap();
        let timer = trigger.fire_after(Duration::from_millis(1));
        assert!(host.queue().cancel(timer));
        clock.advance(Duration::from_millis(5));
        assert_eq!(host.flush().unwrap().rendered, 0);
    }

    #[test]
    fn test_update_loop_is_reported() {
        let unit = component("Loop", |_: &()| {
            use_trigger().1.fire();
            None
        });
        let mut host = Host::with_options(HostOptions {
            max_update_passes: 5,
            ..Default::default()
        });

        let err = host.render(unit.element(())).unwrap_err();
        assert!(matches!(err, HostError::UpdateLoop { passes: 5 }));
        assert!(host.queue().has_pending());
    }

    #[test]
    fn test_dispatch_errors() {
        let unit = component("Plain", |_: &()| Some(Node::element("p").id("para")));
        let mut host = Host::new();
        host.render(unit.element(())).unwrap();

        assert!(matches!(
            host.dispatch("nope", Event::new("click")),
            Err(HostError::UnknownTarget(_))
        ));
        assert!(matches!(
            host.dispatch("para", Event::new("click")),
            Err(HostError::NoHandler { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "hooks can only be called while a unit renders")]
    fn test_hooks_outside_render_panic() {
        let _ = use_ref(|| 1);
    }

    #[test]
    fn test_scope_explicit_dispose() {
        let cleaned_up = Rc::new(Cell::new(0));

        let scope = Scope::new();
        let c = cleaned_up.clone();
        scope.add_disposer(move || c.set(c.get() + 1));
        assert_eq!(scope.len(), 1);

        scope.dispose();
        scope.dispose();
        assert_eq!(cleaned_up.get(), 1);
        assert!(scope.is_empty());
    }

    #[test]
    fn test_markup_escapes_text() {
        let unit = component("Esc", |_: &()| {
            Some(Node::element("p").attr("title", "a\"b").child("<x> & y"))
        });
        let mut host = Host::new();
        host.render(unit.element(())).unwrap();
        assert_eq!(
            host.output(),
            "<p title=\"a&quot;b\">&lt;x&gt; &amp; y</p>"
        );
    }
}
