//! Integration tests for Ambient

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ambient::{enable, get, get_or_init, scoped, set, EventLoop};

#[derive(Debug, Default, PartialEq)]
struct Ctx {
    user_id: u64,
}

#[test]
fn inheritance_through_chain() {
    enable();
    let rt = EventLoop::new();
    let root_value = Rc::new(RefCell::new(None));
    let observed = Rc::new(RefCell::new(None));

    {
        let root_value = root_value.clone();
        let observed = observed.clone();
        rt.spawn(move || {
            *root_value.borrow_mut() = Some(set(Ctx { user_id: 42 }));
            ambient::spawn(move || {
                // child sets nothing
                ambient::spawn(move || {
                    *observed.borrow_mut() = Some(get::<Ctx>());
                });
            });
        });
    }
    rt.run();

    let root_value = root_value.borrow_mut().take().unwrap();
    let observed = observed.borrow_mut().take().unwrap();
    assert_eq!(observed.user_id, 42);
    // The grandchild sees the very object the root assigned.
    assert!(Rc::ptr_eq(&root_value, &observed));
}

#[test]
fn unrelated_roots_are_isolated() {
    enable();
    let rt = EventLoop::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    for id in [1u64, 2] {
        let seen = seen.clone();
        rt.spawn(move || {
            set(Ctx { user_id: id });
            let seen = seen.clone();
            ambient::spawn(move || {
                seen.borrow_mut().push(get::<Ctx>().user_id);
            });
        });
    }
    rt.run();

    assert_eq!(*seen.borrow(), vec![1, 2]);
}

#[test]
fn shadowing_masks_but_never_erases() {
    enable();
    let rt = EventLoop::new();
    let results = Rc::new(RefCell::new(Vec::new()));

    {
        let results = results.clone();
        rt.spawn(move || {
            set(Ctx { user_id: 1 });
            let for_child = results.clone();
            ambient::spawn(move || {
                set(Ctx { user_id: 2 });
                let for_grandchild = for_child.clone();
                ambient::spawn(move || {
                    for_grandchild
                        .borrow_mut()
                        .push(("grandchild", get::<Ctx>().user_id));
                });
            });
            ambient::spawn(move || {
                results
                    .borrow_mut()
                    .push(("root_child", get::<Ctx>().user_id));
            });
        });
    }
    rt.run();

    // The root's own chain still resolves to 1; only the shadowing child's
    // descendants see 2.
    assert_eq!(
        *results.borrow(),
        vec![("root_child", 1), ("grandchild", 2)]
    );
}

#[test]
fn default_when_no_ancestor_assigns() {
    enable();
    let rt = EventLoop::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    for _ in 0..2 {
        let seen = seen.clone();
        rt.spawn(move || {
            seen.borrow_mut().push(get::<Ctx>().user_id);
        });
    }
    rt.run();

    // Both siblings get the default; the first read did not persist one.
    assert_eq!(*seen.borrow(), vec![0, 0]);
}

#[test]
fn read_fallback_is_not_persisted() {
    enable();
    let rt = EventLoop::new();
    rt.spawn(|| {
        let first = get::<Ctx>();
        let second = get::<Ctx>();
        assert!(!Rc::ptr_eq(&first, &second));
    });
    rt.run();
}

#[test]
fn repeated_enable_keeps_inheritance_intact() {
    enable();
    enable();
    let rt = EventLoop::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    {
        let seen = seen.clone();
        rt.spawn(move || {
            let assigned = set(Ctx { user_id: 3 });
            let seen = seen.clone();
            ambient::spawn(move || {
                let inherited = get::<Ctx>();
                seen.borrow_mut()
                    .push((inherited.user_id, Rc::ptr_eq(&assigned, &inherited)));
            });
        });
    }
    {
        let seen = seen.clone();
        rt.spawn(move || {
            seen.borrow_mut().push((get::<Ctx>().user_id, false));
        });
    }
    rt.run();

    // Same behavior as a single-enable run: one inherited value, reference
    // equal, and no leakage into the unrelated root.
    assert_eq!(*seen.borrow(), vec![(0, false), (3, true)]);
}

#[test]
fn value_assigned_after_child_creation_is_visible_lazily() {
    enable();
    let rt = EventLoop::new();
    let seen = Rc::new(RefCell::new(None));

    {
        let seen = seen.clone();
        rt.spawn(move || {
            // The timer exists before the root assigns its value.
            ambient::set_timeout(Duration::from_millis(1), move || {
                *seen.borrow_mut() = Some(get::<Ctx>().user_id);
            });
            set(Ctx { user_id: 9 });
        });
    }
    rt.run();

    assert_eq!(seen.borrow_mut().take(), Some(9));
}

#[test]
fn timer_then_microtask_sees_root_context() {
    enable();
    let rt = EventLoop::new();
    let root_value = Rc::new(RefCell::new(None));
    let observed = Rc::new(RefCell::new(None));

    {
        let root_value = root_value.clone();
        let observed = observed.clone();
        rt.spawn(move || {
            *root_value.borrow_mut() = Some(set(Ctx { user_id: 42 }));
            ambient::set_timeout(Duration::from_millis(10), move || {
                ambient::queue_microtask(move || {
                    *observed.borrow_mut() = Some(get::<Ctx>());
                });
            });
        });
    }
    rt.run();

    let root_value = root_value.borrow_mut().take().unwrap();
    let observed = observed.borrow_mut().take().unwrap();
    assert_eq!(observed.user_id, 42);
    assert!(Rc::ptr_eq(&root_value, &observed));
}

#[test]
fn sibling_timer_does_not_leak_initial_value() {
    enable();
    let rt = EventLoop::new();
    let t2_seen = Rc::new(RefCell::new(None));

    {
        let t2_seen = t2_seen.clone();
        rt.spawn(move || {
            ambient::set_timeout(Duration::from_millis(1), || {
                let own = get_or_init(|| Ctx { user_id: 7 });
                assert_eq!(own.user_id, 7);
            });
            ambient::set_timeout(Duration::from_millis(2), move || {
                *t2_seen.borrow_mut() = Some(get::<Ctx>().user_id);
            });
        });
    }
    rt.run();

    // T1 is a sibling of T2, not an ancestor.
    assert_eq!(t2_seen.borrow_mut().take(), Some(0));
}

#[test]
fn scoped_requests_stay_isolated_end_to_end() {
    enable();
    let rt = EventLoop::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    for id in [10u64, 20] {
        let log = log.clone();
        rt.spawn(move || {
            scoped(Ctx { user_id: id }, move |_| {
                ambient::set_timeout(Duration::from_millis(id), move || {
                    log.borrow_mut().push(get::<Ctx>().user_id);
                });
            });
        });
    }
    rt.run();

    assert_eq!(*log.borrow(), vec![10, 20]);
}
