//! Listener registration, priority ordering, isolation and failure handling.

use std::sync::Arc;

use anyhow::anyhow;
use gridmenu::events::{DispatchSummary, EventBase};
use gridmenu::{
    ClickEvent, ClickOutcome, CloseEvent, DefinitionTag, HandlerOptions, Listener, Menu, MenuEvent, MenuItem,
    OpenEvent, RawClick, Visual,
};

use super::test_utils::{entries, new_log, record, static_menu, user, Harness};

#[test]
fn handlers_run_in_priority_order_with_stable_ties() {
    let harness = Harness::new();
    let log = new_log();
    let handler_log = log.clone();
    harness.service.register_menu(Arc::new(
        static_menu("shop", 1)
            .with_contents(vec![Some(Visual::new("emerald"))])
            .with_handlers(move |listener| {
                for (name, priority) in [("minus_ten", -10), ("zero_a", 0), ("zero_b", 0), ("ten", 10)] {
                    let log = handler_log.clone();
                    listener.on(name, HandlerOptions::priority(priority), move |_: &mut ClickEvent| {
                        record(&log, name);
                        Ok(())
                    });
                }
            }),
    ));

    let session = harness.open(&user("alex"), "shop");
    session.menu().handle_click(RawClick::new(0));

    assert_eq!(entries(&log), vec!["minus_ten", "zero_a", "zero_b", "ten"]);
}

#[test]
fn registration_order_does_not_beat_priority() {
    let harness = Harness::new();
    let log = new_log();
    let mut listener = Listener::new("shop");
    for (name, priority) in [("late", 10), ("first_zero", 0), ("early", -10), ("second_zero", 0)] {
        let log = log.clone();
        listener.on(name, HandlerOptions::priority(priority), move |_: &mut ClickEvent| {
            record(&log, name);
            Ok(())
        });
    }
    harness.service.register_menu(Arc::new(static_menu("shop", 1)));
    harness.events().register_listener(&listener);

    let session = harness.open(&user("alex"), "shop");
    session.menu().handle_click(RawClick::new(3));

    assert_eq!(entries(&log), vec!["early", "first_zero", "second_zero", "late"]);
}

#[test]
fn listeners_only_see_their_own_menus() {
    let harness = Harness::new();
    let log = new_log();
    for id in ["alpha", "beta"] {
        let log = log.clone();
        harness.service.register_menu(Arc::new(static_menu(id, 1).with_handlers(move |listener| {
            let log = log.clone();
            listener.on("click", HandlerOptions::default(), move |event: &mut ClickEvent| {
                record(&log, format!("{}:{}", id, event.slot()));
                Ok(())
            });
        })));
    }

    let alpha = harness.open(&user("alex"), "alpha");
    alpha.menu().handle_click(RawClick::new(2));
    let beta = harness.open(&user("blair"), "beta");
    beta.menu().handle_click(RawClick::new(5));

    assert_eq!(entries(&log), vec!["alpha:2", "beta:5"]);
}

#[test]
fn failing_and_panicking_handlers_do_not_stop_dispatch() {
    let harness = Harness::new();
    let log = new_log();
    let handler_log = log.clone();
    harness.service.register_menu(Arc::new(static_menu("shop", 1).with_handlers(move |listener| {
        let log = handler_log.clone();
        listener
            .on("fails", HandlerOptions::priority(-2), |_: &mut OpenEvent| Err(anyhow!("boom")))
            .on("panics", HandlerOptions::priority(-1), |_: &mut OpenEvent| -> anyhow::Result<()> {
                panic!("handler exploded")
            })
            .on("records", HandlerOptions::priority(0), move |_: &mut OpenEvent| {
                record(&log, "ran");
                Ok(())
            });
    })));

    let session = harness.open(&user("alex"), "shop");
    assert!(session.is_open());
    assert_eq!(entries(&log), vec!["ran"]);

    let mut event = OpenEvent::new(EventBase::for_session(&session));
    let summary = harness.events().fire(&mut event);
    assert_eq!(summary, DispatchSummary { invoked: 3, failed: 2 });
}

#[test]
fn ignore_cancelled_handlers_are_skipped_after_a_cancel() {
    let harness = Harness::new();
    let log = new_log();
    let handler_log = log.clone();
    harness.service.register_menu(Arc::new(
        static_menu("shop", 1)
            .with_contents(vec![None])
            .with_handlers(move |listener| {
                let skipped = handler_log.clone();
                let observer = handler_log.clone();
                listener
                    .on("cancel", HandlerOptions::priority(-5), |event: &mut ClickEvent| {
                        event.cancel();
                        Ok(())
                    })
                    .on("skipped", HandlerOptions::priority(0).ignore_cancelled(), move |_: &mut ClickEvent| {
                        record(&skipped, "skipped");
                        Ok(())
                    })
                    .on("observer", HandlerOptions::priority(5), move |event: &mut ClickEvent| {
                        record(&observer, format!("cancelled={}", event.is_cancelled()));
                        Ok(())
                    });
            }),
    ));

    let session = harness.open(&user("alex"), "shop");
    session
        .menu()
        .core()
        .add_item(MenuItem::movable(0, Visual::new("apple")))
        .unwrap();

    // The item is movable, so only the cancel can veto.
    assert_eq!(session.menu().handle_click(RawClick::new(0)), ClickOutcome::Vetoed);
    assert_eq!(entries(&log), vec!["cancelled=true"]);
}

#[test]
fn movable_item_click_is_allowed_when_nobody_cancels() {
    let harness = Harness::new();
    harness.service.register_menu(Arc::new(static_menu("chest", 1)));
    let session = harness.open(&user("alex"), "chest");
    session
        .menu()
        .core()
        .add_item(MenuItem::movable(4, Visual::new("apple")))
        .unwrap();

    assert_eq!(session.menu().handle_click(RawClick::new(4)), ClickOutcome::Allowed);
    assert_eq!(session.menu().handle_click(RawClick::new(3)), ClickOutcome::Vetoed);
    assert_eq!(session.menu().handle_click(RawClick::new(30)), ClickOutcome::Ignored);
}

#[test]
fn registering_twice_replaces_handlers() {
    let harness = Harness::new();
    let events = harness.events();
    let mut listener = Listener::new("shop");
    listener.on("a", HandlerOptions::default(), |_: &mut CloseEvent| Ok(()));
    listener.on("b", HandlerOptions::default(), |_: &mut OpenEvent| Ok(()));

    events.register_listener(&listener);
    events.register_listener(&listener);
    assert_eq!(events.handler_count::<CloseEvent>(), 1);
    assert_eq!(events.handler_count::<OpenEvent>(), 1);

    assert_eq!(events.unregister_listener(&DefinitionTag::new("shop")), 2);
    assert_eq!(events.handler_count::<CloseEvent>(), 0);
    assert!(!events.is_registered(&DefinitionTag::new("shop")));
}

#[test]
fn handlers_may_register_listeners_mid_dispatch() {
    let harness = Harness::new();
    let log = new_log();
    let events = Arc::downgrade(harness.events());
    let late_log = log.clone();
    harness.service.register_menu(Arc::new(static_menu("shop", 1).with_handlers(move |listener| {
        let events = events.clone();
        let late_log = late_log.clone();
        listener.on("installer", HandlerOptions::default(), move |_: &mut ClickEvent| {
            let mut late = Listener::new("shop-extra");
            let log = late_log.clone();
            late.on("late", HandlerOptions::default(), move |_: &mut ClickEvent| {
                record(&log, "late");
                Ok(())
            });
            if let Some(events) = events.upgrade() {
                events.register_listener(&late);
            }
            Ok(())
        });
    })));

    let session = harness.open(&user("alex"), "shop");
    session.menu().handle_click(RawClick::new(0));
    assert!(entries(&log).is_empty());
    assert!(harness.events().is_registered(&DefinitionTag::new("shop-extra")));
    assert_eq!(harness.events().handler_count::<ClickEvent>(), 2);
}

#[test]
fn unregistering_a_menu_removes_its_handlers() {
    let harness = Harness::new();
    let log = new_log();
    let handler_log = log.clone();
    harness.service.register_menu(Arc::new(static_menu("shop", 1).with_handlers(move |listener| {
        let log = handler_log.clone();
        listener.on("open", HandlerOptions::default(), move |_: &mut OpenEvent| {
            record(&log, "open");
            Ok(())
        });
    })));
    assert!(harness.events().is_registered(&DefinitionTag::new("shop")));

    assert!(harness.service.unregister_menu("shop").is_some());
    assert!(!harness.events().is_registered(&DefinitionTag::new("shop")));
    assert!(harness.service.unregister_menu("shop").is_none());
}
