//! Paged definitions: navigation row layout, page changes and click routing.

use std::sync::Arc;

use gridmenu::menu::{BACK_OFFSET, CLOSE_OFFSET, NEXT_OFFSET, PREVIOUS_OFFSET};
use gridmenu::{
    ClickEvent, ClickOutcome, DefinitionSpec, HandlerOptions, Menu, MenuError, PagedDefinition, PaneColor,
    RawClick, StaticPage, Visual,
};

use super::test_utils::{entries, new_log, record, static_menu, user, Harness, Log};

const CONTENT: usize = 18;

fn page(material: &str) -> StaticPage {
    StaticPage::new(vec![Some(Visual::new(material))])
}

fn register_book(harness: &Harness, pages: usize, log: &Log) {
    let mut book = PagedDefinition::new(DefinitionSpec::new("book", "Book", 3).unwrap()).unwrap();
    for i in 0..pages {
        book = book.with_page(page(&format!("page_{}", i)));
    }
    let handler_log = log.clone();
    book = book.with_handlers(move |listener| {
        let log = handler_log.clone();
        listener.on("click", HandlerOptions::default(), move |event: &mut ClickEvent| {
            record(&log, format!("click:{}", event.slot()));
            Ok(())
        });
    });
    harness.service.register_menu(Arc::new(book));
}

#[test]
fn first_page_has_next_and_close_but_no_previous() {
    let harness = Harness::new();
    register_book(&harness, 3, &new_log());
    let session = harness.open(&user("alex"), "book");
    let filler = Some(PaneColor::Black.material());

    assert_eq!(harness.material_at(&session, 0).as_deref(), Some("page_0"));
    assert_eq!(harness.material_at(&session, CONTENT + NEXT_OFFSET).as_deref(), Some("arrow"));
    assert_eq!(harness.material_at(&session, CONTENT + CLOSE_OFFSET).as_deref(), Some("barrier"));
    assert_eq!(harness.material_at(&session, CONTENT + PREVIOUS_OFFSET), filler);
    assert_eq!(harness.material_at(&session, CONTENT + BACK_OFFSET), filler);
    assert!(harness.cells(&session).iter().all(|c| c.is_some()));
}

#[test]
fn empty_content_slots_use_the_page_palette() {
    let harness = Harness::new();
    register_book(&harness, 1, &new_log());
    let session = harness.open(&user("alex"), "book");

    assert_eq!(harness.material_at(&session, 1), Some(PaneColor::LightBlue.material()));
    assert_eq!(harness.material_at(&session, 17), Some(PaneColor::Cyan.material()));
}

#[test]
fn navigation_clicks_turn_pages_without_click_events() {
    let harness = Harness::new();
    let log = new_log();
    register_book(&harness, 2, &log);
    let session = harness.open(&user("alex"), "book");
    let menu = session.menu().clone();

    assert_eq!(menu.handle_click(RawClick::new(CONTENT + NEXT_OFFSET)), ClickOutcome::Vetoed);
    assert_eq!(menu.as_pageable().unwrap().current_page(), 1);
    assert_eq!(harness.material_at(&session, 0).as_deref(), Some("page_1"));
    assert_eq!(harness.material_at(&session, CONTENT + PREVIOUS_OFFSET).as_deref(), Some("arrow"));
    assert_ne!(harness.material_at(&session, CONTENT + NEXT_OFFSET).as_deref(), Some("arrow"));

    assert_eq!(menu.handle_click(RawClick::new(CONTENT + PREVIOUS_OFFSET)), ClickOutcome::Vetoed);
    assert_eq!(menu.as_pageable().unwrap().current_page(), 0);
    assert_eq!(menu.handle_click(RawClick::new(CONTENT + 7)), ClickOutcome::Vetoed);
    assert!(entries(&log).is_empty());
}

#[test]
fn content_clicks_follow_the_single_page_pipeline() {
    let harness = Harness::new();
    let log = new_log();
    register_book(&harness, 1, &log);
    let session = harness.open(&user("alex"), "book");

    assert_eq!(session.menu().handle_click(RawClick::new(0)), ClickOutcome::Vetoed);
    assert_eq!(session.menu().handle_click(RawClick::new(40)), ClickOutcome::Ignored);
    assert_eq!(entries(&log), vec!["click:0"]);
}

#[test]
fn page_bounds_are_enforced_and_edges_are_no_ops() {
    let harness = Harness::new();
    register_book(&harness, 2, &new_log());
    let session = harness.open(&user("alex"), "book");
    let pager = session.menu().as_pageable().unwrap();

    assert!(matches!(pager.go_to_page(2), Err(MenuError::Precondition(_))));
    assert!(!pager.previous_page());
    assert_eq!(pager.current_page(), 0);

    pager.go_to_page(1).unwrap();
    assert!(!pager.next_page());
    assert_eq!(pager.current_page(), 1);
    assert!(!pager.has_next_page());
    assert!(pager.has_previous_page());
}

#[test]
fn close_control_closes_the_session() {
    let harness = Harness::new();
    register_book(&harness, 1, &new_log());
    let session = harness.open(&user("alex"), "book");

    session.menu().handle_click(RawClick::new(CONTENT + CLOSE_OFFSET));
    assert!(!session.is_open());
}

#[test]
fn back_control_returns_to_the_previous_menu() {
    let harness = Harness::new();
    register_book(&harness, 1, &new_log());
    harness.service.register_menu(Arc::new(static_menu("library", 1)));
    let alex = user("alex");
    let library = harness.open(&alex, "library");
    let book = harness.open_from(&alex, "book", &library);
    library.menu().handle_surface_closed();

    assert_eq!(harness.material_at(&book, CONTENT + BACK_OFFSET).as_deref(), Some("oak_door"));
    assert!(book.menu().handle_click(RawClick::new(CONTENT + BACK_OFFSET)).is_vetoed());
    assert!(!book.is_open());
    assert!(library.is_open());
}

#[test]
fn hidden_navigation_controls_fall_back_to_filler() {
    let harness = Harness::new();
    register_book(&harness, 2, &new_log());
    let session = harness.open(&user("alex"), "book");
    let pager = session.menu().as_pageable().unwrap();

    pager.set_navigation_items(None, Some(Visual::new("spectral_arrow")), None);
    pager.go_to_page(0).unwrap();

    assert_eq!(
        harness.material_at(&session, CONTENT + NEXT_OFFSET).as_deref(),
        Some("spectral_arrow")
    );
    assert_eq!(
        harness.material_at(&session, CONTENT + CLOSE_OFFSET),
        Some(PaneColor::Black.material())
    );
}
